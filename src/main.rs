use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use riskmap::cli::{Cli, Commands, StatCommand};
use riskmap::commands;
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Usage errors exit with 1 like every other failure; --help and --version with 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbosity);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            if let Some(hint) = user_hint(&err) {
                eprintln!("{} {}", "hint:".yellow().bold(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Hint for the first user-fixable riskmap error in the chain.
fn user_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<riskmap::Error>())
        .find(|e| e.is_user_fixable())
        .and_then(riskmap::Error::hint)
}

/// `-v` steps the default level up from warn; `RUST_LOG` overrides it.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Stat { metric } => match metric {
            StatCommand::Churn(args) => commands::run_churn(&args, &mut out)?,
            StatCommand::Complexity(args) => commands::run_complexity(&args, &mut out)?,
            StatCommand::Coverage(args) => commands::run_coverage(&args, &mut out)?,
        },
        Commands::Report(args) => commands::run_report(&args, &mut out)?,
        Commands::Init { force, path } => {
            commands::init_config(&path, force)?;
        }
    }

    out.flush()?;
    Ok(())
}
