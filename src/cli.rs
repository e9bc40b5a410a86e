use crate::churn::ChurnSortKey;
use crate::complexity::ComplexityEngine;
use crate::coverage::{CoverageSortKey, RunPolicy};
use crate::io::OutputFormat;
use crate::report::ReportSortKey;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_TOP: i64 = 10;

#[derive(Parser, Debug)]
#[command(name = "riskmap")]
#[command(about = "Rank files by maintainability risk from churn, complexity and coverage", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a single metric per file
    Stat {
        #[command(subcommand)]
        metric: StatCommand,
    },

    /// Combine churn, complexity and coverage into a ranked risk report
    Report(ReportArgs),

    /// Write a default .riskmap.toml
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,

        /// Directory to create the file in
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatCommand {
    /// Lines changed and commit counts from git history
    Churn(ChurnArgs),
    /// Average function complexity per file
    Complexity(ComplexityArgs),
    /// Statement coverage per file
    Coverage(CoverageArgs),
}

/// Flags shared by every analysis command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Repository or directory to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Regex of paths to exclude
    #[arg(short, long)]
    pub exclude: Option<String>,

    /// Number of results to show; 0 or negative shows all
    #[arg(short, long, allow_negative_numbers = true)]
    pub top: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tabular")]
    pub format: OutputFormat,

    /// Configuration file (defaults to the nearest .riskmap.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Kill external commands after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Git history window and file selection.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Only count files with these extensions (comma-separated)
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Start date of the history window (YYYY-MM-DD)
    #[arg(short, long)]
    pub since: Option<String>,

    /// End date of the history window (YYYY-MM-DD)
    #[arg(short, long)]
    pub until: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Complexity engine
    #[arg(long, value_enum)]
    pub engine: Option<ComplexityEngine>,

    /// CSV file for the csv-file engine, relative to the repository
    #[arg(long = "complexity-file")]
    pub complexity_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// When to run the test suite to produce a coverage profile
    #[arg(short, long, value_enum)]
    pub run: Option<RunPolicy>,

    /// Coverage profile, relative to the repository
    #[arg(long = "coverage-file")]
    pub coverage_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChurnArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Sort key
    #[arg(long, value_enum, default_value = "changes")]
    pub sort: ChurnSortKey,
}

#[derive(Args, Debug)]
pub struct ComplexityArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug)]
pub struct CoverageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Sort order
    #[arg(long, value_enum, default_value = "worst")]
    pub sort: CoverageSortKey,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Sort key
    #[arg(long, value_enum, default_value = "score")]
    pub sort: ReportSortKey,

    /// Coverage percentage treated as fully covered (0-100)
    #[arg(long = "perfect-coverage", allow_negative_numbers = true)]
    pub perfect_coverage: Option<f64>,
}
