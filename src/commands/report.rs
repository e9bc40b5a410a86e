use super::options::Context;
use crate::cli::ReportArgs;
use crate::coverage::CoverageSortKey;
use crate::{churn, complexity, coverage, io, report};
use anyhow::{Context as _, Result};
use std::io::Write;

/// Extensions counted by the report when none are configured.
pub const DEFAULT_REPORT_EXTENSIONS: [&str; 1] = ["go"];

pub fn run_report(args: &ReportArgs, out: &mut dyn Write) -> Result<()> {
    let ctx = Context::load(&args.common)?;
    let common = &args.common;

    // Validate everything before any external command starts
    let report_opts = ctx.report_options(common, args.perfect_coverage, args.sort)?;
    let mut churn_opts = ctx.churn_options(
        common,
        &args.window,
        churn::ChurnSortKey::default(),
        &DEFAULT_REPORT_EXTENSIONS,
    )?;
    let mut complexity_opts = ctx.complexity_options(common, &args.engine)?;
    let mut coverage_opts =
        ctx.coverage_options(common, &args.profile, CoverageSortKey::default())?;

    // Sources are joined in full; only the final ranking is capped
    churn_opts.top = 0;
    complexity_opts.top = 0;
    coverage_opts.top = 0;

    let repo = ctx.repo.as_path();
    let (churn_result, (complexity_result, coverage_result)) = rayon::join(
        || churn::read_git_churn(repo, &churn_opts),
        || {
            rayon::join(
                || complexity::run_complexity(repo, &complexity_opts),
                || coverage::get_coverage_data(repo, &coverage_opts),
            )
        },
    );

    let churn = churn_result
        .with_context(|| format!("Failed to read git history of {}", repo.display()))?;
    log::info!("Got {} churn files", churn.len());

    let complexity = complexity_result
        .with_context(|| format!("Failed to compute complexity of {}", repo.display()))?;
    log::info!("Got {} complexity files", complexity.len());

    let coverage = coverage_result
        .with_context(|| format!("Failed to read coverage of {}", repo.display()))?;
    log::info!("Got {} coverage files", coverage.len());

    let scores = report::build_report(&churn, &complexity, &coverage, &report_opts)?;
    let title = format!("Code health analysis results (top {}):", scores.len());
    io::write_rows(out, common.format, &title, &scores)
}
