use super::options::Context;
use crate::cli::{ChurnArgs, ComplexityArgs, CoverageArgs};
use crate::{churn, complexity, coverage, io};
use anyhow::{Context as _, Result};
use std::io::Write;

pub fn run_churn(args: &ChurnArgs, out: &mut dyn Write) -> Result<()> {
    let ctx = Context::load(&args.common)?;
    let opts = ctx.churn_options(&args.common, &args.window, args.sort, &[])?;

    let records = churn::read_git_churn(&ctx.repo, &opts)
        .with_context(|| format!("Failed to read git history of {}", ctx.repo.display()))?;
    log::info!("Got {} churn files", records.len());

    let ranked = churn::sort_and_limit(records, opts.sort_by, opts.top);
    let title = format!("Top {} most modified files by {}:", ranked.len(), opts.sort_by);
    io::write_rows(out, args.common.format, &title, &ranked)
}

pub fn run_complexity(args: &ComplexityArgs, out: &mut dyn Write) -> Result<()> {
    let ctx = Context::load(&args.common)?;
    let opts = ctx.complexity_options(&args.common, &args.engine)?;

    let files = complexity::run_complexity(&ctx.repo, &opts)
        .with_context(|| format!("Failed to compute complexity of {}", ctx.repo.display()))?;
    log::info!("Got {} complexity files", files.len());

    let ranked = complexity::sort_and_limit(files, opts.top);
    io::write_rows(out, args.common.format, "Code complexity analysis results:", &ranked)
}

pub fn run_coverage(args: &CoverageArgs, out: &mut dyn Write) -> Result<()> {
    let ctx = Context::load(&args.common)?;
    let opts = ctx.coverage_options(&args.common, &args.profile, args.sort)?;

    let files = coverage::get_coverage_data(&ctx.repo, &opts)
        .with_context(|| format!("Failed to read coverage of {}", ctx.repo.display()))?;
    log::info!("Got {} coverage files", files.len());

    let ranked = coverage::sort_and_limit(files, opts.sort_by, opts.top);
    io::write_rows(out, args.common.format, "Code coverage analysis results:", &ranked)
}
