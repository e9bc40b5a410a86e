//! Turn command-line flags and `.riskmap.toml` into validated option values.
//!
//! Precedence is flag, then config file, then built-in default. Everything
//! here runs before any external command is started.

use crate::churn::{ChurnOptions, ChurnSortKey, PathFilter};
use crate::cli::{CommonArgs, EngineArgs, ProfileArgs, WindowArgs, DEFAULT_TOP};
use crate::complexity::{ComplexityOptions, DEFAULT_CSV_FILE};
use crate::config::{load_config, validation, RiskmapConfig};
use crate::coverage::{CoverageOptions, CoverageSortKey, DEFAULT_COVERAGE_FILE};
use crate::errors::{Error, Result};
use crate::report::{ReportOptions, ReportSortKey, DEFAULT_PERFECT_COVERAGE};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// The analyzed directory plus the configuration that applies to it.
#[derive(Debug, Clone)]
pub struct Context {
    pub repo: PathBuf,
    pub config: RiskmapConfig,
}

impl Context {
    pub fn load(common: &CommonArgs) -> Result<Self> {
        if !common.path.is_dir() {
            return Err(Error::config(format!(
                "'{}' is not a directory",
                common.path.display()
            )));
        }

        let config = load_config(common.config.as_deref(), &common.path)?;
        Ok(Self {
            repo: common.path.clone(),
            config,
        })
    }

    pub fn top(&self, common: &CommonArgs) -> i64 {
        common
            .top
            .or(self.config.report.top)
            .unwrap_or(DEFAULT_TOP)
    }

    pub fn exclude(&self, common: &CommonArgs) -> Result<Option<Regex>> {
        let pattern = common
            .exclude
            .as_deref()
            .or(self.config.churn.exclude.as_deref());
        validation::compile_exclude(pattern)
    }

    pub fn timeout(&self, common: &CommonArgs) -> Result<Option<Duration>> {
        validation::timeout(common.timeout.or(self.config.process.timeout_secs))
    }

    /// `default_extensions` applies only when neither flag nor file sets any.
    pub fn churn_options(
        &self,
        common: &CommonArgs,
        window: &WindowArgs,
        sort_by: ChurnSortKey,
        default_extensions: &[&str],
    ) -> Result<ChurnOptions> {
        let churn = &self.config.churn;

        let since = validation::parse_optional_date(
            window.since.as_deref().or(churn.since.as_deref()),
            "since",
        )?;
        let until = validation::parse_optional_date(
            window.until.as_deref().or(churn.until.as_deref()),
            "until",
        )?;
        validation::check_window(since, until)?;

        let extensions: Vec<String> = window
            .extensions
            .clone()
            .or_else(|| churn.extensions.clone())
            .unwrap_or_else(|| default_extensions.iter().map(|e| e.to_string()).collect());

        Ok(ChurnOptions {
            sort_by,
            top: self.top(common),
            filter: PathFilter::new(self.exclude(common)?).with_extensions(extensions),
            since,
            until,
            timeout: self.timeout(common)?,
        })
    }

    pub fn complexity_options(
        &self,
        common: &CommonArgs,
        engine: &EngineArgs,
    ) -> Result<ComplexityOptions> {
        let complexity = &self.config.complexity;

        Ok(ComplexityOptions {
            engine: engine.engine.or(complexity.engine).unwrap_or_default(),
            exclude: self.exclude(common)?,
            csv_file: engine
                .complexity_file
                .clone()
                .or_else(|| complexity.csv_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_FILE)),
            top: self.top(common),
        })
    }

    pub fn coverage_options(
        &self,
        common: &CommonArgs,
        profile: &ProfileArgs,
        sort_by: CoverageSortKey,
    ) -> Result<CoverageOptions> {
        let coverage = &self.config.coverage;

        Ok(CoverageOptions {
            sort_by,
            top: self.top(common),
            exclude: self.exclude(common)?,
            run: profile.run.or(coverage.run).unwrap_or_default(),
            file: profile
                .coverage_file
                .clone()
                .or_else(|| coverage.file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COVERAGE_FILE)),
            timeout: self.timeout(common)?,
        })
    }

    pub fn report_options(
        &self,
        common: &CommonArgs,
        perfect_coverage: Option<f64>,
        sort_by: ReportSortKey,
    ) -> Result<ReportOptions> {
        let opts = ReportOptions {
            perfect_coverage: perfect_coverage
                .or(self.config.report.perfect_coverage)
                .unwrap_or(DEFAULT_PERFECT_COVERAGE),
            top: self.top(common),
            sort_by,
        };
        opts.validate()?;
        Ok(opts)
    }
}
