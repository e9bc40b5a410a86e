//! Configuration file support.
//!
//! `.riskmap.toml` supplies per-repository defaults; see [`RiskmapConfig`]
//! for the recognized sections.

pub mod core;
pub mod loader;
pub mod validation;

pub use self::core::{
    ChurnConfig, ComplexityConfig, CoverageConfig, ProcessConfig, ReportConfig, RiskmapConfig,
};
pub use loader::{directory_ancestors, find_config_file, load_config, parse_config, CONFIG_FILE_NAME};

/// Commented configuration written by `riskmap init`.
pub const DEFAULT_CONFIG: &str = r#"# riskmap configuration
#
# Command-line flags override these values.

[churn]
# Paths matching this regex are left out of every metric
# exclude = "^vendor/"
# Only count files with these extensions (report defaults to ["go"])
# extensions = ["go"]
# History window, YYYY-MM-DD; omit for no bound
# since = "2024-01-01"
# until = "2024-12-31"

[complexity]
# gocyclo, gocognit or csv-file
engine = "gocyclo"
# Used by the csv-file engine, relative to the repository root
csv_file = "complexity.csv"

[coverage]
# Go coverage profile, relative to the repository root
file = "coverage.out"
# auto: run tests when the profile is missing
# always: delete and regenerate the profile
# never: fail when the profile is missing
run = "auto"

[report]
# Coverage percentage at which the coverage gap stops adding risk
perfect_coverage = 100.0
top = 10

[process]
# Kill git or go test after this many seconds
# timeout_secs = 600
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complexity::ComplexityEngine;
    use crate::coverage::RunPolicy;
    use std::path::Path;

    #[test]
    fn test_default_config_parses() {
        let config = parse_config(DEFAULT_CONFIG, Path::new(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.complexity.engine, Some(ComplexityEngine::Gocyclo));
        assert_eq!(config.coverage.run, Some(RunPolicy::Auto));
        assert_eq!(config.report.perfect_coverage, Some(100.0));
        assert_eq!(config.report.top, Some(10));
        assert_eq!(config.churn, ChurnConfig::default());
    }
}
