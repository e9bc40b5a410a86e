use crate::complexity::ComplexityEngine;
use crate::coverage::RunPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Contents of `.riskmap.toml`. Every field is optional; command-line flags
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskmapConfig {
    pub churn: ChurnConfig,
    pub complexity: ComplexityConfig,
    pub coverage: CoverageConfig,
    pub report: ReportConfig,
    pub process: ProcessConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChurnConfig {
    /// Regex of paths to leave out of every metric
    pub exclude: Option<String>,
    /// Extension allow-list, without dots
    pub extensions: Option<Vec<String>>,
    /// Start of the history window, `YYYY-MM-DD`
    pub since: Option<String>,
    /// End of the history window, `YYYY-MM-DD`
    pub until: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComplexityConfig {
    pub engine: Option<ComplexityEngine>,
    pub csv_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    pub file: Option<PathBuf>,
    pub run: Option<RunPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub perfect_coverage: Option<f64>,
    pub top: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessConfig {
    /// Kill `git`/`go test` after this many seconds
    pub timeout_secs: Option<u64>,
}
