// Export modules for library usage
pub mod churn;
pub mod cli;
pub mod commands;
pub mod complexity;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod io;
pub mod paths;
pub mod process;
pub mod progress;
pub mod rank;
pub mod report;

// Re-export commonly used types
pub use crate::churn::{ChurnOptions, ChurnRecord, ChurnSortKey, PathFilter};
pub use crate::complexity::{
    ComplexityEngine, ComplexityOptions, FileComplexity, FunctionComplexity,
};
pub use crate::config::RiskmapConfig;
pub use crate::coverage::{CoverageOptions, CoverageSortKey, FileCoverage, RunPolicy};
pub use crate::errors::{Error, Result};
pub use crate::io::OutputFormat;
pub use crate::paths::normalize_path;
pub use crate::report::{FileScore, ReportOptions, ReportSortKey};
