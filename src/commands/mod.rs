//! CLI command implementations.
//!
//! Available commands:
//! - **stat churn|complexity|coverage**: one metric per file
//! - **report**: the combined, ranked risk report
//! - **init**: write a default `.riskmap.toml`
//!
//! Each handler resolves and validates its options first, then gathers
//! metrics, then renders to the given writer.

pub mod init;
pub mod options;
pub mod report;
pub mod stat;

pub use init::init_config;
pub use options::Context;
pub use report::run_report;
pub use stat::{run_churn, run_complexity, run_coverage};
