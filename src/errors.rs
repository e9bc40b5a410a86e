//! Shared error types for riskmap operations.
//!
//! Library code returns [`Result`]; the command layer wraps these with
//! `anyhow` context before they reach the user.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for riskmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// The external command could not be started at all
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The external command ran but exited unsuccessfully
    #[error("`{command}` exited with {status}\nstderr: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The external command exceeded its time budget and was killed
    #[error("`{command}` timed out after {}s", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    /// Coverage profile written in a mode other than `set`
    #[error("unsupported coverage mode: {0}")]
    UnsupportedCoverageMode(String),

    /// Structural parse failures in coverage profiles or complexity CSV files
    #[error("parse error in {}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Coverage file is missing and regeneration is disallowed
    #[error("coverage file {} not found and test execution is disabled", .0.display())]
    CoverageNotFound(PathBuf),

    /// Invalid option values, detected before any subprocess runs
    #[error("configuration error: {0}")]
    Config(String),

    /// A path that cannot be expressed relative to the repository root
    #[error("cannot resolve {} relative to {}", .path.display(), .root.display())]
    PathResolution { path: PathBuf, root: PathBuf },

    /// File system errors
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the user can fix this by changing flags or config.
    pub fn is_user_fixable(&self) -> bool {
        self.hint().is_some()
    }

    /// Suggested next step for errors the user can fix.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Config(_) => Some("check the command-line flags and .riskmap.toml"),
            Self::CoverageNotFound(_) => {
                Some("use --run auto to generate the profile, or --coverage-file to point at one")
            }
            Self::UnsupportedCoverageMode(_) => {
                Some("regenerate the profile with go test -covermode=set")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
