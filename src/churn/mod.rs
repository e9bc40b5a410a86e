//! Version-control churn: per-file line and commit counts from `git log`.

pub mod filter;
pub mod parser;

pub use filter::PathFilter;
pub use parser::{parse_numstat_log, NumstatParser};

use crate::errors::Result;
use crate::process::{CommandRunner, CommandSpec, SystemRunner};
use crate::rank;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Aggregated history for a single file.
///
/// `churn` always equals `added + removed`; use [`ChurnRecord::add_lines`]
/// to mutate the counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnRecord {
    pub path: String,
    #[serde(rename = "additions")]
    pub added: u64,
    #[serde(rename = "deletions")]
    pub removed: u64,
    #[serde(rename = "changes")]
    pub churn: u64,
    pub commits: u64,
}

impl ChurnRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            added: 0,
            removed: 0,
            churn: 0,
            commits: 0,
        }
    }

    pub fn add_lines(&mut self, added: u64, removed: u64) {
        self.added = self.added.saturating_add(added);
        self.removed = self.removed.saturating_add(removed);
        self.churn = self.added.saturating_add(self.removed);
    }
}

/// Key used to rank churn records, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChurnSortKey {
    /// Total lines added plus removed
    #[default]
    Changes,
    /// Lines added
    Additions,
    /// Lines removed
    Deletions,
    /// Distinct commits touching the file
    Commits,
}

impl std::fmt::Display for ChurnSortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Changes => write!(f, "changes"),
            Self::Additions => write!(f, "additions"),
            Self::Deletions => write!(f, "deletions"),
            Self::Commits => write!(f, "commits"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChurnOptions {
    pub sort_by: ChurnSortKey,
    pub top: i64,
    pub filter: PathFilter,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub timeout: Option<Duration>,
}

/// Pure function: the `git log` invocation for a churn window.
///
/// `--relative` plus a `.` pathspec keeps every reported path relative to
/// `repo_path`, even when it is a subdirectory of the work tree.
/// `core.quotePath=false` leaves non-ASCII names unescaped.
pub fn build_git_command(repo_path: &Path, opts: &ChurnOptions) -> CommandSpec {
    let mut spec = CommandSpec::new("git", repo_path)
        .args(["-c", "core.quotePath=false"])
        .args(["log", "--pretty=format:%H", "--numstat", "--relative"])
        .timeout(opts.timeout);

    if let Some(since) = opts.since {
        spec = spec.arg(format!("--since={}", since.format("%Y-%m-%d")));
    }
    if let Some(until) = opts.until {
        spec = spec.arg(format!("--until={}", until.format("%Y-%m-%d")));
    }

    spec.args(["--", "."])
}

/// Run `git log` in `repo_path` and aggregate churn per file, sorted by path.
pub fn read_git_churn(repo_path: &Path, opts: &ChurnOptions) -> Result<Vec<ChurnRecord>> {
    read_git_churn_with(&SystemRunner, repo_path, opts)
}

pub fn read_git_churn_with<R>(
    runner: &R,
    repo_path: &Path,
    opts: &ChurnOptions,
) -> Result<Vec<ChurnRecord>>
where
    R: CommandRunner + ?Sized,
{
    let spec = build_git_command(repo_path, opts);
    let output = runner.run(&spec)?;
    let log = String::from_utf8_lossy(&output);

    let records = parse_numstat_log(&log, &opts.filter);
    log::debug!("Parsed churn for {} files", records.len());

    Ok(records.into_values().collect())
}

/// Stable sort by `sort_by` (highest first) and apply the `limit` cap.
pub fn sort_and_limit(
    records: Vec<ChurnRecord>,
    sort_by: ChurnSortKey,
    limit: i64,
) -> Vec<ChurnRecord> {
    let key: fn(&ChurnRecord) -> f64 = match sort_by {
        ChurnSortKey::Changes => |r: &ChurnRecord| r.churn as f64,
        ChurnSortKey::Additions => |r: &ChurnRecord| r.added as f64,
        ChurnSortKey::Deletions => |r: &ChurnRecord| r.removed as f64,
        ChurnSortKey::Commits => |r: &ChurnRecord| r.commits as f64,
    };
    rank::rank_descending(records, key, limit)
}
