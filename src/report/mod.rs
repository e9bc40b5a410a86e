//! Combined risk report: churn, complexity and coverage joined per file.
//!
//! Records from the three sources are joined on the normalized path. A file
//! mentioned by any source gets one [`FileScore`]; metrics a source did not
//! report default to zero.
//!
//! Scoring weights the churn/complexity product by the coverage gap:
//!
//! ```text
//! churn_complexity = complexity          if churn == 0
//!                    churn               if complexity == 0
//!                    churn * complexity  otherwise
//! score = churn_complexity                                  if coverage >= perfect
//!         churn_complexity * (perfect - coverage)           otherwise
//! ```

use crate::churn::ChurnRecord;
use crate::complexity::FileComplexity;
use crate::coverage::FileCoverage;
use crate::errors::{Error, Result};
use crate::paths::normalize_path;
use crate::rank;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_PERFECT_COVERAGE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileScore {
    pub file: String,
    pub churn: f64,
    pub complexity: f64,
    pub coverage: f64,
    pub churn_complexity: f64,
    pub score: f64,
}

impl FileScore {
    fn empty(file: String) -> Self {
        Self {
            file,
            churn: 0.0,
            complexity: 0.0,
            coverage: 0.0,
            churn_complexity: 0.0,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSortKey {
    /// Composite score
    #[default]
    Score,
    Churn,
    Complexity,
    Coverage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Coverage percentage at which the coverage gap stops amplifying risk
    pub perfect_coverage: f64,
    pub top: i64,
    pub sort_by: ReportSortKey,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            perfect_coverage: DEFAULT_PERFECT_COVERAGE,
            top: 0,
            sort_by: ReportSortKey::default(),
        }
    }
}

impl ReportOptions {
    /// Reject values that would make scores meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.perfect_coverage.is_finite() || !(0.0..=100.0).contains(&self.perfect_coverage) {
            return Err(Error::config(format!(
                "perfect coverage must be between 0 and 100, got {}",
                self.perfect_coverage
            )));
        }
        Ok(())
    }
}

/// Pure function: join the three sources on normalized path.
///
/// Output order is first-seen: churn files, then files only known to the
/// complexity source, then files only known to the coverage source.
pub fn combine_metrics(
    churn: &[ChurnRecord],
    complexity: &[FileComplexity],
    coverage: &[FileCoverage],
) -> Vec<FileScore> {
    let mut scores: Vec<FileScore> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in churn {
        let idx = slot(&mut scores, &mut index, &record.path);
        scores[idx].churn += record.churn as f64;
    }
    for file in complexity {
        let idx = slot(&mut scores, &mut index, &file.path);
        scores[idx].complexity = file.average;
    }
    for file in coverage {
        let idx = slot(&mut scores, &mut index, &file.file);
        scores[idx].coverage = file.coverage;
    }

    scores
}

/// Position of the record for `path`, creating it on first reference.
fn slot(scores: &mut Vec<FileScore>, index: &mut HashMap<String, usize>, path: &str) -> usize {
    let key = normalize_path(path);
    if let Some(&idx) = index.get(&key) {
        return idx;
    }
    scores.push(FileScore::empty(key.clone()));
    index.insert(key, scores.len() - 1);
    scores.len() - 1
}

/// Pure function: the churn/complexity product with zero fallbacks.
pub fn churn_complexity(churn: f64, complexity: f64) -> f64 {
    if churn == 0.0 {
        complexity
    } else if complexity == 0.0 {
        churn
    } else {
        churn * complexity
    }
}

/// Fill in `churn_complexity` and `score` for one file.
pub fn calculate_score(file: &mut FileScore, perfect_coverage: f64) {
    file.churn_complexity = churn_complexity(file.churn, file.complexity);
    file.score = if file.coverage >= perfect_coverage {
        file.churn_complexity
    } else {
        file.churn_complexity * (perfect_coverage - file.coverage)
    };
}

pub fn calculate_scores(mut files: Vec<FileScore>, perfect_coverage: f64) -> Vec<FileScore> {
    for file in &mut files {
        calculate_score(file, perfect_coverage);
    }
    files
}

/// Stable sort by `sort_by` (highest first) and apply `limit`.
pub fn sort_and_limit(files: Vec<FileScore>, sort_by: ReportSortKey, limit: i64) -> Vec<FileScore> {
    let key: fn(&FileScore) -> f64 = match sort_by {
        ReportSortKey::Score => |f: &FileScore| f.score,
        ReportSortKey::Churn => |f: &FileScore| f.churn,
        ReportSortKey::Complexity => |f: &FileScore| f.complexity,
        ReportSortKey::Coverage => |f: &FileScore| f.coverage,
    };
    rank::rank_descending(files, key, limit)
}

/// Validate options, join, score and rank.
pub fn build_report(
    churn: &[ChurnRecord],
    complexity: &[FileComplexity],
    coverage: &[FileCoverage],
    opts: &ReportOptions,
) -> Result<Vec<FileScore>> {
    opts.validate()?;
    let combined = combine_metrics(churn, complexity, coverage);
    log::debug!("Combined metrics for {} files", combined.len());
    let scored = calculate_scores(combined, opts.perfect_coverage);
    Ok(sort_and_limit(scored, opts.sort_by, opts.top))
}
