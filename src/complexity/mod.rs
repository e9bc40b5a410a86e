//! Per-function complexity and the file-level averages derived from it.
//!
//! Three engines are available: cyclomatic and cognitive complexity computed
//! from Go sources with tree-sitter, and a pre-computed CSV file for any
//! other language or external analyzer.

pub mod csv;
pub mod go;

use crate::errors::Result;
use crate::paths::normalize_path;
use crate::rank;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CSV_FILE: &str = "complexity.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub file: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
    pub line: usize,
    pub length: usize,
    pub complexity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileComplexity {
    pub path: String,
    pub functions: Vec<FunctionComplexity>,
    /// Mean complexity over `functions`
    pub average: f64,
}

impl FileComplexity {
    pub fn new(path: impl Into<String>, functions: Vec<FunctionComplexity>) -> Self {
        let average = average_complexity(&functions);
        Self {
            path: path.into(),
            functions,
            average,
        }
    }
}

/// Pure function: sum(complexity) / count, or 0 for a file without functions.
pub fn average_complexity(functions: &[FunctionComplexity]) -> f64 {
    if functions.is_empty() {
        return 0.0;
    }
    let total: f64 = functions.iter().map(|f| f64::from(f.complexity)).sum();
    total / functions.len() as f64
}

/// Complexity engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum ComplexityEngine {
    /// Cyclomatic complexity of Go functions
    #[default]
    #[value(name = "gocyclo")]
    #[serde(rename = "gocyclo")]
    Gocyclo,
    /// Cognitive complexity of Go functions
    #[value(name = "gocognit")]
    #[serde(rename = "gocognit")]
    Gocognit,
    /// Pre-computed values from a CSV file
    #[value(name = "csv-file")]
    #[serde(rename = "csv-file")]
    CsvFile,
}

#[derive(Debug, Clone)]
pub struct ComplexityOptions {
    pub engine: ComplexityEngine,
    pub exclude: Option<Regex>,
    /// CSV location, relative to the repository root
    pub csv_file: PathBuf,
    pub top: i64,
}

impl Default for ComplexityOptions {
    fn default() -> Self {
        Self {
            engine: ComplexityEngine::default(),
            exclude: None,
            csv_file: PathBuf::from(DEFAULT_CSV_FILE),
            top: 0,
        }
    }
}

/// Dispatch to the selected engine; results are sorted by path.
pub fn run_complexity(repo_path: &Path, opts: &ComplexityOptions) -> Result<Vec<FileComplexity>> {
    let exclude = opts.exclude.as_ref();
    match opts.engine {
        ComplexityEngine::Gocyclo => go::analyze_repository(repo_path, go::GoMetric::Cyclomatic, exclude),
        ComplexityEngine::Gocognit => go::analyze_repository(repo_path, go::GoMetric::Cognitive, exclude),
        ComplexityEngine::CsvFile => csv::read_complexity_csv(&repo_path.join(&opts.csv_file), exclude),
    }
}

/// Group functions by normalized file path and compute each file's average.
pub(crate) fn group_by_file(functions: Vec<FunctionComplexity>) -> Vec<FileComplexity> {
    let mut by_file: BTreeMap<String, Vec<FunctionComplexity>> = BTreeMap::new();
    for function in functions {
        by_file
            .entry(normalize_path(&function.file))
            .or_default()
            .push(function);
    }

    by_file
        .into_iter()
        .map(|(path, functions)| FileComplexity::new(path, functions))
        .collect()
}

/// Stable sort by average complexity (highest first) and apply `limit`.
pub fn sort_and_limit(files: Vec<FileComplexity>, limit: i64) -> Vec<FileComplexity> {
    rank::rank_descending(files, |f| f.average, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn function(file: &str, name: &str, complexity: u32) -> FunctionComplexity {
        FunctionComplexity {
            file: file.to_string(),
            name: name.to_string(),
            packages: Vec::new(),
            line: 1,
            length: 3,
            complexity,
        }
    }

    #[test]
    fn test_average_complexity() {
        let functions = vec![function("a.go", "f", 1), function("a.go", "g", 2)];
        assert_eq!(average_complexity(&functions), 1.5);
        assert_eq!(average_complexity(&[]), 0.0);
    }

    #[test]
    fn test_group_by_file_normalizes_paths() {
        let grouped = group_by_file(vec![
            function("./pkg/a.go", "f", 4),
            function("pkg/a.go", "g", 2),
            function("b.go", "h", 7),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].path, "b.go");
        assert_eq!(grouped[1].path, "pkg/a.go");
        assert_eq!(grouped[1].functions.len(), 2);
        assert_eq!(grouped[1].average, 3.0);
    }

    #[test]
    fn test_sort_and_limit() {
        let files = vec![
            FileComplexity::new("low.go", vec![function("low.go", "f", 1)]),
            FileComplexity::new("high.go", vec![function("high.go", "f", 9)]),
            FileComplexity::new("mid.go", vec![function("mid.go", "f", 5)]),
        ];

        let ranked = sort_and_limit(files, 2);

        let paths: Vec<_> = ranked.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["high.go", "mid.go"]);
    }

    #[test]
    fn test_engine_value_names() {
        assert_eq!(
            ComplexityEngine::from_str("csv-file", true).unwrap(),
            ComplexityEngine::CsvFile
        );
        assert_eq!(
            ComplexityEngine::from_str("gocognit", true).unwrap(),
            ComplexityEngine::Gocognit
        );
    }
}
