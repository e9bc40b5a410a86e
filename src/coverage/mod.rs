//! Test coverage per file, read from a Go coverage profile.
//!
//! The profile is regenerated with `go test` according to [`RunPolicy`].
//! Profile file names are Go import paths; they are rebased onto the
//! analyzed directory using the module path from the nearest `go.mod`.

pub mod profile;

pub use profile::{parse_profile, Profile};

use crate::config::loader::{directory_ancestors, MAX_TRAVERSAL_DEPTH};
use crate::errors::{Error, Result};
use crate::paths::{self, normalize_path};
use crate::process::{CommandRunner, CommandSpec, SystemRunner};
use crate::progress;
use crate::rank;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COVERAGE_FILE: &str = "coverage.out";

const PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    pub file: String,
    /// Percentage of statements covered, 0-100
    pub coverage: f64,
    pub statements: u64,
    pub covered: u64,
}

impl FileCoverage {
    pub fn from_profile(file: impl Into<String>, profile: &Profile) -> Self {
        let statements = profile.total_statements();
        let covered = profile.covered_statements();
        let coverage = if statements > 0 {
            covered as f64 * PERCENT / statements as f64
        } else {
            0.0
        };

        Self {
            file: file.into(),
            coverage,
            statements,
            covered,
        }
    }
}

/// When to (re)generate the coverage profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPolicy {
    /// Run tests only when the profile is missing
    #[default]
    Auto,
    /// Delete any existing profile and run tests
    Always,
    /// Never run tests; a missing profile is an error
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageSortKey {
    /// Lowest coverage first
    #[default]
    Worst,
    /// Highest coverage first
    Best,
}

#[derive(Debug, Clone)]
pub struct CoverageOptions {
    pub sort_by: CoverageSortKey,
    pub top: i64,
    pub exclude: Option<Regex>,
    pub run: RunPolicy,
    /// Profile location, relative to the repository root
    pub file: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            sort_by: CoverageSortKey::default(),
            top: 0,
            exclude: None,
            run: RunPolicy::default(),
            file: PathBuf::from(DEFAULT_COVERAGE_FILE),
            timeout: None,
        }
    }
}

/// Pure function: the `go test` invocation that writes the profile.
pub fn build_test_command(repo_path: &Path, opts: &CoverageOptions) -> CommandSpec {
    CommandSpec::new("go", repo_path)
        .args(["test", "./...", "-covermode=set"])
        .arg(format!("-coverprofile={}", opts.file.display()))
        .timeout(opts.timeout)
}

/// Make sure the profile exists according to the run policy, then read it.
pub fn get_coverage_data(repo_path: &Path, opts: &CoverageOptions) -> Result<Vec<FileCoverage>> {
    get_coverage_data_with(&SystemRunner, repo_path, opts)
}

pub fn get_coverage_data_with<R>(
    runner: &R,
    repo_path: &Path,
    opts: &CoverageOptions,
) -> Result<Vec<FileCoverage>>
where
    R: CommandRunner + ?Sized,
{
    let profile_path = repo_path.join(&opts.file);
    let exists = profile_path.is_file();

    match (exists, opts.run) {
        (false, RunPolicy::Never) => {
            log::info!("Coverage file {} not found", profile_path.display());
            return Err(Error::CoverageNotFound(profile_path));
        }
        (false, _) => {
            log::info!("Coverage file {} not found", profile_path.display());
            run_tests(runner, repo_path, opts)?;
        }
        (true, RunPolicy::Always) => {
            log::info!("Removing previous coverage file {}", profile_path.display());
            fs::remove_file(&profile_path)?;
            run_tests(runner, repo_path, opts)?;
        }
        (true, _) => log::debug!("Using existing coverage file {}", profile_path.display()),
    }

    read_coverage(repo_path, &profile_path, opts.exclude.as_ref())
}

fn run_tests<R>(runner: &R, repo_path: &Path, opts: &CoverageOptions) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    let spec = build_test_command(repo_path, opts);
    log::info!("Running test suite: {}", spec);

    let spinner = progress::spinner("Running go test ./...");
    let result = runner.run(&spec);
    spinner.finish_and_clear();

    result?;
    log::info!("Coverage file {} created", repo_path.join(&opts.file).display());
    Ok(())
}

/// Read a profile and summarize it per file, sorted by rebased file name.
///
/// `exclude` is matched against the rebased, repository-relative names so it
/// selects the same files as for churn and complexity.
pub fn read_coverage(
    repo_path: &Path,
    profile_path: &Path,
    exclude: Option<&Regex>,
) -> Result<Vec<FileCoverage>> {
    let content = fs::read_to_string(profile_path)?;
    let profiles = parse_profile(&content, profile_path)?;
    let prefix = import_prefix(repo_path);
    let root = fs::canonicalize(repo_path).unwrap_or_else(|_| repo_path.to_path_buf());

    let mut results: Vec<FileCoverage> = profiles
        .iter()
        .map(|p| (rebase_profile_path(&p.file_name, &root, prefix.as_deref()), p))
        .filter(|(file, _)| !exclude.is_some_and(|pattern| pattern.is_match(file)))
        .map(|(file, p)| FileCoverage::from_profile(file, p))
        .collect();

    results.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(results)
}

/// Import path of `repo_path`: the module declared by the nearest `go.mod`
/// joined with the directory's position inside that module.
pub fn import_prefix(repo_path: &Path) -> Option<String> {
    let root = fs::canonicalize(repo_path).ok()?;
    let module_dir = directory_ancestors(root.clone(), MAX_TRAVERSAL_DEPTH)
        .find(|dir| dir.join("go.mod").is_file())?;

    let content = fs::read_to_string(module_dir.join("go.mod")).ok()?;
    let module = parse_module_directive(&content)?;
    let within = paths::repo_relative(&root, &module_dir).ok()?;
    log::debug!("Go module {} found in {}", module, module_dir.display());

    Some(if within.is_empty() {
        module
    } else {
        format!("{}/{}", module, within)
    })
}

fn parse_module_directive(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.split("//").next().unwrap_or(rest).trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Pure function: express a profile file name relative to the repository root.
///
/// Import paths under `prefix` (see [`import_prefix`]) lose it, absolute
/// paths under `root` are made relative, everything else is kept as written.
pub fn rebase_profile_path(file_name: &str, root: &Path, prefix: Option<&str>) -> String {
    if let Some(prefix) = prefix {
        if let Some(rest) = file_name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            return normalize_path(rest);
        }
    }

    let path = Path::new(file_name);
    if path.is_absolute() {
        match paths::repo_relative(path, root) {
            Ok(relative) => return relative,
            Err(e) => log::debug!("Keeping profile path as written: {}", e),
        }
    }

    normalize_path(file_name)
}

/// Stable sort by coverage in the direction of `sort_by` and apply `limit`.
pub fn sort_and_limit(
    files: Vec<FileCoverage>,
    sort_by: CoverageSortKey,
    limit: i64,
) -> Vec<FileCoverage> {
    match sort_by {
        CoverageSortKey::Worst => rank::rank_ascending(files, |f| f.coverage, limit),
        CoverageSortKey::Best => rank::rank_descending(files, |f| f.coverage, limit),
    }
}
