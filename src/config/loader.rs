use std::fs;
use std::path::{Path, PathBuf};

use super::core::RiskmapConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".riskmap.toml";

pub const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to parse config from a TOML string
pub fn parse_config(contents: &str, source: &Path) -> Result<RiskmapConfig> {
    toml::from_str::<RiskmapConfig>(contents)
        .map_err(|e| Error::config(format!("failed to parse {}: {}", source.display(), e)))
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find `.riskmap.toml` in `start` or one of its ancestors.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
    let found = directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file());

    if found.is_none() {
        log::debug!(
            "No config found after checking {} directories. Using defaults.",
            MAX_TRAVERSAL_DEPTH
        );
    }
    found
}

/// Load configuration.
///
/// An explicit path must exist and parse. Without one, the nearest
/// `.riskmap.toml` above `start` is used if present, defaults otherwise.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<RiskmapConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file(start) {
            Some(path) => path,
            None => return Ok(RiskmapConfig::default()),
        },
    };

    let contents = fs::read_to_string(&path).map_err(|e| {
        Error::config(format!("failed to read {}: {}", path.display(), e))
    })?;
    let config = parse_config(&contents, &path)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}
