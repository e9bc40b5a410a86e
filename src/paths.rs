//! Path canonicalization shared by every metric source.
//!
//! Churn, complexity and coverage data refer to the same file through
//! differently shaped strings. Each adapter first rebases its paths onto the
//! repository root; [`normalize_path`] then gives them one comparable form:
//! forward slashes, no empty or `.` segments, no leading `./` or `/`.

use crate::errors::{Error, Result};
use std::path::{Component, Path};

/// Pure function: canonical join key for a repository-relative path.
///
/// Backslashes become `/`, empty and `.` segments are dropped. `..` segments
/// are preserved since resolving them would need file system access.
/// Idempotent: `normalize_path(&normalize_path(p)) == normalize_path(p)`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Express `path` relative to `root` as a normalized string.
///
/// Relative inputs are assumed to already be relative to `root`. Absolute
/// inputs outside `root` yield [`Error::PathResolution`] instead of aborting.
pub fn repo_relative(path: &Path, root: &Path) -> Result<String> {
    if !path.is_absolute() {
        return Ok(normalize_path(&path.to_string_lossy()));
    }

    path.strip_prefix(root)
        .map(|relative| normalize_path(&components_to_string(relative)))
        .map_err(|_| Error::PathResolution {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

fn components_to_string(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Extension of a normalized path without the dot, if any.
pub fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&file_name[idx + 1..]).filter(|ext| !ext.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_strips_leading_markers() {
        assert_eq!(normalize_path("./path/to/file.go"), "path/to/file.go");
        assert_eq!(normalize_path("/path/to/file.go"), "path/to/file.go");
        assert_eq!(normalize_path("././a.go"), "a.go");
        assert_eq!(normalize_path("file.go"), "file.go");
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_path("path\\to\\file.go"), "path/to/file.go");
        assert_eq!(normalize_path("path//to/./file.go"), "path/to/file.go");
        assert_eq!(normalize_path("dir/"), "dir");
    }

    #[test]
    fn test_normalize_keeps_parent_segments() {
        assert_eq!(normalize_path("../shared/x.go"), "../shared/x.go");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("./"), "");
    }

    #[test]
    fn test_repo_relative_absolute_under_root() {
        let root = PathBuf::from("/work/repo");
        let path = root.join("pkg").join("a.go");
        assert_eq!(repo_relative(&path, &root).unwrap(), "pkg/a.go");
    }

    #[test]
    fn test_repo_relative_passes_relative_paths_through() {
        let root = PathBuf::from("/work/repo");
        assert_eq!(
            repo_relative(Path::new("./pkg/a.go"), &root).unwrap(),
            "pkg/a.go"
        );
    }

    #[test]
    fn test_repo_relative_outside_root_is_an_error() {
        let root = PathBuf::from("/work/repo");
        let err = repo_relative(Path::new("/elsewhere/a.go"), &root).unwrap_err();
        assert!(matches!(err, Error::PathResolution { .. }));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("src/main.go"), Some("go"));
        assert_eq!(extension("archive.tar.gz"), Some("gz"));
        assert_eq!(extension("Makefile"), None);
        assert_eq!(extension("dir.d/Makefile"), None);
        assert_eq!(extension(".gitignore"), None);
        assert_eq!(extension("trailing."), None);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in "[a-z./\\\\]{0,30}") {
            let once = normalize_path(&path);
            prop_assert_eq!(normalize_path(&once), once.clone());
        }

        #[test]
        fn normalized_paths_have_no_leading_markers(path in "[a-z./]{0,30}") {
            let normalized = normalize_path(&path);
            prop_assert!(!normalized.starts_with('/'));
            prop_assert!(!normalized.starts_with("./"));
            prop_assert!(!normalized.contains("//"));
        }
    }
}
