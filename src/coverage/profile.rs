//! Parser for Go coverage profiles written with `-covermode=set`.
//!
//! ```text
//! mode: set
//! example.com/mod/pkg/a.go:3.14,5.2 2 1
//! ```
//!
//! Each block line is `<file>:<startLine>.<startCol>,<endLine>.<endCol>
//! <statements> <hits>`. Blocks for the same range (emitted once per test
//! binary that compiled the package) are merged.

use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

pub const SUPPORTED_MODE: &str = "set";

static BLOCK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+):(\d+)\.(\d+),(\d+)\.(\d+) (\d+) (\d+)$").expect("profile pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileBlock {
    pub range: BlockRange,
    pub statements: u64,
    pub hits: u64,
}

/// All blocks for one source file, ordered by range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub file_name: String,
    pub blocks: Vec<ProfileBlock>,
}

impl Profile {
    pub fn total_statements(&self) -> u64 {
        self.blocks.iter().map(|b| b.statements).sum()
    }

    pub fn covered_statements(&self) -> u64 {
        self.blocks
            .iter()
            .filter(|b| b.hits > 0)
            .map(|b| b.statements)
            .sum()
    }
}

fn parse_mode(line: &str) -> Option<&str> {
    line.strip_prefix("mode:").map(str::trim)
}

fn parse_block(line: &str, source: &Path, line_no: usize) -> Result<(String, ProfileBlock)> {
    let captures = BLOCK_LINE
        .captures(line)
        .ok_or_else(|| Error::parse(source, line_no, format!("malformed block line '{}'", line)))?;

    let number = |idx: usize| -> Result<u64> {
        captures[idx].parse::<u64>().map_err(|e| {
            Error::parse(source, line_no, format!("invalid number '{}': {}", &captures[idx], e))
        })
    };
    let position = |idx: usize| -> Result<u32> {
        captures[idx].parse::<u32>().map_err(|e| {
            Error::parse(source, line_no, format!("invalid position '{}': {}", &captures[idx], e))
        })
    };

    let block = ProfileBlock {
        range: BlockRange {
            start_line: position(2)?,
            start_col: position(3)?,
            end_line: position(4)?,
            end_col: position(5)?,
        },
        statements: number(6)?,
        hits: number(7)?,
    };

    Ok((captures[1].to_string(), block))
}

/// Pure function: parse profile text into per-file profiles sorted by file name.
///
/// The first non-blank line must be `mode: set`; any other mode yields
/// [`Error::UnsupportedCoverageMode`]. Repeated `mode:` lines from
/// concatenated profiles are accepted when they agree.
pub fn parse_profile(content: &str, source: &Path) -> Result<Vec<Profile>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_no, header) = lines
        .next()
        .ok_or_else(|| Error::parse(source, 0, "coverage profile is empty"))?;
    let mode = parse_mode(header)
        .ok_or_else(|| Error::parse(source, header_no, "missing 'mode:' header"))?;
    if mode != SUPPORTED_MODE {
        return Err(Error::UnsupportedCoverageMode(mode.to_string()));
    }

    let mut files: BTreeMap<String, BTreeMap<BlockRange, ProfileBlock>> = BTreeMap::new();
    for (line_no, line) in lines {
        if let Some(other) = parse_mode(line) {
            if other != SUPPORTED_MODE {
                return Err(Error::UnsupportedCoverageMode(other.to_string()));
            }
            continue;
        }

        let (file_name, block) = parse_block(line, source, line_no)?;
        let blocks = files.entry(file_name).or_default();
        match blocks.get_mut(&block.range) {
            Some(existing) => {
                if existing.statements != block.statements {
                    return Err(Error::parse(
                        source,
                        line_no,
                        format!(
                            "inconsistent statement count for duplicate block ({} vs {})",
                            existing.statements, block.statements
                        ),
                    ));
                }
                existing.hits = existing.hits.max(block.hits);
            }
            None => {
                blocks.insert(block.range, block);
            }
        }
    }

    Ok(files
        .into_iter()
        .map(|(file_name, blocks)| Profile {
            file_name,
            blocks: blocks.into_values().collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn source() -> PathBuf {
        PathBuf::from("coverage.out")
    }

    #[test]
    fn test_covered_and_uncovered_blocks() {
        let content = indoc! {"
            mode: set
            example.com/m/a.go:3.14,5.2 3 1
            example.com/m/a.go:7.10,9.2 2 0
        "};

        let profiles = parse_profile(content, &source()).unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].file_name, "example.com/m/a.go");
        assert_eq!(profiles[0].total_statements(), 5);
        assert_eq!(profiles[0].covered_statements(), 3);
    }

    #[test]
    fn test_duplicate_blocks_are_merged() {
        let content = indoc! {"
            mode: set
            m/a.go:1.1,2.2 4 0
            m/a.go:1.1,2.2 4 1
            m/a.go:3.1,4.2 1 0
            m/a.go:3.1,4.2 1 0
        "};

        let profiles = parse_profile(content, &source()).unwrap();

        assert_eq!(profiles[0].blocks.len(), 2);
        assert_eq!(profiles[0].total_statements(), 5);
        assert_eq!(profiles[0].covered_statements(), 4);
    }

    #[test]
    fn test_files_sorted_by_name() {
        let content = "mode: set\nm/z.go:1.1,2.2 1 1\nm/a.go:1.1,2.2 1 0\n";
        let names: Vec<_> = parse_profile(content, &source())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name)
            .collect();
        assert_eq!(names, vec!["m/a.go", "m/z.go"]);
    }

    #[test]
    fn test_unsupported_mode() {
        let err = parse_profile("mode: count\nm/a.go:1.1,2.2 1 5\n", &source()).unwrap_err();
        match err {
            Error::UnsupportedCoverageMode(mode) => assert_eq!(mode, "count"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conflicting_mode_in_concatenated_profile() {
        let content = "mode: set\nm/a.go:1.1,2.2 1 1\nmode: atomic\n";
        assert!(matches!(
            parse_profile(content, &source()),
            Err(Error::UnsupportedCoverageMode(_))
        ));
    }

    #[test]
    fn test_missing_header() {
        let err = parse_profile("m/a.go:1.1,2.2 1 1\n", &source()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_malformed_block_line() {
        let err = parse_profile("mode: set\nm/a.go:1.1,2.2 one 1\n", &source()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_inconsistent_duplicate() {
        let content = "mode: set\nm/a.go:1.1,2.2 1 1\nm/a.go:1.1,2.2 3 1\n";
        assert!(matches!(
            parse_profile(content, &source()),
            Err(Error::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_empty_profile() {
        assert!(parse_profile("", &source()).is_err());
        assert!(parse_profile("mode: set\n", &source()).unwrap().is_empty());
    }

    #[test]
    fn test_file_names_with_colons() {
        let content = "mode: set\nC:/work/m/a.go:1.1,2.2 2 1\n";
        let profiles = parse_profile(content, &source()).unwrap();
        assert_eq!(profiles[0].file_name, "C:/work/m/a.go");
    }
}
