//! Streaming parser for `git log --pretty=format:%H --numstat` output.
//!
//! Two kinds of lines matter: a bare commit hash opens a commit, and a
//! `<added> <removed> <path>` line attributes line counts to a file. The
//! per-commit touched set guarantees a path bumps its commit counter at most
//! once per commit.

use super::filter::PathFilter;
use super::ChurnRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static NUMSTAT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)\s+(\S+)\s+(.+)$").expect("numstat pattern is valid")
});

/// SHA-1 object names are 40 hex digits, SHA-256 ones 64.
fn is_commit_hash(line: &str) -> bool {
    matches!(line.len(), 40 | 64) && line.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A parsed numstat line before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileChange {
    pub path: String,
    pub added: u64,
    pub removed: u64,
}

/// Pure function: parse a single numstat line.
///
/// Binary files report `-` instead of counts; those lines, and any line with
/// negative or non-numeric counts, yield `None`.
pub(crate) fn parse_numstat_line(line: &str) -> Option<FileChange> {
    let captures = NUMSTAT_LINE.captures(line)?;
    let added = captures[1].parse::<u64>().ok()?;
    let removed = captures[2].parse::<u64>().ok()?;
    let path = unquote_path(&resolve_rename(captures[3].trim()));

    Some(FileChange {
        path,
        added,
        removed,
    })
}

/// Map git's rename notation onto the destination path.
///
/// `src/{old => new}/a.go` becomes `src/new/a.go`, `a.go => b.go` becomes `b.go`.
fn resolve_rename(path: &str) -> String {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            let inner = &path[open + 1..close];
            if let Some((_, to)) = inner.split_once(" => ") {
                let joined = format!("{}{}{}", &path[..open], to, &path[close + 1..]);
                return joined.replace("//", "/");
            }
        }
    }

    match path.split_once(" => ") {
        Some((_, to)) => to.to_string(),
        None => path.to_string(),
    }
}

/// Undo git's C-style quoting of path names.
///
/// Names holding `"`, `\`, tabs or newlines stay quoted even with
/// `core.quotePath=false`. Octal escapes are raw bytes of a UTF-8 name.
fn unquote_path(path: &str) -> String {
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut input = inner.bytes().peekable();
    while let Some(byte) = input.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match input.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match input.peek() {
                        Some(&next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            input.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Churn accumulation state machine.
pub struct NumstatParser<'a> {
    filter: &'a PathFilter,
    records: BTreeMap<String, ChurnRecord>,
    current_commit: Option<String>,
    touched: BTreeSet<String>,
}

impl<'a> NumstatParser<'a> {
    pub fn new(filter: &'a PathFilter) -> Self {
        Self {
            filter,
            records: BTreeMap::new(),
            current_commit: None,
            touched: BTreeSet::new(),
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return;
        }

        if is_commit_hash(line) {
            self.finish_commit();
            self.current_commit = Some(line.to_string());
        } else if let Some(change) = parse_numstat_line(line) {
            self.record_change(change);
        } else {
            log::trace!("Skipping numstat line: {}", line);
        }
    }

    fn record_change(&mut self, change: FileChange) {
        if !self.filter.allows(&change.path) {
            return;
        }

        self.records
            .entry(change.path.clone())
            .or_insert_with(|| ChurnRecord::new(&change.path))
            .add_lines(change.added, change.removed);

        self.touched.insert(change.path);
    }

    fn finish_commit(&mut self) {
        let touched = std::mem::take(&mut self.touched);
        if self.current_commit.is_none() {
            return;
        }

        for path in touched {
            if let Some(record) = self.records.get_mut(&path) {
                record.commits += 1;
            }
        }
    }

    /// Flush the pending commit and return records keyed by path.
    pub fn finish(mut self) -> BTreeMap<String, ChurnRecord> {
        self.finish_commit();
        self.records
    }
}

/// Pure function: parse a complete log into per-file churn records.
pub fn parse_numstat_log(log: &str, filter: &PathFilter) -> BTreeMap<String, ChurnRecord> {
    let mut parser = NumstatParser::new(filter);
    for line in log.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}
