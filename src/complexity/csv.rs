//! Pre-computed complexity loaded from a CSV file.
//!
//! Columns are `filename,function,length,complexity,line,packages`. A header
//! row is optional: when the first row starts with `filename` the columns
//! are located by name, otherwise they are read positionally. `packages` is
//! a `;`-separated list. Fields may be double-quoted with `""` escapes.

use super::{group_by_file, FileComplexity, FunctionComplexity};
use crate::errors::{Error, Result};
use crate::paths::normalize_path;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const REQUIRED_COLUMNS: [&str; 4] = ["filename", "function", "length", "complexity"];

/// Read `path` and group its rows per file, dropping files matching `exclude`.
pub fn read_complexity_csv(path: &Path, exclude: Option<&Regex>) -> Result<Vec<FileComplexity>> {
    let content = fs::read_to_string(path)?;
    let functions = parse_complexity_csv(&content, path)?;

    let kept: Vec<FunctionComplexity> = functions
        .into_iter()
        .filter(|f| !exclude.is_some_and(|pattern| pattern.is_match(&normalize_path(&f.file))))
        .collect();

    Ok(group_by_file(kept))
}

/// Column positions within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    filename: usize,
    function: usize,
    length: usize,
    complexity: usize,
    line: Option<usize>,
    packages: Option<usize>,
}

impl ColumnMap {
    const POSITIONAL: Self = Self {
        filename: 0,
        function: 1,
        length: 2,
        complexity: 3,
        line: Some(4),
        packages: Some(5),
    };

    fn from_header(header: &[String], source: &Path) -> Result<Self> {
        let position = |name: &str| {
            header
                .iter()
                .position(|column| column.trim().eq_ignore_ascii_case(name))
        };

        for name in REQUIRED_COLUMNS {
            if position(name).is_none() {
                return Err(Error::parse(
                    source,
                    1,
                    format!("missing required column '{}'", name),
                ));
            }
        }

        Ok(Self {
            filename: position("filename").unwrap_or(0),
            function: position("function").unwrap_or(1),
            length: position("length").unwrap_or(2),
            complexity: position("complexity").unwrap_or(3),
            line: position("line"),
            packages: position("packages"),
        })
    }

    fn min_width(&self) -> usize {
        [self.filename, self.function, self.length, self.complexity]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Pure function: parse CSV text into function records.
///
/// `source` only labels parse errors. Empty input is an error since it
/// almost always means the analyzer never ran.
pub fn parse_complexity_csv(content: &str, source: &Path) -> Result<Vec<FunctionComplexity>> {
    let mut rows = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((first_line_no, first_line)) = rows.next() else {
        return Err(Error::parse(source, 0, "CSV data is empty"));
    };

    let first = split_record(first_line);
    let (columns, pending) = if first
        .first()
        .is_some_and(|cell| cell.trim().eq_ignore_ascii_case("filename"))
    {
        (ColumnMap::from_header(&first, source)?, None)
    } else {
        (ColumnMap::POSITIONAL, Some((first_line_no, first)))
    };

    let mut functions = Vec::new();
    if let Some((line_no, record)) = pending {
        functions.push(parse_row(&record, &columns, source, line_no)?);
    }
    for (line_no, line) in rows {
        functions.push(parse_row(&split_record(line), &columns, source, line_no)?);
    }

    if functions.is_empty() {
        return Err(Error::parse(source, first_line_no, "CSV contains a header but no rows"));
    }

    Ok(functions)
}

fn parse_row(
    record: &[String],
    columns: &ColumnMap,
    source: &Path,
    line_no: usize,
) -> Result<FunctionComplexity> {
    if record.len() < columns.min_width() {
        return Err(Error::parse(
            source,
            line_no,
            format!(
                "expected at least {} columns, found {}",
                columns.min_width(),
                record.len()
            ),
        ));
    }

    let field = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(|value| value.trim())
            .unwrap_or("")
    };
    let number = |name: &str, idx: Option<usize>| -> Result<usize> {
        parse_number(field(idx), name, source, line_no)
    };

    let packages = field(columns.packages)
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    let line = match field(columns.line) {
        "" => 0,
        _ => number("line", columns.line)?,
    };

    Ok(FunctionComplexity {
        file: field(Some(columns.filename)).to_string(),
        name: field(Some(columns.function)).to_string(),
        packages,
        line,
        length: number("length", Some(columns.length))?,
        complexity: parse_number(field(Some(columns.complexity)), "complexity", source, line_no)?,
    })
}

fn parse_number<T: FromStr>(value: &str, column: &str, source: &Path, line_no: usize) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        Error::parse(
            source,
            line_no,
            format!("invalid {} value '{}'", column, value),
        )
    })
}

/// Split one CSV record, honoring double quotes and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn source() -> PathBuf {
        PathBuf::from("complexity.csv")
    }

    #[test]
    fn test_split_record_quotes() {
        assert_eq!(split_record("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(
            split_record(r#""pkg/a,b.go","say ""hi""",3"#),
            vec!["pkg/a,b.go", r#"say "hi""#, "3"]
        );
        assert_eq!(split_record("a,,"), vec!["a", "", ""]);
    }

    #[test]
    fn test_positional_rows() {
        let csv = indoc! {"
            pkg/a.go,Parse,20,7,12,pkg;parser
            pkg/a.go,Lex,5,1,40,
        "};

        let functions = parse_complexity_csv(csv, &source()).unwrap();

        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "Parse");
        assert_eq!(functions[0].complexity, 7);
        assert_eq!(functions[0].line, 12);
        assert_eq!(functions[0].packages, vec!["pkg", "parser"]);
        assert!(functions[1].packages.is_empty());
    }

    #[test]
    fn test_header_reorders_columns() {
        let csv = indoc! {"
            complexity,function,filename,length
            4,Run,cmd/main.go,10
        "};

        // Header must start with filename to be detected; otherwise this row is data
        assert!(parse_complexity_csv(csv, &source()).is_err());

        let csv = indoc! {"
            filename,length,complexity,function
            cmd/main.go,10,4,Run
        "};
        let functions = parse_complexity_csv(csv, &source()).unwrap();
        assert_eq!(functions[0].file, "cmd/main.go");
        assert_eq!(functions[0].name, "Run");
        assert_eq!(functions[0].length, 10);
        assert_eq!(functions[0].complexity, 4);
        assert_eq!(functions[0].line, 0);
    }

    #[test]
    fn test_header_missing_required_column() {
        let csv = "filename,function,length\na.go,f,1\n";
        match parse_complexity_csv(csv, &source()).unwrap_err() {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("complexity"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let csv = "a.go,f,1,2\nb.go,g,x,3\n";
        match parse_complexity_csv(csv, &source()).unwrap_err() {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("length"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_too_few_columns() {
        assert!(parse_complexity_csv("a.go,f,1\n", &source()).is_err());
    }

    #[test]
    fn test_empty_data_is_an_error() {
        assert!(parse_complexity_csv("", &source()).is_err());
        assert!(parse_complexity_csv("\n\n", &source()).is_err());
        assert!(parse_complexity_csv("filename,function,length,complexity\n", &source()).is_err());
    }

    #[test]
    fn test_read_complexity_csv_groups_and_excludes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("complexity.csv");
        fs::write(
            &path,
            indoc! {"
                filename,function,length,complexity,line,packages
                ./pkg/a.go,F,10,4,1,pkg
                pkg/a.go,G,10,2,20,pkg
                gen/b.go,H,3,9,1,gen
            "},
        )
        .unwrap();

        let exclude = Regex::new("^gen/").unwrap();
        let files = read_complexity_csv(&path, Some(&exclude)).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "pkg/a.go");
        assert_eq!(files[0].average, 3.0);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_complexity_csv(&dir.path().join("nope.csv"), None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
