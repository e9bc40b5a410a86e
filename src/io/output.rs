use crate::churn::ChurnRecord;
use crate::complexity::FileComplexity;
use crate::coverage::FileCoverage;
use crate::report::FileScore;
use clap::ValueEnum;
use comfy_table::{presets, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Title line plus a grid table
    #[default]
    Tabular,
    /// Header row plus quoted rows
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// Where a row is being rendered; tabular output decorates some values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Display,
    Plain,
}

/// A record that renders as one row of a report.
pub trait TableRow: Serialize {
    fn headers() -> &'static [&'static str];
    fn cells(&self, style: CellStyle) -> Vec<String>;
}

pub trait OutputWriter {
    fn write_rows<R: TableRow>(&mut self, title: &str, rows: &[R]) -> anyhow::Result<()>;
}

/// Render `rows` to `writer` in the requested format.
pub fn write_rows<W, R>(writer: W, format: OutputFormat, title: &str, rows: &[R]) -> anyhow::Result<()>
where
    W: Write,
    R: TableRow,
{
    match format {
        OutputFormat::Tabular => TabularWriter::new(writer).write_rows(title, rows),
        OutputFormat::Csv => CsvWriter::new(writer).write_rows(title, rows),
        OutputFormat::Json => JsonWriter::new(writer).write_rows(title, rows),
    }
}

pub struct TabularWriter<W: Write> {
    writer: W,
}

impl<W: Write> TabularWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TabularWriter<W> {
    fn write_rows<R: TableRow>(&mut self, title: &str, rows: &[R]) -> anyhow::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(presets::ASCII_FULL)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(R::headers().to_vec());

        for row in rows {
            table.add_row(row.cells(CellStyle::Display));
        }

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", title)?;
        writeln!(self.writer, "{}", table)?;
        Ok(())
    }
}

pub struct CsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> anyhow::Result<()> {
        let line = fields
            .iter()
            .map(|field| escape_csv_field(field.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for CsvWriter<W> {
    fn write_rows<R: TableRow>(&mut self, _title: &str, rows: &[R]) -> anyhow::Result<()> {
        self.write_record(R::headers())?;
        for row in rows {
            self.write_record(&row.cells(CellStyle::Plain))?;
        }
        Ok(())
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_rows<R: TableRow>(&mut self, _title: &str, rows: &[R]) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(rows)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }
}

fn two_decimals(value: f64) -> String {
    format!("{:.2}", value)
}

fn percent(value: f64, style: CellStyle) -> String {
    match style {
        CellStyle::Display => format!("{:.2}%", value),
        CellStyle::Plain => two_decimals(value),
    }
}

impl TableRow for ChurnRecord {
    fn headers() -> &'static [&'static str] {
        &["FILEPATH", "CHANGES", "ADDED", "DELETED", "COMMITS"]
    }

    fn cells(&self, _style: CellStyle) -> Vec<String> {
        vec![
            self.path.clone(),
            self.churn.to_string(),
            self.added.to_string(),
            self.removed.to_string(),
            self.commits.to_string(),
        ]
    }
}

impl TableRow for FileComplexity {
    fn headers() -> &'static [&'static str] {
        &["FILEPATH", "COMPLEXITY"]
    }

    fn cells(&self, _style: CellStyle) -> Vec<String> {
        vec![self.path.clone(), two_decimals(self.average)]
    }
}

impl TableRow for FileCoverage {
    fn headers() -> &'static [&'static str] {
        &["FILEPATH", "COVERAGE", "STATEMENTS", "COVERED"]
    }

    fn cells(&self, style: CellStyle) -> Vec<String> {
        vec![
            self.file.clone(),
            percent(self.coverage, style),
            self.statements.to_string(),
            self.covered.to_string(),
        ]
    }
}

impl TableRow for FileScore {
    fn headers() -> &'static [&'static str] {
        &["FILEPATH", "SCORE", "CHURN", "COMPLEXITY", "COVERAGE"]
    }

    fn cells(&self, style: CellStyle) -> Vec<String> {
        vec![
            self.file.clone(),
            two_decimals(self.score),
            two_decimals(self.churn),
            two_decimals(self.complexity),
            percent(self.coverage, style),
        ]
    }
}
