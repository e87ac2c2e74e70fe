//! Report rendering.
//!
//! Report builders assemble a [`Document`] from data that has already been
//! extracted and aggregated; the document is then rendered to plain text,
//! markdown or HTML. CSV exports bypass the document and are written by each
//! report family directly.

pub mod comparison;
pub mod opcodes;
pub mod tables;

use crate::error::Result;
use crate::OutputFormat;
use std::fmt::Write as _;

const TEXT_RULE_WIDTH: usize = 80;
const ELLIPSIS: &str = "...";

/// Column alignment in text and markdown output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub align: Vec<Align>,
    pub rows: Vec<Vec<String>>,
    /// Per-column display width cap; cells beyond it are shortened with `...`.
    pub max_width: Vec<Option<usize>>,
}

impl Table {
    /// First column left-aligned, the rest right-aligned.
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let align = (0..headers.len())
            .map(|i| if i == 0 { Align::Left } else { Align::Right })
            .collect();
        let max_width = vec![None; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
            max_width,
        }
    }

    pub fn align(mut self, column: usize, align: Align) -> Self {
        if let Some(slot) = self.align.get_mut(column) {
            *slot = align;
        }
        self
    }

    pub fn truncate_column(mut self, column: usize, width: usize) -> Self {
        if let Some(slot) = self.max_width.get_mut(column) {
            *slot = Some(width);
        }
        self
    }

    pub fn push<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn cell(&self, row: &[String], column: usize) -> String {
        let raw = row.get(column).map(String::as_str).unwrap_or("");
        match self.max_width.get(column).copied().flatten() {
            Some(width) => truncate(raw, width),
            None => raw.to_string(),
        }
    }

    fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| (0..self.headers.len()).map(|c| self.cell(row, c)).collect())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Heading(u8, String),
    Paragraph(String),
    /// `label: value` lines; the label is emphasised where the format allows.
    Fields(Vec<(String, String)>),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
    Table(Table),
    Rule,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading(level, text.into()));
        self
    }

    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn fields<K: Into<String>, V: Into<String>>(
        &mut self,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.blocks.push(Block::Fields(fields));
        self
    }

    pub fn bullets(&mut self, items: Vec<String>) -> &mut Self {
        self.blocks.push(Block::Bullets(items));
        self
    }

    pub fn numbered(&mut self, items: Vec<String>) -> &mut Self {
        self.blocks.push(Block::Numbered(items));
        self
    }

    pub fn table(&mut self, table: Table) -> &mut Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn rule(&mut self) -> &mut Self {
        self.blocks.push(Block::Rule);
        self
    }

    /// CSV is not a document format; callers use their family's exporter.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Markdown | OutputFormat::Csv => self.to_markdown(),
            OutputFormat::Html => self.to_html(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.title);
        for block in &self.blocks {
            match block {
                Block::Heading(level, text) => {
                    let hashes = "#".repeat(usize::from((*level).clamp(2, 6)));
                    let _ = writeln!(out, "{hashes} {text}\n");
                }
                Block::Paragraph(text) => {
                    let _ = writeln!(out, "{text}\n");
                }
                Block::Fields(fields) => {
                    for (label, value) in fields {
                        let _ = writeln!(out, "- **{label}:** {value}");
                    }
                    out.push('\n');
                }
                Block::Bullets(items) => {
                    for item in items {
                        let _ = writeln!(out, "- {item}");
                    }
                    out.push('\n');
                }
                Block::Numbered(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let _ = writeln!(out, "{}. {item}", i + 1);
                    }
                    out.push('\n');
                }
                Block::Table(table) => {
                    markdown_table(&mut out, table);
                    out.push('\n');
                }
                Block::Rule => out.push_str("---\n\n"),
            }
        }
        out
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let bar = "=".repeat(TEXT_RULE_WIDTH);
        let _ = writeln!(out, "{bar}\n{}\n{bar}", self.title.to_uppercase());
        for block in &self.blocks {
            match block {
                Block::Heading(level, text) if *level <= 2 => {
                    let _ = writeln!(out, "\n{bar}\n{}\n{bar}", text.to_uppercase());
                }
                Block::Heading(_, text) => {
                    let _ = writeln!(out, "\n{text}\n{}", "-".repeat(text.chars().count()));
                }
                Block::Paragraph(text) => {
                    let _ = writeln!(out, "\n{text}");
                }
                Block::Fields(fields) => {
                    out.push('\n');
                    for (label, value) in fields {
                        let _ = writeln!(out, "{label}: {value}");
                    }
                }
                Block::Bullets(items) => {
                    out.push('\n');
                    for item in items {
                        let _ = writeln!(out, "  - {item}");
                    }
                }
                Block::Numbered(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let _ = writeln!(out, "\n{}. {item}", i + 1);
                    }
                }
                Block::Table(table) => {
                    out.push('\n');
                    text_table(&mut out, table);
                }
                Block::Rule => {
                    let _ = writeln!(out, "\n{}", "-".repeat(TEXT_RULE_WIDTH));
                }
            }
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let title = escape_html(&self.title);
        let _ = writeln!(
            out,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>"
        );
        for block in &self.blocks {
            match block {
                Block::Heading(level, text) => {
                    let level = (*level).clamp(2, 6);
                    let _ = writeln!(out, "<h{level}>{}</h{level}>", escape_html(text));
                }
                Block::Paragraph(text) => {
                    let _ = writeln!(out, "<p>{}</p>", escape_html(text));
                }
                Block::Fields(fields) => {
                    out.push_str("<ul>\n");
                    for (label, value) in fields {
                        let _ = writeln!(
                            out,
                            "<li><strong>{}:</strong> {}</li>",
                            escape_html(label),
                            escape_html(value)
                        );
                    }
                    out.push_str("</ul>\n");
                }
                Block::Bullets(items) => html_list(&mut out, "ul", items),
                Block::Numbered(items) => html_list(&mut out, "ol", items),
                Block::Table(table) => html_table(&mut out, table),
                Block::Rule => out.push_str("<hr>\n"),
            }
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

fn markdown_table(out: &mut String, table: &Table) {
    let _ = writeln!(out, "| {} |", table.headers.join(" | "));
    let separator: Vec<&str> = table
        .align
        .iter()
        .map(|a| match a {
            Align::Left => "---",
            Align::Right => "---:",
        })
        .collect();
    let _ = writeln!(out, "|{}|", separator.join("|"));
    for row in table.display_rows() {
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
}

fn text_table(out: &mut String, table: &Table) {
    let rows = table.display_rows();
    let widths: Vec<usize> = (0..table.headers.len())
        .map(|c| {
            rows.iter()
                .map(|r| r[c].chars().count())
                .chain(std::iter::once(table.headers[c].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String], out: &mut String| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(c, cell)| match table.align[c] {
                Align::Left => format!("{cell:<w$}", w = widths[c]),
                Align::Right => format!("{cell:>w$}", w = widths[c]),
            })
            .collect();
        let _ = writeln!(out, "{}", padded.join("   ").trim_end());
    };

    line(&table.headers, out);
    let total = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(total));
    for row in &rows {
        line(row, out);
    }
}

fn html_list(out: &mut String, tag: &str, items: &[String]) {
    let _ = writeln!(out, "<{tag}>");
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", escape_html(item));
    }
    let _ = writeln!(out, "</{tag}>");
}

fn html_table(out: &mut String, table: &Table) {
    out.push_str("<table>\n<thead>\n<tr>");
    for header in &table.headers {
        let _ = write!(out, "<th>{}</th>", escape_html(header));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in table.display_rows() {
        out.push_str("<tr>");
        for (c, cell) in row.iter().enumerate() {
            let style = match table.align[c] {
                Align::Left => "",
                Align::Right => " style=\"text-align:right\"",
            };
            let _ = write!(out, "<td{style}>{}</td>", escape_html(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Shortens `s` to at most `width` characters, ending in `...` when cut.
/// Only ever applied to display text, never to lookup keys.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// `1234567.891, 1` -> `1,234,567.9`
pub fn thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn thousands_u64(value: u64) -> String {
    thousands(value as f64, 0)
}

/// `x` suffixed ratio, or a marker for an undefined one.
pub(crate) fn ratio_cell(ratio: crate::compare::Ratio, decimals: usize) -> String {
    match ratio {
        Ok(v) => format!("{v:.decimals$}x"),
        Err(_) => INCOMPARABLE.to_string(),
    }
}

pub(crate) const INCOMPARABLE: &str = "incomparable";
pub(crate) const NOT_AVAILABLE: &str = "N/A";

/// Renders rows through a `csv::Writer` into a string.
pub(crate) fn csv_string(
    write_rows: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
) -> Result<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    write_rows(&mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new("Results");
        let mut table = Table::new(["Benchmark", "Cycles"]).truncate_column(0, 10);
        table.push(["a_very_long_benchmark_name", "1,000"]);
        table.push(["short", "5"]);
        doc.heading(2, "Execution")
            .fields([("Files", "2")])
            .table(table)
            .rule()
            .bullets(vec!["<b>".to_string()]);
        doc
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate("abcdefghijk", 10), "abcdefg...");
        assert_eq!(truncate(&"x".repeat(60), 47).len(), 47);
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(1_234_567.891, 1), "1,234,567.9");
        assert_eq!(thousands(999.0, 0), "999");
        assert_eq!(thousands(-1234.5, 2), "-1,234.50");
        assert_eq!(thousands(-0.001, 1), "0.0");
        assert_eq!(thousands_u64(1_000_000), "1,000,000");
    }

    #[test]
    fn markdown_table_shape() {
        let md = sample().to_markdown();
        assert!(md.starts_with("# Results\n\n## Execution\n"));
        assert!(md.contains("- **Files:** 2\n"));
        assert!(md.contains("| Benchmark | Cycles |\n|---|---:|\n"));
        assert!(md.contains("| a_very_... | 1,000 |\n"));
        assert!(md.contains("---\n\n- <b>\n"));
    }

    #[test]
    fn text_table_is_aligned() {
        let text = sample().to_text();
        assert!(text.starts_with(&format!("{}\nRESULTS\n", "=".repeat(80))));
        assert!(text.contains("Benchmark    Cycles\n"));
        assert!(text.contains("a_very_...    1,000\n"));
        assert!(text.contains("short             5\n"));
    }

    #[test]
    fn html_escapes_content() {
        let html = sample().to_html();
        assert!(html.contains("<h2>Execution</h2>"));
        assert!(html.contains("<li>&lt;b&gt;</li>"));
        assert!(html.contains("<td style=\"text-align:right\">1,000</td>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn csv_string_writes_rows() {
        let out = csv_string(|w| {
            w.write_record(["a", "b"])?;
            w.write_record(["1", "x,y"])
        })
        .unwrap();
        assert_eq!(out, "a,b\n1,\"x,y\"\n");
    }
}
