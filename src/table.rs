//! Tab-delimited text to Markdown table conversion.
//!
//! Every input line becomes one table row; a `---` separator row sized
//! to the first row is inserted after it.
//!
//! ```text
//! a\tb\tc          | a | b | c |
//! 1\t2\t3    ->    | --- | --- | --- |
//!                  | 1 | 2 | 3 |
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Table conversion errors
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read input file '{}': {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Failed to write output file '{}': {}", .0.display(), .1)]
    Write(PathBuf, #[source] std::io::Error),
}

/// Shape of a converted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSummary {
    /// Data rows, header included, separator excluded.
    pub rows: usize,
    /// Cell count of the header row.
    pub columns: usize,
}

/// Render tab-delimited `input` as a Markdown table.
///
/// Lines are trimmed before splitting, rows keep whatever cell count
/// they have, and the result has no trailing newline.
pub fn to_markdown(input: &str) -> String {
    render(input).0
}

fn render(input: &str) -> (String, TableSummary) {
    let rows: Vec<Vec<&str>> = input
        .lines()
        .map(|line| line.trim().split('\t').collect())
        .collect();

    let Some(header) = rows.first() else {
        return (String::new(), TableSummary::default());
    };

    let summary = TableSummary {
        rows: rows.len(),
        columns: header.len(),
    };

    let mut lines: Vec<String> = rows.iter().map(|cells| format_row(cells)).collect();
    lines.insert(1, format!("{}|", "| --- ".repeat(summary.columns)));

    (lines.join("\n"), summary)
}

fn format_row(cells: &[&str]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Convert the file at `input` and write the table to `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<TableSummary, TableError> {
    let contents =
        std::fs::read_to_string(input).map_err(|e| TableError::Read(input.to_path_buf(), e))?;
    debug!(input = %input.display(), bytes = contents.len(), "Read input");

    let (markdown, summary) = render(&contents);

    std::fs::write(output, markdown).map_err(|e| TableError::Write(output.to_path_buf(), e))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows = summary.rows,
        columns = summary.columns,
        "Wrote Markdown table"
    );

    Ok(summary)
}
