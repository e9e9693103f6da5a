//! Presentation of command outcomes.
//!
//! Messages are written verbatim. Structured data becomes pretty-printed
//! JSON or, for humans, a table whose columns come from the first row.

mod fields;

use std::io::{self, Write};

use fractal_config::ResolvedOutputFormat;
use fractal_dispatch::Outcome;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

pub use fields::{
    Cell, KEYS_TO_EXCLUDE, Style, format_cell, is_excluded, pretty_bytes, render_health,
};

const COLUMN_GAP: &str = "  ";

/// Errors raised while presenting an outcome.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A `health` field held something other than green, yellow or red.
    #[error("Got unsupported health color when rendering health: {status}")]
    UnsupportedHealth {
        /// Offending value.
        status: String,
    },
    /// A `links` field lacked `default.domain`.
    #[error("Failed to pretty print link domain: {value}")]
    LinkDomain {
        /// Offending value, as JSON.
        value: String,
    },
    /// JSON encoding failed.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
}

/// How structured outcomes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    /// Table or JSON.
    pub format: ResolvedOutputFormat,
    /// Whether ANSI styling may be used.
    pub colour: bool,
}

/// Writes `outcome` to `out`.
///
/// # Errors
///
/// Returns a [`RenderError`] when the data cannot be formatted or written.
pub fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &Outcome,
    presentation: Presentation,
) -> Result<(), RenderError> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Message(text) => Ok(writeln!(out, "{text}")?),
        Outcome::Data(value) => match presentation.format {
            ResolvedOutputFormat::Json => write_json(out, value),
            ResolvedOutputFormat::Human => {
                let text = render_human(value, presentation.colour)?;
                Ok(out.write_all(text.as_bytes())?)
            }
        },
    }
}

/// Writes `value` as JSON indented by four spaces, followed by a newline.
///
/// # Errors
///
/// Returns a [`RenderError`] when encoding or writing fails.
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> Result<(), RenderError> {
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut *out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(writeln!(out)?)
}

/// Renders `value` for a terminal.
///
/// Objects and lists of objects become tables, strings are shown as they
/// are, and anything else falls back to JSON.
///
/// # Errors
///
/// Returns a [`RenderError`] when a field cannot be formatted.
pub fn render_human(value: &Value, colour: bool) -> Result<String, RenderError> {
    match value {
        Value::Object(row) => render_table(&[row], colour),
        Value::Array(items) => {
            let rows: Option<Vec<&Map<String, Value>>> =
                items.iter().map(Value::as_object).collect();
            match rows {
                Some(objects) => render_table(&objects, colour),
                None => pretty(value),
            }
        }
        Value::String(text) => Ok(format!("{text}\n")),
        _ => pretty(value),
    }
}

/// Lays `rows` out as a table.
///
/// # Errors
///
/// Returns a [`RenderError`] when a field cannot be formatted.
pub fn render_table(rows: &[&Map<String, Value>], colour: bool) -> Result<String, RenderError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let columns: Vec<&str> = first
        .keys()
        .map(String::as_str)
        .filter(|key| !is_excluded(key))
        .collect();
    let body = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| format_cell(column, row.get(*column).unwrap_or(&Value::Null)))
                .collect::<Result<Vec<Cell>, RenderError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut widths: Vec<usize> = columns.iter().map(|column| column.width()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.text.width());
        }
    }

    let mut table = String::new();
    let header: Vec<Cell> = columns
        .iter()
        .map(|column| Cell {
            text: (*column).to_owned(),
            style: None,
        })
        .collect();
    push_line(&mut table, &header, &widths, false);
    let rule: Vec<Cell> = widths
        .iter()
        .map(|width| Cell {
            text: "-".repeat(*width),
            style: None,
        })
        .collect();
    push_line(&mut table, &rule, &widths, false);
    for row in &body {
        push_line(&mut table, row, &widths, colour);
    }
    Ok(table)
}

fn push_line(table: &mut String, cells: &[Cell], widths: &[usize], colour: bool) {
    let mut line = String::new();
    for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            line.push_str(COLUMN_GAP);
        }
        let padding = width.saturating_sub(cell.text.width());
        match cell.style.filter(|_| colour) {
            Some(style) => line.push_str(&style.paint(&cell.text)),
            None => line.push_str(&cell.text),
        }
        line.push_str(&" ".repeat(padding));
    }
    table.push_str(line.trim_end_matches(' '));
    table.push('\n');
}

fn pretty(value: &Value) -> Result<String, RenderError> {
    let mut buffer = Vec::new();
    write_json(&mut buffer, value)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
