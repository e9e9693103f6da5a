//! Per-field formatting for table cells.

use serde_json::Value;

use super::RenderError;

/// Bookkeeping keys never shown as table columns.
pub const KEYS_TO_EXCLUDE: &[&str] = &[
    "deleted",
    "date_created",
    "date_modified",
    "owner",
    "last_seen_timestamp",
    "last_state_change_timestamp",
    "reschedule_to_device",
    "config",
    "current_state",
    "image",
    "icon",
    "app",
    "device",
    "locked",
    "geometry",
    "pinned",
];

const BINARY_UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Terminal styling applied to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Bold green.
    Green,
    /// Bold yellow.
    Yellow,
    /// Bold blinking red.
    Red,
}

impl Style {
    const fn escape(self) -> &'static str {
        match self {
            Self::Green => "\u{1b}[1;32m",
            Self::Yellow => "\u{1b}[1;33m",
            Self::Red => "\u{1b}[1;5;31m",
        }
    }

    /// Wraps `text` in this style's escape sequences.
    #[must_use]
    pub fn paint(self, text: &str) -> String {
        format!("{}{text}\u{1b}[0m", self.escape())
    }
}

/// One formatted table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Visible text.
    pub text: String,
    /// Styling applied on colour terminals.
    pub style: Option<Style>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }
}

/// Whether `key` is hidden from tables.
#[must_use]
pub fn is_excluded(key: &str) -> bool {
    KEYS_TO_EXCLUDE.contains(&key)
}

/// Formats the value of `key` for display.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedHealth`] for unknown health colours
/// and [`RenderError::LinkDomain`] for link objects without a default domain.
pub fn format_cell(key: &str, value: &Value) -> Result<Cell, RenderError> {
    match key {
        "links" => link_domain(value).map(Cell::plain),
        "health" => render_health(&plain_text(value)),
        "size" => Ok(Cell::plain(
            byte_count(value).map_or_else(|| plain_text(value), pretty_bytes),
        )),
        _ => Ok(Cell::plain(plain_text(value))),
    }
}

/// Colours a health status.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedHealth`] unless `status` is `green`,
/// `yellow` or `red`.
pub fn render_health(status: &str) -> Result<Cell, RenderError> {
    let style = match status {
        "green" => Style::Green,
        "yellow" => Style::Yellow,
        "red" => Style::Red,
        _ => {
            return Err(RenderError::UnsupportedHealth {
                status: status.to_owned(),
            });
        }
    };
    Ok(Cell {
        text: status.to_owned(),
        style: Some(style),
    })
}

/// Formats a byte count with binary units and one decimal, e.g. `1.5 KiB`.
#[must_use]
pub fn pretty_bytes(bytes: u64) -> String {
    let value = u128::from(bytes);
    let (unit, shift) = BINARY_UNITS
        .iter()
        .zip((0_u32..).step_by(10))
        .find(|(_, bits)| value >> bits < 1024)
        .unwrap_or((&"Yi", 80));
    let scaled = value * 10;
    let tenths = if shift == 0 {
        scaled
    } else {
        (scaled + (1 << (shift - 1))) >> shift
    };
    format!(
        "{}.{} {unit}B",
        tenths.div_euclid(10),
        tenths.rem_euclid(10)
    )
}

fn link_domain(value: &Value) -> Result<String, RenderError> {
    value
        .pointer("/default/domain")
        .map(plain_text)
        .map(|domain| format!("https://{domain}"))
        .ok_or_else(|| RenderError::LinkDomain {
            value: value.to_string(),
        })
}

fn byte_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
