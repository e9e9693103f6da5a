//! Rendering selection for structured command results.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format selection for structured command results.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Deserialize,
    Serialize,
    EnumString,
    Display,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render tables.
    Human,
    /// Always emit JSON.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// Tables and plain text.
    Human,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto => {
                if stdout_is_terminal {
                    ResolvedOutputFormat::Human
                } else {
                    ResolvedOutputFormat::Json
                }
            }
            Self::Human => ResolvedOutputFormat::Human,
            Self::Json => ResolvedOutputFormat::Json,
        }
    }
}
