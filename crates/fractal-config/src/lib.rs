//! Shared configuration for the Fractal command-line tool.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file (`--config-path` or `FRACTAL_CONFIG_PATH`), then
//! `FRACTAL_*` environment variables, then command-line flags.

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod output;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_METHOD, default_data_dir, default_log_filter,
    default_log_filter_string, default_log_format, default_method_string,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use output::{OutputFormat, ResolvedOutputFormat};

/// Command-line flags understood by the configuration loader.
///
/// The runner strips these from the front of the argument vector before the
/// dispatcher builds its parser. Keep in sync with the fields of [`Config`].
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--output",
    "--data-dir",
    "--default-controller",
    "--default-method",
];

/// Resolved configuration for one invocation of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FRACTAL")]
pub struct Config {
    /// Tracing filter expression, e.g. `warn` or `fractal_dispatch=debug`.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log line format written to stderr.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// How structured command results are rendered.
    #[ortho_config(default = OutputFormat::default())]
    #[serde(default)]
    pub output: OutputFormat,
    /// Directory holding persisted user data such as cached credentials.
    #[ortho_config(default = default_data_dir())]
    #[serde(default = "default_data_dir")]
    pub data_dir: Utf8PathBuf,
    /// Controller invoked when no command is given.
    #[serde(default)]
    pub default_controller: Option<String>,
    /// Method of the default controller to invoke.
    #[ortho_config(default = default_method_string())]
    #[serde(default = "default_method_string")]
    pub default_method: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            output: OutputFormat::default(),
            data_dir: default_data_dir(),
            default_controller: None,
            default_method: default_method_string(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log line format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Requested rendering for structured results.
    #[must_use]
    pub const fn output(&self) -> OutputFormat {
        self.output
    }

    /// Directory holding persisted user data.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        self.data_dir.as_path()
    }

    /// Returns the `(controller, method)` pair used when no command is
    /// given, if a default controller is configured.
    #[must_use]
    pub fn default_target(&self) -> Option<(&str, &str)> {
        self.default_controller
            .as_deref()
            .map(str::trim)
            .filter(|controller| !controller.is_empty())
            .map(|controller| (controller, self.default_method.as_str()))
    }
}
