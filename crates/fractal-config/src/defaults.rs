use std::env;

use camino::Utf8PathBuf;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Method invoked on the default controller when none is configured.
pub const DEFAULT_METHOD: &str = "run";

const APPLICATION_DIR: &str = "fractal";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned default method name used by serde.
#[must_use]
pub fn default_method_string() -> String {
    DEFAULT_METHOD.to_owned()
}

/// Computes the per-user data directory, e.g. `~/.local/share/fractal`.
///
/// Falls back to a directory under the system temporary directory when the
/// platform does not report a data directory or it is not valid UTF-8.
#[must_use]
pub fn default_data_dir() -> Utf8PathBuf {
    let mut base = dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push(APPLICATION_DIR);
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
