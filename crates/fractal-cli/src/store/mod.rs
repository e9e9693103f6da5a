//! Files persisted in the per-user data directory.
//!
//! Each file holds one serialised mapping. YAML is the default encoding;
//! files ending in `.json` are read and written as JSON.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Encoding used when writing a data file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataFormat {
    /// YAML mapping.
    #[default]
    Yaml,
    /// Single-line JSON object.
    Json,
}

impl DataFormat {
    fn for_file(name: &str) -> Self {
        if Utf8Path::new(name).extension() == Some("json") {
            Self::Json
        } else {
            Self::Yaml
        }
    }
}

/// Errors raised while reading or writing user data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested file does not exist.
    #[error("no user data at '{path}'")]
    NotFound {
        /// Location that was read.
        path: Utf8PathBuf,
    },
    /// The file exists but is not a mapping of the expected shape.
    #[error("user data at '{path}' is malformed: {message}")]
    Malformed {
        /// Location that was read.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// The data could not be encoded.
    #[error("failed to encode user data for '{path}': {message}")]
    Encode {
        /// Destination of the write.
        path: Utf8PathBuf,
        /// Encoder diagnostic.
        message: String,
    },
    /// Filesystem failure.
    #[error("failed to access user data at '{path}': {source}")]
    Io {
        /// Location being accessed.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Reads and writes named files beneath a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataStore {
    root: Utf8PathBuf,
}

impl UserDataStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first write.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the data files.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Location of the file called `name`.
    #[must_use]
    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Serialises `data` into the file called `name` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory or file cannot be
    /// written and [`StoreError::Encode`] when serialisation fails.
    pub fn write<T>(
        &self,
        data: &T,
        name: &str,
        format: DataFormat,
    ) -> Result<Utf8PathBuf, StoreError>
    where
        T: Serialize,
    {
        let path = self.path(name);
        let encoded = encode(data, format).map_err(|message| StoreError::Encode {
            path: path.clone(),
            message,
        })?;
        self.prepare_root()?;
        let io_error = |source: io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path).map_err(io_error)?;
        restrict_permissions(&file).map_err(io_error)?;
        file.write_all(encoded.as_bytes()).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        Ok(path)
    }

    /// Reads the file called `name`, returning its contents and path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the file is absent and
    /// [`StoreError::Malformed`] when it does not decode into `T`.
    pub fn read<T>(&self, name: &str) -> Result<(T, Utf8PathBuf), StoreError>
    where
        T: DeserializeOwned,
    {
        let path = self.path(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let decoded = match DataFormat::for_file(name) {
            DataFormat::Json => serde_json::from_str(&text).map_err(|error| error.to_string()),
            DataFormat::Yaml => serde_saphyr::from_str(&text).map_err(|error| error.to_string()),
        };
        match decoded {
            Ok(data) => Ok((data, path)),
            Err(message) => Err(StoreError::Malformed { path, message }),
        }
    }

    /// Deletes the file called `name`. Returns `false` when it was absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for failures other than a missing file.
    pub fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn prepare_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }
}

fn encode<T>(data: &T, format: DataFormat) -> Result<String, String>
where
    T: Serialize,
{
    match format {
        DataFormat::Yaml => serde_saphyr::to_string(data).map_err(|error| error.to_string()),
        DataFormat::Json => serde_json::to_string(data).map_err(|error| error.to_string()),
    }
}

// Owner read/write only. Files created by `write` already carry this mode;
// an existing file keeps its old mode until reset here.
#[cfg(unix)]
fn restrict_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
const fn restrict_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}
