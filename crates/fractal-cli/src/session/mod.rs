//! Matrix credentials cached between invocations.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{DataFormat, StoreError, UserDataStore};

/// File holding the cached credentials.
pub const CREDENTIALS_FILE: &str = "matrix.creds.yaml";

/// Access token and homeserver of the logged-in user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for the homeserver.
    pub access_token: String,
    /// Base URL of the homeserver.
    pub homeserver_url: String,
    /// Fully qualified Matrix ID, e.g. `@alice:example.org`.
    pub matrix_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("homeserver_url", &self.homeserver_url)
            .field("matrix_id", &self.matrix_id)
            .finish()
    }
}

/// Credential field selectable by `auth show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    /// The bearer token.
    AccessToken,
    /// The homeserver base URL.
    HomeserverUrl,
    /// The Matrix ID.
    MatrixId,
}

impl CredentialKey {
    /// Parses the snake-case key name used on the command line.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "access_token" => Some(Self::AccessToken),
            "homeserver_url" => Some(Self::HomeserverUrl),
            "matrix_id" => Some(Self::MatrixId),
            _ => None,
        }
    }
}

impl Credentials {
    /// Bundles freshly obtained credentials.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        homeserver_url: impl Into<String>,
        matrix_id: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            homeserver_url: homeserver_url.into(),
            matrix_id: matrix_id.into(),
        }
    }

    /// Loads the cached credentials.
    ///
    /// A missing, unreadable or incomplete file means nobody is logged in;
    /// anything other than a missing file is logged before returning `None`.
    #[must_use]
    pub fn load(store: &UserDataStore) -> Option<Self> {
        match store.read::<Self>(CREDENTIALS_FILE) {
            Ok((credentials, _)) => Some(credentials),
            Err(StoreError::NotFound { .. }) => None,
            Err(error) => {
                warn!(%error, "ignoring unusable credentials file");
                None
            }
        }
    }

    /// Writes the credentials to the store.
    ///
    /// # Errors
    ///
    /// Propagates the [`StoreError`] raised by the write.
    pub fn save(&self, store: &UserDataStore) -> Result<Utf8PathBuf, StoreError> {
        store.write(self, CREDENTIALS_FILE, DataFormat::Yaml)
    }

    /// Deletes the cached credentials, returning whether a file existed.
    ///
    /// # Errors
    ///
    /// Propagates filesystem failures from the store.
    pub fn forget(store: &UserDataStore) -> Result<bool, StoreError> {
        store.remove(CREDENTIALS_FILE)
    }

    /// Value of one credential field.
    #[must_use]
    pub fn get(&self, key: CredentialKey) -> &str {
        match key {
            CredentialKey::AccessToken => &self.access_token,
            CredentialKey::HomeserverUrl => &self.homeserver_url,
            CredentialKey::MatrixId => &self.matrix_id,
        }
    }
}
