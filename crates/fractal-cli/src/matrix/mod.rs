//! Matrix homeserver access used by the shipped controllers.
//!
//! [`Homeserver`] is the seam between the controllers and the network. The
//! production implementation, [`HttpHomeserver`], speaks the client-server
//! API and the Synapse admin API over `reqwest`; tests substitute a mock.

mod http;

use std::io;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

pub use http::HttpHomeserver;

/// Errors raised while talking to a homeserver.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// The text is not of the form `@local:server`.
    #[error("invalid Matrix ID '{value}': expected @user:server")]
    InvalidMatrixId {
        /// Rejected input.
        value: String,
    },
    /// The homeserver URL could not be used to build a request.
    #[error("invalid homeserver URL '{url}'")]
    InvalidUrl {
        /// Rejected input.
        url: String,
    },
    /// The homeserver answered with an error response.
    #[error("{message} ({errcode}, HTTP {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Matrix error code such as `M_FORBIDDEN`.
        errcode: String,
        /// Human-readable explanation from the server.
        message: String,
    },
    /// Registration did not complete within the supported auth stages.
    #[error("registration was not completed: {message}")]
    Registration {
        /// What the server still required.
        message: String,
    },
    /// The request never produced a usable response.
    #[error("request to homeserver failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The async runtime backing the client could not be started.
    #[error("failed to start the HTTP runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// A parsed `@local:server` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixId<'a> {
    local: &'a str,
    server: &'a str,
}

impl<'a> MatrixId<'a> {
    /// Splits `value` into its local part and server name.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidMatrixId`] unless `value` starts with
    /// `@` and has non-empty parts on both sides of the first `:`.
    pub fn parse(value: &'a str) -> Result<Self, MatrixError> {
        value
            .strip_prefix('@')
            .and_then(|rest| rest.split_once(':'))
            .filter(|(local, server)| !local.is_empty() && !server.is_empty())
            .map(|(local, server)| Self { local, server })
            .ok_or_else(|| MatrixError::InvalidMatrixId {
                value: value.to_owned(),
            })
    }

    /// Local part, without the leading `@`.
    #[must_use]
    pub const fn local(&self) -> &'a str {
        self.local
    }

    /// Server name, possibly with a port.
    #[must_use]
    pub const fn server(&self) -> &'a str {
        self.server
    }
}

/// Where a server name's client API lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Base URL of the client-server API.
    pub homeserver_url: String,
    /// Whether the delegated host lies outside the server name's domain.
    pub apex_changed: bool,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginSession {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Matrix ID the server logged in.
    pub user_id: String,
}

/// A registration token as reported by the Synapse admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationToken {
    /// The token text.
    pub token: String,
    /// Remaining permitted uses, or unlimited.
    #[serde(default)]
    pub uses_allowed: Option<u64>,
    /// Registrations in progress with this token.
    #[serde(default)]
    pub pending: u64,
    /// Registrations completed with this token.
    #[serde(default)]
    pub completed: u64,
    /// Expiry in milliseconds since the epoch, if any.
    #[serde(default)]
    pub expiry_time: Option<i64>,
}

/// Operations the controllers need from a homeserver.
pub trait Homeserver {
    /// Resolves the client API for `server_name` via `.well-known`.
    fn discover(&self, server_name: &str) -> Result<Discovery, MatrixError>;

    /// Logs `user` in with a password.
    fn login(
        &self,
        homeserver_url: &str,
        user: &str,
        password: &str,
    ) -> Result<LoginSession, MatrixError>;

    /// Returns the Matrix ID owning `access_token`.
    fn whoami(&self, homeserver_url: &str, access_token: &str) -> Result<String, MatrixError>;

    /// Invalidates `access_token`.
    fn logout(&self, homeserver_url: &str, access_token: &str) -> Result<(), MatrixError>;

    /// Registers `username` using a registration token and returns the new
    /// access token.
    fn register(
        &self,
        homeserver_url: &str,
        username: &str,
        password: &str,
        registration_token: &str,
    ) -> Result<String, MatrixError>;

    /// Creates a new registration token (admin only).
    fn create_registration_token(
        &self,
        homeserver_url: &str,
        access_token: &str,
    ) -> Result<String, MatrixError>;

    /// Lists registration tokens (admin only).
    fn list_registration_tokens(
        &self,
        homeserver_url: &str,
        access_token: &str,
    ) -> Result<Vec<RegistrationToken>, MatrixError>;

    /// Lifts message rate limits for `user_id` (admin only).
    fn override_ratelimit(
        &self,
        homeserver_url: &str,
        access_token: &str,
        user_id: &str,
    ) -> Result<(), MatrixError>;
}

/// Returns `true` when `homeserver_url` is hosted outside `server_name`.
///
/// The server name itself and any of its subdomains count as inside.
#[must_use]
pub fn leaves_apex(server_name: &str, homeserver_url: &str) -> bool {
    let apex = server_name
        .rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map_or(server_name, |(host, _)| host);
    let Some(host) = Url::parse(homeserver_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
    else {
        return true;
    };
    let apex_lower = apex.to_ascii_lowercase();
    host != apex_lower && !host.ends_with(&format!(".{apex_lower}"))
}

/// Login name and password used on a homeserver whose apex changed.
///
/// The name gains the first four hex digits of `sha256(local + url)` and
/// the password becomes the hex digest of `sha256(password + url)`.
#[must_use]
pub fn salted_login(local: &str, password: &str, homeserver_url: &str) -> (String, String) {
    let suffix: String = sha256_hex(&format!("{local}{homeserver_url}"))
        .chars()
        .take(4)
        .collect();
    (
        format!("{local}-{suffix}"),
        sha256_hex(&format!("{password}{homeserver_url}")),
    )
}

fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest
        .iter()
        .fold(String::with_capacity(64), |mut hex, byte| {
            hex.push_str(&format!("{byte:02x}"));
            hex
        })
}
