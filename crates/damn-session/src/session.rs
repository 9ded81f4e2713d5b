//! Session types: configuration, credentials, and the connection state.

use std::fmt;

use damn_protocol::{DEFAULT_MAX_FRAME_LEN, PROTOCOL_VERSION};
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Length of the authtoken the server expects.
pub const TOKEN_LEN: usize = 32;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Where to connect and how to introduce ourselves.
///
/// Every field has a default, so a partial config file deserializes into a
/// usable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sent as `agent=` in the handshake.
    pub agent: String,
    /// Version sent in the handshake and required back from the server.
    pub protocol_version: String,
    pub host: String,
    pub port: u16,
    /// Frames longer than this are discarded.
    pub max_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agent: concat!("damn-rs/", env!("CARGO_PKG_VERSION")).to_owned(),
            protocol_version: PROTOCOL_VERSION.to_owned(),
            host: "chat.deviantart.com".to_owned(),
            port: 3900,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Username plus the authtoken sent as `pk=` at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    /// # Errors
    /// [`SessionError::MissingCredentials`] if either part is empty.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Result<Self, SessionError> {
        let username = username.into();
        let token = token.into();
        if username.is_empty() || token.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        if token.len() != TOKEN_LEN {
            tracing::warn!(user = %username, len = token.len(), "authtoken has unexpected length");
        }
        Ok(Self { username, token })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Keeps the token out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Connection lifecycle.
///
/// ```text
///   Offline ──connect_to_host──→ Connecting ──on_connected──→ Connected
///      ↑                                                          │
///      │                                              (handshake sent)
///      │                                                          ▼
///      └──────────(disconnect / login failure)──── Online ←── LoggingIn
/// ```
///
/// Any disconnect returns to `Offline` from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Offline,
    Connecting,
    Connected,
    LoggingIn,
    Online,
}

impl SessionState {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// Whether a socket is (or is about to be) open.
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Offline | Self::Connecting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offline => "offline",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::LoggingIn => "logging in",
            Self::Online => "online",
        })
    }
}
