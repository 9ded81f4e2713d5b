//! Client configuration.

use std::time::Duration;

use damn_session::SessionConfig;
use damn_transport::DEFAULT_READ_BUFFER_SIZE;
use serde::{Deserialize, Serialize};

/// Everything the client driver needs besides credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,
    /// Close the connection when nothing arrives for this long.
    ///
    /// The server pings idle clients, so a silent socket usually means a
    /// dead one. `None` disables the watchdog.
    pub idle_timeout: Option<Duration>,
    /// Bytes requested from the socket per read.
    pub read_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            idle_timeout: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}
