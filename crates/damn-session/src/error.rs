//! Error types for the session layer.

use damn_protocol::ProtocolError;

use crate::SessionState;

/// Errors returned to callers of session operations.
///
/// Server-side failures never show up here: those arrive as error events
/// in the session's output.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation is not valid in the current connection state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// A chatroom or user operation was issued before login completed.
    #[error("not logged in")]
    NotOnline,

    /// The operation targets a chatroom this session has not joined.
    #[error("not joined to {0}")]
    NotJoined(String),

    /// Username or token is empty.
    #[error("username and token are required")]
    MissingCredentials,

    /// The credential provider could not produce a token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A caller-supplied identifier failed to parse.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
