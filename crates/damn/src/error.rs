//! Unified error type for the dAmn client.

use damn_protocol::ProtocolError;
use damn_room::RoomError;
use damn_session::SessionError;
use damn_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `damn` meta-crate, you deal with this single error type
/// instead of importing errors from each sub-crate.
#[derive(Debug, thiserror::Error)]
pub enum DamnError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (bad identifier, undecodable packet).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (not online, bad state, credentials).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-model error.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The driver task has stopped; the connection is gone.
    #[error("client is closed")]
    ClientClosed,
}
