//! Session layer for the dAmn chat client.
//!
//! This crate drives one connection from handshake to logout:
//!
//! 1. **Credentials**: who we log in as ([`Credentials`], [`CredentialProvider`])
//! 2. **Lifecycle**: `Offline → Connecting → Connected → LoggingIn → Online`
//! 3. **Dispatch**: incoming packets become events and room-model updates
//! 4. **Requests**: join, say, kick, admin and the rest
//!
//! [`Session`] is sans-IO. It never touches a socket; the owner moves bytes
//! and acts on [`SessionOutput`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Client driver (above)  ← owns the socket, drains SessionOutput
//!     ↕
//! Session Layer (this crate)  ← state machine, dispatch, room model
//!     ↕
//! Protocol Layer (below)  ← framing, parsing, typed events
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod machine;
mod outgoing;
mod session;

pub use auth::{CredentialProvider, StaticToken};
pub use error::SessionError;
pub use machine::{Session, SessionEvent, SessionOutput};
pub use session::{Credentials, SessionConfig, SessionState, TOKEN_LEN};
