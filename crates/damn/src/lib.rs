//! # damn
//!
//! Async client for the dAmn chat network.
//!
//! `damn` keeps a live model of every joined chatroom (privilege classes,
//! members, title, topic) and turns the server's packets into typed
//! events. The pieces live in their own crates and are re-exported here:
//!
//! ```text
//!   damn-transport   TCP connector, raw bytes
//!   damn-protocol    packet framing, parsing, events, request builders
//!   damn-room        chatroom, privclass and user model
//!   damn-session     connection state machine, no I/O
//!   damn             driver task, builder, handle (this crate)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use damn::prelude::*;
//!
//! # async fn run() -> Result<(), DamnError> {
//! let credentials = Credentials::new("botname", "0123456789abcdef0123456789abcdef")?;
//! let mut client = DamnClient::builder().connect(credentials).await?;
//! let handle = client.handle();
//!
//! while let Some(event) = client.next_event().await {
//!     if let SessionEvent::StateChanged { to: SessionState::Online, .. } = event {
//!         handle.join("#Botdom").await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod driver;
mod error;

pub use client::{ClientHandle, DamnClient, DamnClientBuilder};
pub use config::ClientConfig;
pub use error::DamnError;

pub use damn_protocol as protocol;
pub use damn_room as room;
pub use damn_session as session;
pub use damn_transport as transport;

/// Everything a typical bot needs.
pub mod prelude {
    pub use crate::{ClientConfig, ClientHandle, DamnClient, DamnClientBuilder, DamnError};
    pub use damn_protocol::{ChatroomId, Event, MemberInfo};
    pub use damn_room::{Chatroom, RoomNotice};
    pub use damn_session::{
        CredentialProvider, Credentials, SessionConfig, SessionEvent, SessionState, StaticToken,
    };
}
