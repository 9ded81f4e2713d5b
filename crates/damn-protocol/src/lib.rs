//! Wire layer for the dAmn chat protocol.
//!
//! This crate turns bytes into structured packets and packets into typed
//! events, and back again for outgoing requests:
//!
//! - [`Framer`] splits the byte stream at NUL terminators
//! - [`parse`] runs the packet grammar state machine
//! - [`Packet`] is the structured message, with lazy [`Packet::sub_packet`]
//! - [`Event::decode`] produces typed events from packets
//! - [`requests`] builds every packet the client sends
//! - [`ChatroomId`] converts between `#room` / `chat:room` / `pchat:a:b`
//!
//! Nothing here does I/O, and nothing here panics on hostile input.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← dispatches events, mutates the room model
//!     ↕
//! Protocol Layer (this crate)  ← framing, parsing, typed events
//!     ↕
//! Transport Layer (below)  ← raw bytes from the socket
//! ```

mod chatroom;
mod command;
mod error;
pub mod events;
mod framer;
mod member;
mod packet;
mod parser;
pub mod requests;

pub use chatroom::{ChatroomId, ChatroomKind};
pub use command::Command;
pub use error::{ParseError, ProtocolError};
pub use events::Event;
pub use framer::{DEFAULT_MAX_FRAME_LEN, Framer};
pub use member::MemberInfo;
pub use packet::Packet;
pub use parser::{key_values, parse, parse_str, split_pair};

/// Protocol version this client speaks in the handshake.
pub const PROTOCOL_VERSION: &str = "0.3";
