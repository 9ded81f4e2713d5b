//! Chatroom model for dAmn sessions.
//!
//! Ownership is explicit and one-directional:
//!
//! ```text
//! Session
//!  ├── Chatroom (per joined room)
//!  │    ├── PrivClass (per class)   member names only
//!  │    └── member → privclass      member names only
//!  └── UserRegistry                 owns every User
//! ```
//!
//! Chatrooms never hold users; they attach and detach names in the
//! registry, which drops a user as soon as its last membership goes.
//!
//! # Key types
//!
//! - [`Chatroom`]: properties, privclasses, members, and `notify_*` methods
//! - [`PrivClass`] / [`Privileges`]: ranked permission bundles
//! - [`UserRegistry`] / [`User`]: users shared across rooms
//! - [`RoomNotification`] / [`RoomNotice`]: what observers receive

mod chatroom;
mod error;
mod notice;
mod privclass;
mod user;

pub use chatroom::{Chatroom, RoomProperty, parse_privclass_line};
pub use error::RoomError;
pub use notice::{RoomNotice, RoomNotification};
pub use privclass::{DEFAULT_PRIVCLASS_ORDER, PrivClass, Privileges};
pub use user::{IconFormat, User, UserRegistry};
