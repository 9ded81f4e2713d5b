//! What the room model tells observers after applying an event.

use damn_protocol::{ChatroomId, Event};
use serde::Serialize;

/// One item raised by a `Chatroom::notify_*` call.
///
/// The structured [`Event`] always comes first, followed by a flattened
/// [`RoomNotice`] for the cases observers most often care about.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomNotification {
    Event(Event),
    Notice(RoomNotice),
}

/// Field-based summaries of membership changes, with the model's view
/// already resolved (e.g. the privclass a joiner landed in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum RoomNotice {
    Joined {
        chatroom: ChatroomId,
        username: String,
        privclass: String,
    },
    Parted {
        chatroom: ChatroomId,
        username: String,
        reason: Option<String>,
    },
    Kicked {
        chatroom: ChatroomId,
        username: String,
        by: String,
        reason: String,
    },
    PrivclassChanged {
        chatroom: ChatroomId,
        username: String,
        /// `None` when the member was not known before the change.
        from: Option<String>,
        to: String,
        by: String,
    },
    PrivclassMoved {
        chatroom: ChatroomId,
        from: String,
        to: String,
        /// Members actually moved, as counted locally.
        moved: usize,
    },
}

impl RoomNotice {
    pub fn chatroom(&self) -> &ChatroomId {
        match self {
            Self::Joined { chatroom, .. }
            | Self::Parted { chatroom, .. }
            | Self::Kicked { chatroom, .. }
            | Self::PrivclassChanged { chatroom, .. }
            | Self::PrivclassMoved { chatroom, .. } => chatroom,
        }
    }
}
