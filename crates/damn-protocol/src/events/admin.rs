//! Privclass administration notices (`recv` → `admin <subcommand>`).

use serde::Serialize;

use super::{Event, chatroom_of, parse_number, recv_sub, required_arg};
use crate::{ChatroomId, Command, Packet, ProtocolError};

/// Dispatches on the admin sub-command.
pub(super) fn decode(packet: &Packet, local: &str) -> Result<Event, ProtocolError> {
    let sub = recv_sub(packet, Command::Admin)?;
    let event = match sub.param() {
        "create" | "update" => Event::PrivUpdate(PrivUpdateEvent::from_packet(packet, local)?),
        "rename" | "move" => Event::PrivMove(PrivMoveEvent::from_packet(packet, local)?),
        "remove" => Event::PrivRemove(PrivRemoveEvent::from_packet(packet, local)?),
        "show" if sub.arg("p") == Some("users") => {
            Event::PrivUsers(PrivUsersEvent::from_packet(packet, local)?)
        }
        "show" => Event::PrivShow(PrivShowEvent::from_packet(packet, local)?),
        other => {
            tracing::debug!(subcommand = other, "unhandled admin notice");
            Event::Unknown(packet.clone())
        }
    };
    Ok(event)
}

fn admin_sub<'a>(packet: &'a Packet, accepted: &[&'static str]) -> Result<&'a Packet, ProtocolError> {
    let sub = recv_sub(packet, Command::Admin)?;
    if accepted.iter().any(|name| *name == sub.param()) {
        Ok(sub)
    } else {
        Err(ProtocolError::UnexpectedCommand {
            expected: accepted[0],
            found: format!("admin {}", sub.param()),
        })
    }
}

fn affected_count(sub: &Packet) -> Result<Option<u32>, ProtocolError> {
    sub.arg("n").map(|n| parse_number("n", n)).transpose()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivUpdateKind {
    Create,
    Update,
}

/// A privclass was created or had its privileges changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivUpdateEvent {
    pub chatroom: ChatroomId,
    pub kind: PrivUpdateKind,
    pub by: String,
    pub name: String,
    /// Privilege string, e.g. `order=50 +msg -images`.
    pub privs: String,
}

impl PrivUpdateEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = admin_sub(packet, &["create", "update"])?;
        let kind = if sub.param() == "create" {
            PrivUpdateKind::Create
        } else {
            PrivUpdateKind::Update
        };
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            kind,
            by: required_arg(sub, "by")?.to_owned(),
            name: required_arg(sub, "name")?.to_owned(),
            privs: sub.arg("privs").unwrap_or_default().to_owned(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivMoveKind {
    /// `prev` is renamed to `name`, members included.
    Rename,
    /// Members of `prev` are moved into `name`.
    Move,
}

/// A privclass was renamed, or its members moved to another class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivMoveEvent {
    pub chatroom: ChatroomId,
    pub kind: PrivMoveKind,
    pub by: String,
    pub prev: String,
    pub name: String,
    /// Server-reported number of affected users. Sent with `move` only.
    pub affected: Option<u32>,
}

impl PrivMoveEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = admin_sub(packet, &["rename", "move"])?;
        let kind = if sub.param() == "rename" {
            PrivMoveKind::Rename
        } else {
            PrivMoveKind::Move
        };
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            kind,
            by: required_arg(sub, "by")?.to_owned(),
            prev: required_arg(sub, "prev")?.to_owned(),
            name: required_arg(sub, "name")?.to_owned(),
            affected: affected_count(sub)?,
        })
    }
}

/// A privclass was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivRemoveEvent {
    pub chatroom: ChatroomId,
    pub by: String,
    pub name: String,
    pub affected: Option<u32>,
}

impl PrivRemoveEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = admin_sub(packet, &["remove"])?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            by: required_arg(sub, "by")?.to_owned(),
            name: required_arg(sub, "name")?.to_owned(),
            affected: affected_count(sub)?,
        })
    }
}

/// One `name privs…` line of a privclass listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivShowEntry {
    pub name: String,
    pub privs: String,
}

/// Reply to `admin show privclass`: the privilege strings of each class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivShowEvent {
    pub chatroom: ChatroomId,
    pub entries: Vec<PrivShowEntry>,
}

impl PrivShowEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = admin_sub(packet, &["show"])?;
        let entries = sub
            .data()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let (name, privs) = line.split_once(' ').unwrap_or((line, ""));
                PrivShowEntry {
                    name: name.to_owned(),
                    privs: privs.trim().to_owned(),
                }
            })
            .collect();
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            entries,
        })
    }
}

/// One `name: user user…` line of a user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivClassUsers {
    pub name: String,
    pub users: Vec<String>,
}

/// Reply to `admin show users`: who sits in each privclass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivUsersEvent {
    pub chatroom: ChatroomId,
    pub classes: Vec<PrivClassUsers>,
}

impl PrivUsersEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = admin_sub(packet, &["show"])?;
        let mut classes = Vec::new();
        for line in sub.data().lines().filter(|line| !line.trim().is_empty()) {
            let (name, users) = line.split_once(':').ok_or_else(|| ProtocolError::Malformed {
                event: "privusers",
                reason: format!("line without ':' separator: {line:?}"),
            })?;
            classes.push(PrivClassUsers {
                name: name.trim().to_owned(),
                users: users.split_whitespace().map(str::to_owned).collect(),
            });
        }
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            classes,
        })
    }
}
