//! Room property pushes and whois replies.

use std::time::Duration;

use serde::Serialize;

use super::{chatroom_of, expect_command, login_target, parse_number};
use crate::{ChatroomId, Command, MemberInfo, Packet, ProtocolError};

/// Which chatroom property a `property` packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Topic,
    Title,
    /// The `order:name` privclass list.
    Privclasses,
    /// The bulk member dump.
    Members,
    Unknown,
}

impl PropertyKind {
    pub fn from_wire(name: &str) -> Self {
        match name {
            "topic" => Self::Topic,
            "title" => Self::Title,
            "privclasses" | "privclass" => Self::Privclasses,
            "members" => Self::Members,
            _ => Self::Unknown,
        }
    }
}

/// `property <chatroom>`: a room property value pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEvent {
    pub chatroom: ChatroomId,
    pub kind: PropertyKind,
    /// The raw property name.
    pub name: String,
    pub value: String,
    pub by: Option<String>,
    /// Unix seconds.
    pub timestamp: Option<u64>,
}

impl PropertyEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Property)?;
        // Older servers named the property with `e` instead of `p`.
        let name = packet
            .arg("p")
            .or_else(|| packet.arg("e"))
            .ok_or_else(|| ProtocolError::MissingArgument {
                command: packet.command_name().to_owned(),
                name: "p",
            })?;
        let timestamp = match packet.arg("ts") {
            Some(ts) => Some(parse_number("ts", ts)?),
            None => None,
        };
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            kind: PropertyKind::from_wire(name),
            name: name.to_owned(),
            value: packet.data().to_owned(),
            by: packet.arg("by").map(str::to_owned),
            timestamp,
        })
    }
}

/// One live connection listed in a whois reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WhoisConnection {
    pub online: Duration,
    pub idle: Duration,
    pub chatrooms: Vec<ChatroomId>,
}

/// `property login:<user>` with `p=info`.
///
/// The payload grammar has no length prefixes, so parsing is all or
/// nothing:
///
/// ```text
/// usericon=<n>        ┐
/// symbol=<c>          │ header
/// realname=…          │
/// typename=…          │
/// gpc=…               ┘
///                     blank
/// conn                ┐
/// online=<secs>       │ zero or more
/// idle=<secs>         │ connection blocks
///                     │
/// ns chat:<room>      │ each ns line is
///                     ┘ followed by a blank
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhoisEvent {
    pub username: String,
    pub info: MemberInfo,
    pub connections: Vec<WhoisConnection>,
}

impl WhoisEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        if packet.command() != Command::Whois {
            expect_command(packet, Command::Property)?;
            if let Some(p) = packet.arg("p").filter(|p| *p != "info") {
                return Err(malformed(format!("property {p:?} is not whois info")));
            }
        }
        let username = login_target(packet)?;
        let (info, connections) = parse_whois(packet.data(), local)?;
        Ok(Self {
            username,
            info,
            connections,
        })
    }
}

fn malformed(reason: String) -> ProtocolError {
    ProtocolError::Malformed {
        event: "whois",
        reason,
    }
}

fn parse_whois(
    data: &str,
    local: &str,
) -> Result<(MemberInfo, Vec<WhoisConnection>), ProtocolError> {
    let mut lines = data.lines().peekable();
    let mut info = MemberInfo::default();

    // Header: key=value lines up to the first blank line.
    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        let (key, value) = crate::split_pair(line)
            .ok_or_else(|| malformed(format!("bad header line {line:?}")))?;
        if key == "pc" {
            return Err(malformed("unexpected header key \"pc\"".into()));
        }
        info.set_field(key, value)
            .map_err(|e| malformed(e.to_string()))?;
    }

    let mut connections = Vec::new();
    while let Some(line) = lines.next() {
        match line {
            "" => continue,
            "conn" => {}
            other => return Err(malformed(format!("expected conn block, got {other:?}"))),
        }

        let mut conn = WhoisConnection::default();
        // Duration fields up to a blank line.
        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            let (key, value) = crate::split_pair(line)
                .ok_or_else(|| malformed(format!("bad conn line {line:?}")))?;
            let secs: u64 = parse_number(key, value).map_err(|e| malformed(e.to_string()))?;
            match key {
                "online" => conn.online = Duration::from_secs(secs),
                "idle" => conn.idle = Duration::from_secs(secs),
                other => return Err(malformed(format!("unknown conn key {other:?}"))),
            }
        }

        // `ns <chatroom>` lines, each followed by a blank line.
        while let Some(ns) = lines.peek().copied().and_then(|line| line.strip_prefix("ns ")) {
            // Another user's private chats need not involve us; keep the pair.
            let id = ChatroomId::parse(ns, local)
                .or_else(|_| ChatroomId::parse(ns, ""))
                .map_err(|e| malformed(e.to_string()))?;
            conn.chatrooms.push(id);
            lines.next();
            match lines.next() {
                None | Some("") => {}
                Some(other) => {
                    return Err(malformed(format!("expected blank after ns, got {other:?}")));
                }
            }
        }

        connections.push(conn);
    }

    Ok((info, connections))
}
