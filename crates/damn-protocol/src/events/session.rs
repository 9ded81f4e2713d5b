//! Connection-level replies: handshake, login, join/part results, disconnect.

use serde::Serialize;

use super::{chatroom_of, expect_command, required_arg};
use crate::{ChatroomId, Command, MemberInfo, Packet, ProtocolError};

event_code! {
    /// Outcome of a `login` request.
    pub enum LoginCode {
        Ok => "ok",
        AuthFailed => "authentication failed",
        NotPrivileged => "not privileged",
        TooManyConnections => "too many connections",
    }
}

event_code! {
    /// Outcome of a `join` request.
    pub enum JoinCode {
        Ok => "ok",
        NotPrivileged => "not privileged",
        Inexistent => "chatroom doesn't exist",
        BadNamespace => "bad namespace",
    }
}

event_code! {
    /// Outcome of a `part` request.
    pub enum PartCode {
        Ok => "ok",
        NotJoined => "not joined",
        BadNamespace => "bad namespace",
    }
}

event_code! {
    /// Why the server is closing the connection.
    pub enum DisconnectCode {
        Ok => "ok",
        Killed => "killed",
        NoLogin => "no login",
        Shutdown => "shutdown",
    }
}

/// `dAmnServer <version>`: the server's half of the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeEvent {
    pub version: String,
}

impl HandshakeEvent {
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::DamnServer)?;
        Ok(Self {
            version: packet.param().to_owned(),
        })
    }

    /// Whether the server speaks the version this client expects.
    pub fn matches(&self, expected: &str) -> bool {
        self.version == expected
    }
}

/// `login <username>` reply.
///
/// On success the payload holds the account's identity fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginEvent {
    pub username: String,
    pub code: LoginCode,
    /// The raw `e` string.
    pub message: String,
    /// Present only when `code` is [`LoginCode::Ok`].
    pub identity: Option<MemberInfo>,
}

impl LoginEvent {
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Login)?;
        let message = required_arg(packet, "e")?;
        let code = LoginCode::from_wire(message);
        let identity = (code == LoginCode::Ok).then(|| MemberInfo::from_lines(packet.data()));
        Ok(Self {
            username: packet.param().to_owned(),
            code,
            message: message.to_owned(),
            identity,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.code == LoginCode::Ok
    }
}

/// Reply to our own `join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedEvent {
    pub chatroom: ChatroomId,
    pub code: JoinCode,
    pub message: String,
}

impl JoinedEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Join)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            code: JoinCode::from_wire(message),
            message: message.to_owned(),
        })
    }

    pub fn is_ok(&self) -> bool {
        self.code == JoinCode::Ok
    }
}

/// Reply to our own `part`, or a server-initiated part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartedEvent {
    pub chatroom: ChatroomId,
    pub code: PartCode,
    pub message: String,
    pub reason: Option<String>,
}

impl PartedEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Part)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            code: PartCode::from_wire(message),
            message: message.to_owned(),
            reason: packet.arg("r").map(str::to_owned),
        })
    }

    pub fn is_ok(&self) -> bool {
        self.code == PartCode::Ok
    }
}

/// The server is dropping the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisconnectEvent {
    pub code: DisconnectCode,
    pub message: String,
}

impl DisconnectEvent {
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Disconnect)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            code: DisconnectCode::from_wire(message),
            message: message.to_owned(),
        })
    }
}
