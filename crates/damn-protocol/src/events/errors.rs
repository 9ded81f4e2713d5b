//! Server-reported failures of our own requests.
//!
//! The server echoes the failed command back with an `e` argument. Each
//! event keeps both the closed code and the raw string.

use serde::Serialize;

use super::{chatroom_of, expect_command, login_target, required_arg};
use crate::{ChatroomId, Command, Packet, ProtocolError};

event_code! {
    pub enum SendErrorCode {
        NothingToSend => "nothing to send",
        NotPrivileged => "not privileged",
        NotOpen => "not open",
        FormatError => "format error",
        BadCommand => "bad command",
    }
}

event_code! {
    pub enum KickErrorCode {
        NoSuchMember => "no such member",
        NotPrivileged => "not privileged",
    }
}

event_code! {
    pub enum GetErrorCode {
        NotJoined => "not joined",
        UnknownProperty => "unknown property",
    }
}

event_code! {
    pub enum SetErrorCode {
        NotJoined => "not joined",
        UnknownProperty => "unknown property",
        NotPrivileged => "not privileged",
    }
}

event_code! {
    pub enum KillErrorCode {
        BadNamespace => "bad namespace",
        NotPrivileged => "not privileged",
    }
}

/// A `send` to a chatroom was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendErrorEvent {
    pub chatroom: ChatroomId,
    pub code: SendErrorCode,
    pub message: String,
}

impl SendErrorEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Send)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            code: SendErrorCode::from_wire(message),
            message: message.to_owned(),
        })
    }
}

/// A `kick` was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KickErrorEvent {
    pub chatroom: ChatroomId,
    pub username: String,
    pub code: KickErrorCode,
    pub message: String,
}

impl KickErrorEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Kick)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            username: packet.arg("u").unwrap_or_default().to_owned(),
            code: KickErrorCode::from_wire(message),
            message: message.to_owned(),
        })
    }
}

/// A `get` of a room property was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetErrorEvent {
    pub chatroom: ChatroomId,
    pub property: String,
    pub code: GetErrorCode,
    pub message: String,
}

impl GetErrorEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Get)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            property: packet.arg("p").unwrap_or_default().to_owned(),
            code: GetErrorCode::from_wire(message),
            message: message.to_owned(),
        })
    }
}

/// A `set` of a room property was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetErrorEvent {
    pub chatroom: ChatroomId,
    pub property: String,
    pub code: SetErrorCode,
    pub message: String,
}

impl SetErrorEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Set)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            property: packet.arg("p").unwrap_or_default().to_owned(),
            code: SetErrorCode::from_wire(message),
            message: message.to_owned(),
        })
    }
}

/// A `kill login:<user>` was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KillErrorEvent {
    pub username: String,
    pub code: KillErrorCode,
    pub message: String,
}

impl KillErrorEvent {
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Kill)?;
        let message = required_arg(packet, "e")?;
        Ok(Self {
            username: login_target(packet)?,
            code: KillErrorCode::from_wire(message),
            message: message.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn packet(wire: &str) -> Packet {
        parse(wire.as_bytes()).expect("valid packet")
    }

    #[test]
    fn test_send_error_maps_code() {
        let event =
            SendErrorEvent::from_packet(&packet("send chat:Botdom\ne=not privileged\n\n"), "alice")
                .expect("valid");
        assert_eq!(event.code, SendErrorCode::NotPrivileged);
        assert_eq!(event.chatroom, ChatroomId::public("Botdom"));
    }

    #[test]
    fn test_send_error_unknown_string_is_unknown_code() {
        let event =
            SendErrorEvent::from_packet(&packet("send chat:Botdom\ne=rate limited\n\n"), "alice")
                .expect("valid");
        assert_eq!(event.code, SendErrorCode::Unknown);
        assert_eq!(event.message, "rate limited");
    }

    #[test]
    fn test_kick_error_reads_target() {
        let event = KickErrorEvent::from_packet(
            &packet("kick chat:Botdom\nu=bob\ne=no such member\n\n"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.username, "bob");
        assert_eq!(event.code, KickErrorCode::NoSuchMember);
    }

    #[test]
    fn test_get_and_set_errors_read_property() {
        let get = GetErrorEvent::from_packet(
            &packet("get chat:Botdom\np=mood\ne=unknown property\n\n"),
            "alice",
        )
        .expect("valid");
        assert_eq!(get.property, "mood");
        assert_eq!(get.code, GetErrorCode::UnknownProperty);

        let set = SetErrorEvent::from_packet(
            &packet("set chat:Botdom\np=topic\ne=not privileged\n\n"),
            "alice",
        )
        .expect("valid");
        assert_eq!(set.code, SetErrorCode::NotPrivileged);
    }

    #[test]
    fn test_kill_error_reads_login_target() {
        let event =
            KillErrorEvent::from_packet(&packet("kill login:bob\ne=not privileged\n\n")).expect("valid");
        assert_eq!(event.username, "bob");
        assert_eq!(event.code, KillErrorCode::NotPrivileged);
    }

    #[test]
    fn test_error_without_e_argument_errors() {
        let result = SendErrorEvent::from_packet(&packet("send chat:Botdom\n\n"), "alice");
        assert!(result.is_err());
    }
}
