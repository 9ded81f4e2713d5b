//! Events about other people in a room, carried inside `recv` envelopes.
//!
//! The envelope's parameter names the chatroom; the sub-packet's parameter
//! names the user (or `main` for messages).

use serde::Serialize;

use super::{chatroom_of, expect_command, recv_sub, required_arg};
use crate::{ChatroomId, Command, MemberInfo, Packet, ProtocolError};

/// `msg main` / `action main`: someone spoke or emoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEvent {
    pub chatroom: ChatroomId,
    pub from: String,
    /// Raw tablump-formatted text.
    pub text: String,
}

impl MessageEvent {
    /// Decodes either a `msg` or an `action` sub-packet.
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Recv)?;
        let sub = packet.sub_packet()?;
        if !matches!(sub.command(), Command::Msg | Command::Action) {
            return Err(ProtocolError::UnexpectedCommand {
                expected: "msg",
                found: sub.command_name().to_owned(),
            });
        }
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            from: required_arg(sub, "from")?.to_owned(),
            text: sub.data().to_owned(),
        })
    }
}

/// `join <user>`: someone entered the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinEvent {
    pub chatroom: ChatroomId,
    pub username: String,
    pub member: MemberInfo,
}

impl JoinEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = recv_sub(packet, Command::Join)?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            username: username_of(sub)?,
            member: MemberInfo::from_lines(sub.data()),
        })
    }
}

/// `part <user>`: someone left the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartEvent {
    pub chatroom: ChatroomId,
    pub username: String,
    pub reason: Option<String>,
}

impl PartEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = recv_sub(packet, Command::Part)?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            username: username_of(sub)?,
            reason: sub.arg("r").map(str::to_owned),
        })
    }
}

/// `kicked <user>` inside a `recv`: someone else was kicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KickEvent {
    pub chatroom: ChatroomId,
    pub username: String,
    pub by: String,
    pub reason: String,
}

impl KickEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = recv_sub(packet, Command::Kicked)?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            username: username_of(sub)?,
            by: required_arg(sub, "by")?.to_owned(),
            reason: sub.data().to_owned(),
        })
    }
}

/// Top-level `kicked <chatroom>`: we were kicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KickedEvent {
    pub chatroom: ChatroomId,
    pub by: String,
    pub reason: String,
}

impl KickedEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        expect_command(packet, Command::Kicked)?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            by: required_arg(packet, "by")?.to_owned(),
            reason: packet.data().to_owned(),
        })
    }
}

/// `privchg <user>`: someone was moved to another privclass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivchgEvent {
    pub chatroom: ChatroomId,
    pub username: String,
    pub by: String,
    pub privclass: String,
}

impl PrivchgEvent {
    pub fn from_packet(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = recv_sub(packet, Command::Privchg)?;
        Ok(Self {
            chatroom: chatroom_of(packet, local)?,
            username: username_of(sub)?,
            by: required_arg(sub, "by")?.to_owned(),
            privclass: required_arg(sub, "pc")?.to_owned(),
        })
    }
}

fn username_of(sub: &Packet) -> Result<String, ProtocolError> {
    match sub.param() {
        "" => Err(ProtocolError::InvalidField {
            field: "username".into(),
            value: String::new(),
        }),
        name => Ok(name.to_owned()),
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
    fn test_message_reads_sender_and_text() {
        let event = MessageEvent::from_packet(
            &packet("recv chat:Botdom\n\nmsg main\nfrom=bob\n\nhello: world\nsecond line"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.chatroom, ChatroomId::public("Botdom"));
        assert_eq!(event.from, "bob");
        assert_eq!(event.text, "hello: world\nsecond line");
    }

    #[test]
    fn test_message_in_private_chat_names_peer() {
        let event = MessageEvent::from_packet(
            &packet("recv pchat:alice:bob\n\nmsg main\nfrom=bob\n\nhey"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.chatroom.name(), "bob");
        assert!(event.chatroom.is_private());
    }

    #[test]
    fn test_message_without_sender_errors() {
        let result = MessageEvent::from_packet(&packet("recv chat:Botdom\n\nmsg main\n\nhi"), "alice");
        assert!(matches!(result, Err(ProtocolError::MissingArgument { name: "from", .. })));
    }

    #[test]
    fn test_join_reads_member_properties() {
        let event = JoinEvent::from_packet(
            &packet("recv chat:Botdom\n\njoin bob\ns=0\n\npc=Members\nusericon=1\nsymbol==\nrealname=Bob\ntypename=Hobbyist\ngpc=guest\n"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.username, "bob");
        assert_eq!(event.member.privclass, "Members");
        assert_eq!(event.member.symbol, Some('='));
        assert_eq!(event.member.typename, "Hobbyist");
    }

    #[test]
    fn test_part_reads_optional_reason() {
        let event = PartEvent::from_packet(
            &packet("recv chat:Botdom\n\npart bob\nr=connection closed\n\n"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.username, "bob");
        assert_eq!(event.reason.as_deref(), Some("connection closed"));
    }

    #[test]
    fn test_peer_kick_reason_is_sub_packet_data() {
        let event = KickEvent::from_packet(
            &packet("recv chat:Botdom\n\nkicked bob\nby=zed\n\nbe nice"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.username, "bob");
        assert_eq!(event.by, "zed");
        assert_eq!(event.reason, "be nice");
    }

    #[test]
    fn test_kicked_self_reads_top_level_packet() {
        let event =
            KickedEvent::from_packet(&packet("kicked chat:Botdom\nby=zed\n\nout"), "alice").expect("valid");
        assert_eq!(event.by, "zed");
        assert_eq!(event.reason, "out");
    }

    #[test]
    fn test_privchg_reads_new_class() {
        let event = PrivchgEvent::from_packet(
            &packet("recv chat:Botdom\n\nprivchg bob\nby=zed\npc=Operators\n\n"),
            "alice",
        )
        .expect("valid");
        assert_eq!(event.privclass, "Operators");
        assert_eq!(event.by, "zed");
    }

    #[test]
    fn test_peer_decoder_rejects_wrong_sub_command() {
        let result = PartEvent::from_packet(&packet("recv chat:Botdom\n\njoin bob\n\n"), "alice");
        assert!(matches!(result, Err(ProtocolError::UnexpectedCommand { .. })));
    }

    #[test]
    fn test_peer_decoder_rejects_missing_username() {
        let result = PartEvent::from_packet(&packet("recv chat:Botdom\n\npart\n\n"), "alice");
        assert!(result.is_err());
    }
}
