//! Typed views over incoming packets.
//!
//! Every event is a plain data struct built by a `from_packet` constructor
//! that validates the packet shape. [`Event::decode`] is the single entry
//! point: it dispatches on the top-level command and, for `recv`
//! envelopes, a second time on the sub-packet's command.
//!
//! ```text
//! dAmnServer → Handshake        recv ─┬─ msg      → Msg
//! login      → Login                  ├─ action   → Action
//! join/part  → Joined/Parted          ├─ join     → Join
//! property   → Property | Whois       ├─ part     → Part
//! kicked     → Kicked                 ├─ kicked   → Kick
//! disconnect → Disconnect             ├─ privchg  → Privchg
//! send/kick/get/set/kill → *Error     └─ admin …  → Priv*
//! ```

use serde::Serialize;

use crate::{ChatroomId, Command, Packet, ProtocolError};

/// Defines a closed event-code enum parsed from an `e=` string.
///
/// Strings outside the table map to `Unknown`; events keep the raw text
/// next to the code.
macro_rules! event_code {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A string this client does not recognise.
            Unknown,
        }

        impl $name {
            /// Maps the wire string to a code. Never fails.
            pub fn from_wire(text: &str) -> Self {
                match text {
                    $( $text => Self::$variant, )+
                    _ => Self::Unknown,
                }
            }

            /// The wire string, or `None` for `Unknown`.
            pub fn as_str(&self) -> Option<&'static str> {
                match self {
                    $( Self::$variant => Some($text), )+
                    Self::Unknown => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str().unwrap_or("unknown"))
            }
        }
    };
}

mod admin;
mod errors;
mod peer;
mod room;
mod session;

pub use admin::{
    PrivClassUsers, PrivMoveEvent, PrivMoveKind, PrivRemoveEvent, PrivShowEvent,
    PrivShowEntry, PrivUpdateEvent, PrivUpdateKind, PrivUsersEvent,
};
pub use errors::{
    GetErrorCode, GetErrorEvent, KickErrorCode, KickErrorEvent, KillErrorCode,
    KillErrorEvent, SendErrorCode, SendErrorEvent, SetErrorCode, SetErrorEvent,
};
pub use peer::{JoinEvent, KickEvent, KickedEvent, MessageEvent, PartEvent, PrivchgEvent};
pub use room::{PropertyEvent, PropertyKind, WhoisConnection, WhoisEvent};
pub use session::{
    DisconnectCode, DisconnectEvent, HandshakeEvent, JoinCode, JoinedEvent, LoginCode,
    LoginEvent, PartCode, PartedEvent,
};

/// Every event the client can decode.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Handshake(HandshakeEvent),
    Login(LoginEvent),
    Joined(JoinedEvent),
    Parted(PartedEvent),
    Ping,
    Property(PropertyEvent),
    Whois(WhoisEvent),
    Msg(MessageEvent),
    Action(MessageEvent),
    Join(JoinEvent),
    Part(PartEvent),
    Kick(KickEvent),
    Kicked(KickedEvent),
    Privchg(PrivchgEvent),
    PrivUpdate(PrivUpdateEvent),
    PrivMove(PrivMoveEvent),
    PrivRemove(PrivRemoveEvent),
    PrivShow(PrivShowEvent),
    PrivUsers(PrivUsersEvent),
    Disconnect(DisconnectEvent),
    SendError(SendErrorEvent),
    KickError(KickErrorEvent),
    GetError(GetErrorEvent),
    SetError(SetErrorEvent),
    KillError(KillErrorEvent),
    /// A packet the client has no decoder for. Logged, never rejected.
    Unknown(Packet),
}

impl Event {
    /// Decodes an incoming packet.
    ///
    /// `local` is the logged-in username, needed to resolve private chat
    /// identifiers. It may be empty before login.
    pub fn decode(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let event = match packet.command() {
            Command::DamnServer => Self::Handshake(HandshakeEvent::from_packet(packet)?),
            Command::Login => Self::Login(LoginEvent::from_packet(packet)?),
            Command::Join => Self::Joined(JoinedEvent::from_packet(packet, local)?),
            Command::Part => Self::Parted(PartedEvent::from_packet(packet, local)?),
            Command::Ping => Self::Ping,
            Command::Property if packet.param().starts_with("login:") => {
                Self::Whois(WhoisEvent::from_packet(packet, local)?)
            }
            Command::Property => Self::Property(PropertyEvent::from_packet(packet, local)?),
            Command::Whois => Self::Whois(WhoisEvent::from_packet(packet, local)?),
            Command::Recv => Self::decode_recv(packet, local)?,
            Command::Kicked => Self::Kicked(KickedEvent::from_packet(packet, local)?),
            Command::Disconnect => Self::Disconnect(DisconnectEvent::from_packet(packet)?),
            Command::Send => Self::SendError(SendErrorEvent::from_packet(packet, local)?),
            Command::Kick => Self::KickError(KickErrorEvent::from_packet(packet, local)?),
            Command::Get => Self::GetError(GetErrorEvent::from_packet(packet, local)?),
            Command::Set => Self::SetError(SetErrorEvent::from_packet(packet, local)?),
            Command::Kill => Self::KillError(KillErrorEvent::from_packet(packet)?),
            _ => {
                tracing::debug!(command = packet.command_name(), "no decoder for packet");
                Self::Unknown(packet.clone())
            }
        };
        Ok(event)
    }

    fn decode_recv(packet: &Packet, local: &str) -> Result<Self, ProtocolError> {
        let sub = packet.sub_packet()?;
        let event = match sub.command() {
            Command::Msg => Self::Msg(MessageEvent::from_packet(packet, local)?),
            Command::Action => Self::Action(MessageEvent::from_packet(packet, local)?),
            Command::Join => Self::Join(JoinEvent::from_packet(packet, local)?),
            Command::Part => Self::Part(PartEvent::from_packet(packet, local)?),
            Command::Kicked => Self::Kick(KickEvent::from_packet(packet, local)?),
            Command::Privchg => Self::Privchg(PrivchgEvent::from_packet(packet, local)?),
            Command::Admin => admin::decode(packet, local)?,
            _ => {
                tracing::debug!(
                    command = sub.command_name(),
                    "no decoder for recv sub-packet"
                );
                Self::Unknown(packet.clone())
            }
        };
        Ok(event)
    }

    /// The chatroom this event concerns, if any.
    pub fn chatroom(&self) -> Option<&ChatroomId> {
        match self {
            Self::Joined(e) => Some(&e.chatroom),
            Self::Parted(e) => Some(&e.chatroom),
            Self::Property(e) => Some(&e.chatroom),
            Self::Msg(e) | Self::Action(e) => Some(&e.chatroom),
            Self::Join(e) => Some(&e.chatroom),
            Self::Part(e) => Some(&e.chatroom),
            Self::Kick(e) => Some(&e.chatroom),
            Self::Kicked(e) => Some(&e.chatroom),
            Self::Privchg(e) => Some(&e.chatroom),
            Self::PrivUpdate(e) => Some(&e.chatroom),
            Self::PrivMove(e) => Some(&e.chatroom),
            Self::PrivRemove(e) => Some(&e.chatroom),
            Self::PrivShow(e) => Some(&e.chatroom),
            Self::PrivUsers(e) => Some(&e.chatroom),
            Self::SendError(e) => Some(&e.chatroom),
            Self::KickError(e) => Some(&e.chatroom),
            Self::GetError(e) => Some(&e.chatroom),
            Self::SetError(e) => Some(&e.chatroom),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared decoding helpers
// ---------------------------------------------------------------------------

pub(crate) fn expect_command(
    packet: &Packet,
    expected: Command,
) -> Result<(), ProtocolError> {
    if packet.command() == expected {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedCommand {
            expected: expected.as_str().unwrap_or("unknown"),
            found: packet.command_name().to_owned(),
        })
    }
}

pub(crate) fn required_arg<'a>(
    packet: &'a Packet,
    name: &'static str,
) -> Result<&'a str, ProtocolError> {
    packet.arg(name).ok_or_else(|| ProtocolError::MissingArgument {
        command: packet.command_name().to_owned(),
        name,
    })
}

/// Chatroom named by the packet's parameter.
pub(crate) fn chatroom_of(packet: &Packet, local: &str) -> Result<ChatroomId, ProtocolError> {
    ChatroomId::parse(packet.param(), local)
}

/// The sub-packet of a `recv` envelope, checked against `expected`.
pub(crate) fn recv_sub<'a>(
    packet: &'a Packet,
    expected: Command,
) -> Result<&'a Packet, ProtocolError> {
    expect_command(packet, Command::Recv)?;
    let sub = packet.sub_packet()?;
    expect_command(sub, expected)?;
    Ok(sub)
}

pub(crate) fn parse_number<T: std::str::FromStr>(
    field: &str,
    value: &str,
) -> Result<T, ProtocolError> {
    value.trim().parse().map_err(|_| ProtocolError::InvalidField {
        field: field.to_owned(),
        value: value.to_owned(),
    })
}

/// Username from a `login:<name>` parameter.
pub(crate) fn login_target(packet: &Packet) -> Result<String, ProtocolError> {
    packet
        .param()
        .strip_prefix("login:")
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ProtocolError::InvalidField {
            field: "param".into(),
            value: packet.param().to_owned(),
        })
}
