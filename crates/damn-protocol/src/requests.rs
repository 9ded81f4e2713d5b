//! Builders for every packet the client sends.
//!
//! Room-scoped commands that the server only accepts inside a `send`
//! envelope (messages, promote/demote, ban/unban, admin) are wrapped here,
//! so callers never assemble sub-packets by hand.

use crate::{ChatroomId, Command, Packet};

/// `dAmnClient <version>` with `agent=`.
pub fn handshake(version: &str, agent: &str) -> Packet {
    Packet::of(Command::DamnClient)
        .with_param(version)
        .with_arg("agent", agent)
}

/// `login <username>` with `pk=<token>`.
pub fn login(username: &str, token: &str) -> Packet {
    Packet::of(Command::Login)
        .with_param(username)
        .with_arg("pk", token)
}

pub fn join(chatroom: &ChatroomId) -> Packet {
    Packet::of(Command::Join).with_param(chatroom.to_wire())
}

pub fn part(chatroom: &ChatroomId) -> Packet {
    Packet::of(Command::Part).with_param(chatroom.to_wire())
}

pub fn pong() -> Packet {
    Packet::of(Command::Pong)
}

/// Asks the server to close the session.
pub fn disconnect() -> Packet {
    Packet::of(Command::Disconnect)
}

fn wrapped(chatroom: &ChatroomId, inner: Packet) -> Packet {
    Packet::of(Command::Send)
        .with_param(chatroom.to_wire())
        .with_sub_packet(&inner)
}

/// `send <room>` carrying `msg main`.
pub fn say(chatroom: &ChatroomId, text: &str) -> Packet {
    wrapped(
        chatroom,
        Packet::of(Command::Msg).with_param("main").with_data(text),
    )
}

/// `send <room>` carrying `action main`.
pub fn act(chatroom: &ChatroomId, text: &str) -> Packet {
    wrapped(
        chatroom,
        Packet::of(Command::Action).with_param("main").with_data(text),
    )
}

/// `send <room>` carrying `npmsg main` (message without markup parsing).
pub fn npmsg(chatroom: &ChatroomId, text: &str) -> Packet {
    wrapped(
        chatroom,
        Packet::of(Command::Npmsg).with_param("main").with_data(text),
    )
}

/// `promote <user>`, optionally naming the target privclass.
pub fn promote(chatroom: &ChatroomId, username: &str, privclass: Option<&str>) -> Packet {
    let inner = Packet::of(Command::Promote).with_param(username);
    wrapped(chatroom, with_optional_data(inner, privclass))
}

/// `demote <user>`, optionally naming the target privclass.
pub fn demote(chatroom: &ChatroomId, username: &str, privclass: Option<&str>) -> Packet {
    let inner = Packet::of(Command::Demote).with_param(username);
    wrapped(chatroom, with_optional_data(inner, privclass))
}

fn with_optional_data(packet: Packet, data: Option<&str>) -> Packet {
    match data {
        Some(data) => packet.with_data(data),
        None => packet,
    }
}

/// `kick <room>` with `u=<user>`, reason as data. Not wrapped.
pub fn kick(chatroom: &ChatroomId, username: &str, reason: Option<&str>) -> Packet {
    let packet = Packet::of(Command::Kick)
        .with_param(chatroom.to_wire())
        .with_arg("u", username);
    with_optional_data(packet, reason)
}

pub fn ban(chatroom: &ChatroomId, username: &str) -> Packet {
    wrapped(chatroom, Packet::of(Command::Ban).with_param(username))
}

pub fn unban(chatroom: &ChatroomId, username: &str) -> Packet {
    wrapped(chatroom, Packet::of(Command::Unban).with_param(username))
}

/// `get <room>` with `p=<property>`.
pub fn get_property(chatroom: &ChatroomId, property: &str) -> Packet {
    Packet::of(Command::Get)
        .with_param(chatroom.to_wire())
        .with_arg("p", property)
}

/// `set <room>` with `p=<property>`, value as data.
pub fn set_property(chatroom: &ChatroomId, property: &str, value: &str) -> Packet {
    Packet::of(Command::Set)
        .with_param(chatroom.to_wire())
        .with_arg("p", property)
        .with_data(value)
}

/// `send <room>` carrying `admin` with the raw admin command as data.
pub fn admin(chatroom: &ChatroomId, command: &str) -> Packet {
    wrapped(chatroom, Packet::of(Command::Admin).with_data(command))
}

/// `kill login:<user>` with the reason as data.
pub fn kill(username: &str, reason: &str) -> Packet {
    Packet::of(Command::Kill)
        .with_param(format!("login:{username}"))
        .with_data(reason)
}

/// `get login:<user>` with `p=info`; the reply decodes as a whois event.
pub fn whois(username: &str) -> Packet {
    Packet::of(Command::Get)
        .with_param(format!("login:{username}"))
        .with_arg("p", "info")
}
