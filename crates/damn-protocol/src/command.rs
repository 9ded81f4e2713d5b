//! The closed table of command tokens the client understands.
//!
//! Every packet starts with a command token. Tokens outside this table are
//! not an error: they decode as [`Command::Unknown`] and the packet keeps
//! its raw token so it can still be logged or re-serialized.

use std::fmt;

use serde::Serialize;

/// A command token resolved against the known-command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    DamnClient,
    DamnServer,
    Login,
    Join,
    Part,
    Ping,
    Pong,
    Send,
    Recv,
    Promote,
    Demote,
    Kick,
    Kicked,
    Ban,
    Unban,
    Get,
    Set,
    Admin,
    Disconnect,
    Kill,
    Property,
    Msg,
    Action,
    Npmsg,
    Userinfo,
    Whois,
    Privchg,
    /// Any token not in the table above.
    Unknown,
}

impl Command {
    /// Every known command, in wire-table order.
    pub const KNOWN: [Command; 27] = [
        Command::DamnClient,
        Command::DamnServer,
        Command::Login,
        Command::Join,
        Command::Part,
        Command::Ping,
        Command::Pong,
        Command::Send,
        Command::Recv,
        Command::Promote,
        Command::Demote,
        Command::Kick,
        Command::Kicked,
        Command::Ban,
        Command::Unban,
        Command::Get,
        Command::Set,
        Command::Admin,
        Command::Disconnect,
        Command::Kill,
        Command::Property,
        Command::Msg,
        Command::Action,
        Command::Npmsg,
        Command::Userinfo,
        Command::Whois,
        Command::Privchg,
    ];

    /// Resolves a wire token. Never fails.
    pub fn from_name(name: &str) -> Self {
        match name {
            "dAmnClient" => Self::DamnClient,
            "dAmnServer" => Self::DamnServer,
            "login" => Self::Login,
            "join" => Self::Join,
            "part" => Self::Part,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            "send" => Self::Send,
            "recv" => Self::Recv,
            "promote" => Self::Promote,
            "demote" => Self::Demote,
            "kick" => Self::Kick,
            "kicked" => Self::Kicked,
            "ban" => Self::Ban,
            "unban" => Self::Unban,
            "get" => Self::Get,
            "set" => Self::Set,
            "admin" => Self::Admin,
            "disconnect" => Self::Disconnect,
            "kill" => Self::Kill,
            "property" => Self::Property,
            "msg" => Self::Msg,
            "action" => Self::Action,
            "npmsg" => Self::Npmsg,
            "userinfo" => Self::Userinfo,
            "whois" => Self::Whois,
            "privchg" => Self::Privchg,
            _ => Self::Unknown,
        }
    }

    /// The wire token, or `None` for [`Command::Unknown`].
    pub fn as_str(&self) -> Option<&'static str> {
        let name = match self {
            Self::DamnClient => "dAmnClient",
            Self::DamnServer => "dAmnServer",
            Self::Login => "login",
            Self::Join => "join",
            Self::Part => "part",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Send => "send",
            Self::Recv => "recv",
            Self::Promote => "promote",
            Self::Demote => "demote",
            Self::Kick => "kick",
            Self::Kicked => "kicked",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Get => "get",
            Self::Set => "set",
            Self::Admin => "admin",
            Self::Disconnect => "disconnect",
            Self::Kill => "kill",
            Self::Property => "property",
            Self::Msg => "msg",
            Self::Action => "action",
            Self::Npmsg => "npmsg",
            Self::Userinfo => "userinfo",
            Self::Whois => "whois",
            Self::Privchg => "privchg",
            Self::Unknown => return None,
        };
        Some(name)
    }

    /// Returns `true` unless this is [`Command::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("unknown"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_every_known_token_round_trips() {
        for command in Command::KNOWN {
            let name = command.as_str().expect("known command has a name");
            assert_eq!(Command::from_name(name), command);
        }
    }

    #[test]
    fn test_from_name_is_case_sensitive() {
        assert_eq!(Command::from_name("dAmnServer"), Command::DamnServer);
        assert_eq!(Command::from_name("damnserver"), Command::Unknown);
        assert_eq!(Command::from_name("PING"), Command::Unknown);
    }

    #[test]
    fn test_from_name_unseen_token_is_unknown_not_error() {
        let cmd = Command::from_name("shinynewcommand");
        assert_eq!(cmd, Command::Unknown);
        assert!(!cmd.is_known());
        assert_eq!(cmd.as_str(), None);
        assert_eq!(cmd.to_string(), "unknown");
    }
}
