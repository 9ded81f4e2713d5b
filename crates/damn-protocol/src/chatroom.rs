//! Chatroom identifiers and their two textual forms.
//!
//! | kind    | display  | wire            |
//! |---------|----------|-----------------|
//! | public  | `#room`  | `chat:room`     |
//! | private | `peer`   | `pchat:a:b`     |
//!
//! A private chat is named after the other participant. Its wire form puts
//! both usernames in lexicographic order, so both sides of the
//! conversation produce the same string.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::ProtocolError;

/// Public chatroom or one-to-one private chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatroomKind {
    Public,
    Private,
}

/// Identifies a chatroom relative to the logged-in user.
///
/// Equality and hashing use the kind and name only. The local username is
/// carried along so private chats can regenerate their wire form.
#[derive(Debug, Clone, Serialize)]
pub struct ChatroomId {
    kind: ChatroomKind,
    name: String,
    #[serde(skip)]
    local: String,
}

impl ChatroomId {
    /// A public chatroom, `#name`.
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            kind: ChatroomKind::Public,
            name: name.into(),
            local: String::new(),
        }
    }

    /// A private chat between `local` and `peer`.
    pub fn private(peer: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            kind: ChatroomKind::Private,
            name: peer.into(),
            local: local.into(),
        }
    }

    /// Parses any of the accepted textual forms.
    ///
    /// `local` is the logged-in username (may be empty before login). It
    /// decides which half of a `pchat:a:b` identifier is the peer.
    ///
    /// Accepted inputs: `#name`, `chat:name`, `pchat:a:b`, and a bare
    /// `name`, which means a private chat with that user.
    pub fn parse(text: &str, local: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidChatroom(text.to_owned());

        if let Some(name) = text.strip_prefix('#') {
            return non_empty(name).map(|n| Self::public(n)).ok_or_else(invalid);
        }
        if let Some(name) = text.strip_prefix("chat:") {
            return non_empty(name).map(|n| Self::public(n)).ok_or_else(invalid);
        }
        if let Some(pair) = text.strip_prefix("pchat:") {
            let (a, b) = pair.split_once(':').ok_or_else(invalid)?;
            if a.is_empty() || b.is_empty() || b.contains(':') {
                return Err(invalid());
            }
            if local.is_empty() {
                return Ok(Self::private(pair, local));
            }
            let peer = if a == local {
                b
            } else if b == local {
                a
            } else {
                return Err(invalid());
            };
            return Ok(Self::private(peer, local));
        }
        if text.is_empty() || text.contains(':') || text.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self::private(text, local))
    }

    pub fn kind(&self) -> ChatroomKind {
        self.kind
    }

    /// Room name for public chats, the other participant for private ones.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatroomKind::Private
    }

    /// The protocol form: `chat:name` or `pchat:a:b` with `a < b`.
    pub fn to_wire(&self) -> String {
        match self.kind {
            ChatroomKind::Public => format!("chat:{}", self.name),
            ChatroomKind::Private if self.local.is_empty() => {
                format!("pchat:{}", self.name)
            }
            ChatroomKind::Private => {
                let (first, second) = match self.name.cmp(&self.local) {
                    Ordering::Greater => (&self.local, &self.name),
                    _ => (&self.name, &self.local),
                };
                format!("pchat:{first}:{second}")
            }
        }
    }

    /// The short form shown to people: `#name` or `name`.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

impl PartialEq for ChatroomId {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for ChatroomId {}

impl Hash for ChatroomId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ChatroomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChatroomKind::Public => write!(f, "#{}", self.name),
            ChatroomKind::Private => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash_form_is_public() {
        let id = ChatroomId::parse("#Botdom", "alice").expect("valid");
        assert_eq!(id.kind(), ChatroomKind::Public);
        assert_eq!(id.name(), "Botdom");
        assert_eq!(id.to_wire(), "chat:Botdom");
        assert_eq!(id.to_string(), "#Botdom");
    }

    #[test]
    fn test_parse_chat_wire_form_is_public() {
        let id = ChatroomId::parse("chat:Botdom", "").expect("valid");
        assert_eq!(id, ChatroomId::public("Botdom"));
    }

    #[test]
    fn test_parse_pchat_picks_other_party_and_reorders() {
        let id = ChatroomId::parse("pchat:zed:alice", "alice").expect("valid");
        assert!(id.is_private());
        assert_eq!(id.name(), "zed");
        assert_eq!(id.display_name(), "zed");
        assert_eq!(id.to_wire(), "pchat:alice:zed");
    }

    #[test]
    fn test_to_wire_private_is_symmetric_across_constructors() {
        let from_wire = ChatroomId::parse("pchat:alice:zed", "alice").expect("valid");
        let from_bare = ChatroomId::parse("zed", "alice").expect("valid");
        let built = ChatroomId::private("zed", "alice");
        assert_eq!(from_wire.to_wire(), "pchat:alice:zed");
        assert_eq!(from_bare.to_wire(), "pchat:alice:zed");
        assert_eq!(built.to_wire(), "pchat:alice:zed");
        assert_eq!(from_wire, from_bare);

        // The other participant's view produces the same wire string.
        let their_side = ChatroomId::private("alice", "zed");
        assert_eq!(their_side.to_wire(), "pchat:alice:zed");
    }

    #[test]
    fn test_to_wire_private_orders_names_case_sensitively() {
        // Uppercase sorts before lowercase, as the server orders them.
        assert_eq!(ChatroomId::private("Zed", "alice").to_wire(), "pchat:Zed:alice");
        assert_eq!(ChatroomId::private("alice", "Zed").to_wire(), "pchat:Zed:alice");
        assert_eq!(ChatroomId::private("bob", "Alice").to_wire(), "pchat:Alice:bob");
    }

    #[test]
    fn test_parse_pchat_matches_local_user_exactly() {
        let id = ChatroomId::parse("pchat:Zed:alice", "alice").expect("valid");
        assert_eq!(id.name(), "Zed");
        assert_eq!(id.to_wire(), "pchat:Zed:alice");
        assert!(ChatroomId::parse("pchat:Alice:bob", "alice").is_err());
    }

    #[test]
    fn test_parse_pchat_without_login_keeps_pair() {
        let id = ChatroomId::parse("pchat:a:b", "").expect("valid");
        assert_eq!(id.name(), "a:b");
        assert_eq!(id.to_wire(), "pchat:a:b");
    }

    #[test]
    fn test_parse_pchat_not_involving_local_user_errors() {
        let result = ChatroomId::parse("pchat:bob:carol", "alice");
        assert!(matches!(result, Err(ProtocolError::InvalidChatroom(_))));
    }

    #[test]
    fn test_parse_rejects_malformed_inputs() {
        for bad in ["", "#", "chat:", "pchat:", "pchat:solo", "pchat::x", "login:bob", "a b"] {
            assert!(
                ChatroomId::parse(bad, "alice").is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_equality_ignores_local_username() {
        let a = ChatroomId::private("zed", "alice");
        let b = ChatroomId::private("zed", "");
        assert_eq!(a, b);
        assert_ne!(ChatroomId::public("zed"), a);
    }

    #[test]
    fn test_serializes_kind_and_name() {
        let json = serde_json::to_value(ChatroomId::public("Botdom")).expect("serialize");
        assert_eq!(json, serde_json::json!({"kind": "public", "name": "Botdom"}));
    }
}
