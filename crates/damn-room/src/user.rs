//! Users known to a session, and the registry that owns them.
//!
//! A user lives in the registry exactly as long as it is a member of at
//! least one joined chatroom. Chatrooms and privclasses refer to users by
//! name; the registry is the single owner.

use std::collections::{BTreeSet, HashMap};

use damn_protocol::MemberInfo;
use serde::Serialize;

const AVATAR_BASE: &str = "http://a.deviantart.com/avatars/";

/// Image format of a user's avatar, encoded in the low bits of `usericon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconFormat {
    Gif,
    Jpg,
    Png,
}

impl IconFormat {
    pub fn from_usericon(usericon: u32) -> Self {
        match usericon & 3 {
            2 => Self::Jpg,
            3 => Self::Png,
            _ => Self::Gif,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

/// A user seen in at least one joined chatroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    name: String,
    realname: String,
    typename: String,
    symbol: Option<char>,
    usericon: u32,
    gpc: String,
    /// Wire ids of the chatrooms this user is in.
    chatrooms: BTreeSet<String>,
}

impl User {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            realname: String::new(),
            typename: String::new(),
            symbol: None,
            usericon: 0,
            gpc: String::new(),
            chatrooms: BTreeSet::new(),
        }
    }

    /// Refreshes identity fields from the latest member properties.
    fn update(&mut self, info: &MemberInfo) {
        self.realname.clone_from(&info.realname);
        self.typename.clone_from(&info.typename);
        self.symbol = info.symbol;
        self.usericon = info.usericon;
        self.gpc.clone_from(&info.gpc);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn realname(&self) -> &str {
        &self.realname
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    pub fn symbol(&self) -> Option<char> {
        self.symbol
    }

    pub fn usericon(&self) -> u32 {
        self.usericon
    }

    /// Global privilege class, passed through as sent.
    pub fn gpc(&self) -> &str {
        &self.gpc
    }

    pub fn chatrooms(&self) -> impl Iterator<Item = &str> {
        self.chatrooms.iter().map(String::as_str)
    }

    pub fn is_in(&self, chatroom: &str) -> bool {
        self.chatrooms.contains(chatroom)
    }

    pub fn icon_format(&self) -> IconFormat {
        IconFormat::from_usericon(self.usericon)
    }

    /// Avatar URL: `default.<ext>` when the user has no custom icon,
    /// otherwise bucketed by the first two characters of the name.
    pub fn icon_url(&self) -> String {
        let ext = self.icon_format().extension();
        if self.usericon == 0 {
            return format!("{AVATAR_BASE}default.{ext}");
        }
        let name = self.name.to_lowercase();
        let mut chars = name.chars();
        let bucket = |c: Option<char>| match c {
            Some(c) if c.is_alphanumeric() => c,
            _ => '_',
        };
        let first = bucket(chars.next());
        let second = bucket(chars.next());
        format!("{AVATAR_BASE}{first}/{second}/{name}.{ext}")
    }

    pub fn profile_url(&self) -> String {
        format!("http://{}.deviantart.com/", self.name.to_lowercase())
    }
}

/// Session-scoped table of known users, keyed by username.
#[derive(Debug, Default, Serialize)]
pub struct UserRegistry {
    users: HashMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolves or creates `name`, refreshes its properties, and records
    /// its membership in `chatroom`.
    pub fn attach(&mut self, name: &str, info: &MemberInfo, chatroom: &str) -> &User {
        let user = self
            .users
            .entry(name.to_owned())
            .or_insert_with(|| User::new(name));
        user.update(info);
        user.chatrooms.insert(chatroom.to_owned());
        user
    }

    /// Drops `name`'s membership in `chatroom`, then collects the user if
    /// that was its last room.
    ///
    /// Returns `true` if the user was removed from the registry.
    pub fn detach(&mut self, name: &str, chatroom: &str) -> bool {
        match self.users.get_mut(name) {
            Some(user) => {
                user.chatrooms.remove(chatroom);
            }
            None => {
                tracing::warn!(user = name, chatroom, "detaching unknown user");
                return false;
            }
        }
        self.collect(name)
    }

    /// Removes `name` if it no longer belongs to any chatroom.
    ///
    /// This is the only place users leave the registry.
    pub fn collect(&mut self, name: &str) -> bool {
        let unused = self
            .users
            .get(name)
            .is_some_and(|user| user.chatrooms.is_empty());
        if unused {
            self.users.remove(name);
            tracing::debug!(user = name, "user collected");
        }
        unused
    }

    /// Forgets every user. Called on session teardown.
    pub fn clear(&mut self) {
        self.users.clear();
    }
}
