//! Privilege classes: named, ordered permission bundles.
//!
//! Every chatroom member sits in exactly one privclass. The server
//! describes a class's permissions with a privilege string:
//!
//! ```text
//! order=75 +kick +title -images smilies=2
//! ```
//!
//! - `+priv` grants a boolean privilege (value 1)
//! - `-priv` revokes it (value 0)
//! - `priv=N` sets a level
//! - `order=N` sets the class rank
//!
//! Privileges the server never mentioned stay unset (`None`), so a class
//! created from a bare `order:name` list line is distinguishable from one
//! whose permissions are known.

use std::collections::BTreeSet;

use serde::Serialize;

/// Order of the class new joiners land in, by server convention.
pub const DEFAULT_PRIVCLASS_ORDER: u32 = 25;

/// The permission fields of a privclass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Privileges {
    pub join: Option<bool>,
    pub title: Option<bool>,
    pub topic: Option<bool>,
    pub kick: Option<bool>,
    pub msg: Option<bool>,
    pub shownotice: Option<bool>,
    pub admin: Option<bool>,
    pub images: Option<i32>,
    pub smilies: Option<i32>,
    pub emoticons: Option<i32>,
    pub thumbs: Option<i32>,
    pub avatars: Option<i32>,
    pub websites: Option<i32>,
    pub objects: Option<i32>,
}

impl Privileges {
    /// Sets one named privilege. Returns `false` for names not in the table.
    pub fn set(&mut self, name: &str, value: i32) -> bool {
        let flag = Some(value != 0);
        let level = Some(value);
        match name {
            "join" => self.join = flag,
            "title" => self.title = flag,
            "topic" => self.topic = flag,
            "kick" => self.kick = flag,
            "msg" => self.msg = flag,
            "shownotice" => self.shownotice = flag,
            "admin" => self.admin = flag,
            "images" => self.images = level,
            "smilies" => self.smilies = level,
            "emoticons" => self.emoticons = level,
            "thumbs" => self.thumbs = level,
            "avatars" => self.avatars = level,
            "websites" => self.websites = level,
            "objects" => self.objects = level,
            _ => return false,
        }
        true
    }
}

/// A named privclass with its rank, permissions, and current members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivClass {
    name: String,
    order: u32,
    privileges: Privileges,
    members: BTreeSet<String>,
}

impl PrivClass {
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            order,
            privileges: Privileges::default(),
            members: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    pub fn privileges(&self) -> &Privileges {
        &self.privileges
    }

    /// Applies a privilege string. Unknown or malformed tokens are skipped
    /// with a warning; the rest still apply.
    pub fn apply(&mut self, privs: &str) {
        for token in privs.split_whitespace() {
            let (priv_name, value) = if let Some(name) = token.strip_prefix('+') {
                (name, Some(1))
            } else if let Some(name) = token.strip_prefix('-') {
                (name, Some(0))
            } else if let Some((name, value)) = token.split_once('=') {
                (name, value.parse::<i32>().ok())
            } else {
                (token, None)
            };

            let Some(value) = value else {
                tracing::warn!(privclass = %self.name, token, "malformed privilege token");
                continue;
            };

            if priv_name == "order" {
                match u32::try_from(value) {
                    Ok(order) => self.order = order,
                    Err(_) => tracing::warn!(privclass = %self.name, value, "negative order"),
                }
            } else if !self.privileges.set(priv_name, value) {
                tracing::warn!(privclass = %self.name, privilege = priv_name, "unknown privilege");
            }
        }
    }

    /// Usernames currently in this class, sorted.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, username: &str) -> bool {
        self.members.contains(username)
    }

    pub(crate) fn insert_member(&mut self, username: &str) -> bool {
        self.members.insert(username.to_owned())
    }

    pub(crate) fn remove_member(&mut self, username: &str) -> bool {
        self.members.remove(username)
    }

    pub(crate) fn take_members(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.members)
    }

    /// A copy under a new name with the same rank and permissions, no members.
    pub(crate) fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            order: self.order,
            privileges: self.privileges,
            members: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_plus_minus_and_levels() {
        let mut class = PrivClass::new("Members", 25);
        class.apply("+msg -kick images=2 +join");
        let privs = class.privileges();
        assert_eq!(privs.msg, Some(true));
        assert_eq!(privs.kick, Some(false));
        assert_eq!(privs.images, Some(2));
        assert_eq!(privs.join, Some(true));
        assert_eq!(privs.admin, None);
    }

    #[test]
    fn test_apply_order_token_sets_rank() {
        let mut class = PrivClass::new("Operators", 0);
        class.apply("order=75 +kick");
        assert_eq!(class.order(), 75);
        assert_eq!(class.privileges().kick, Some(true));
    }

    #[test]
    fn test_apply_skips_unknown_and_malformed_tokens() {
        let mut class = PrivClass::new("Odd", 10);
        class.apply("+teleport smilies=lots order=-3 +msg justaword");
        assert_eq!(class.privileges().msg, Some(true));
        assert_eq!(class.privileges().smilies, None);
        assert_eq!(class.order(), 10);
    }

    #[test]
    fn test_apply_later_tokens_override_earlier() {
        let mut class = PrivClass::new("Flip", 1);
        class.apply("+msg -msg");
        assert_eq!(class.privileges().msg, Some(false));
    }

    #[test]
    fn test_renamed_keeps_permissions_drops_members() {
        let mut class = PrivClass::new("Old", 40);
        class.apply("+msg");
        class.insert_member("bob");
        let renamed = class.renamed("New");
        assert_eq!(renamed.name(), "New");
        assert_eq!(renamed.order(), 40);
        assert_eq!(renamed.privileges().msg, Some(true));
        assert_eq!(renamed.member_count(), 0);
    }
}
