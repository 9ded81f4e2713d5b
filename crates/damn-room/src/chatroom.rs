//! A joined chatroom: its properties, privclasses, and member table.
//!
//! The chatroom owns its privclasses. Members are tracked twice, once in
//! the `member → privclass` table here and once in the owning class's
//! member set; every mutation goes through [`Chatroom::place`] or
//! [`Chatroom::move_all`] so the two never disagree:
//!
//! ```text
//!   members                     privclasses
//!   ┌──────────┬──────────┐     ┌──────────────┬─────────────┐
//!   │ alice    │ Founders │ ──► │ Founders (99)│ {alice}     │
//!   │ bob      │ Members  │ ──► │ Members  (25)│ {bob, carl} │
//!   │ carl     │ Members  │     │ Banned   (1) │ {}          │
//!   └──────────┴──────────┘     └──────────────┴─────────────┘
//! ```
//!
//! Users themselves live in the session's [`UserRegistry`]; the chatroom
//! attaches and detaches them as members come and go.

use std::collections::HashMap;

use damn_protocol::events::{
    JoinEvent, KickEvent, PartEvent, PrivMoveEvent, PrivMoveKind, PrivRemoveEvent,
    PrivShowEvent, PrivUpdateEvent, PrivUpdateKind, PrivUsersEvent, PrivchgEvent,
    PropertyEvent, PropertyKind,
};
use damn_protocol::{ChatroomId, Event, MemberInfo, split_pair};
use serde::Serialize;

use crate::{
    DEFAULT_PRIVCLASS_ORDER, PrivClass, RoomError, RoomNotice, RoomNotification, UserRegistry,
};

/// A text property (title or topic) with its authorship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoomProperty {
    pub value: String,
    pub by: Option<String>,
    /// Unix seconds.
    pub timestamp: Option<u64>,
}

impl RoomProperty {
    fn from_event(event: &PropertyEvent) -> Self {
        Self {
            value: event.value.clone(),
            by: event.by.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// Parses one `order:name` line of a privclass list.
pub fn parse_privclass_line(line: &str) -> Result<(u32, &str), RoomError> {
    let invalid = || RoomError::InvalidPrivString(line.to_owned());
    let (order, name) = line.split_once(':').ok_or_else(invalid)?;
    let order = order.trim().parse().map_err(|_| invalid())?;
    if name.is_empty() {
        return Err(invalid());
    }
    Ok((order, name))
}

/// Model of one joined chatroom.
#[derive(Debug, Serialize)]
pub struct Chatroom {
    id: ChatroomId,
    #[serde(skip)]
    wire: String,
    title: Option<RoomProperty>,
    topic: Option<RoomProperty>,
    privclasses: HashMap<String, PrivClass>,
    /// member → privclass name
    members: HashMap<String, String>,
}

impl Chatroom {
    pub fn new(id: ChatroomId) -> Self {
        let wire = id.to_wire();
        Self {
            id,
            wire,
            title: None,
            topic: None,
            privclasses: HashMap::new(),
            members: HashMap::new(),
        }
    }

    pub fn id(&self) -> &ChatroomId {
        &self.id
    }

    /// The wire identifier, also the key users record their membership by.
    pub fn wire_id(&self) -> &str {
        &self.wire
    }

    pub fn title(&self) -> Option<&RoomProperty> {
        self.title.as_ref()
    }

    pub fn topic(&self) -> Option<&RoomProperty> {
        self.topic.as_ref()
    }

    pub fn privclass(&self, name: &str) -> Option<&PrivClass> {
        self.privclasses.get(name)
    }

    pub fn privclasses(&self) -> impl Iterator<Item = &PrivClass> {
        self.privclasses.values()
    }

    /// Privclasses from highest to lowest order.
    pub fn privclasses_by_order(&self) -> Vec<&PrivClass> {
        let mut classes: Vec<_> = self.privclasses.values().collect();
        classes.sort_by(|a, b| b.order().cmp(&a.order()).then_with(|| a.name().cmp(b.name())));
        classes
    }

    /// The privclass `username` belongs to here.
    pub fn privclass_of(&self, username: &str) -> Option<&str> {
        self.members.get(username).map(String::as_str)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, username: &str) -> bool {
        self.members.contains_key(username)
    }

    /// The class new joiners land in: the one with order 25.
    ///
    /// That order is a server convention, not a protocol guarantee, so
    /// absence is an ordinary outcome. Ties go to the smallest name.
    pub fn default_privclass(&self) -> Option<&PrivClass> {
        self.privclasses
            .values()
            .filter(|class| class.order() == DEFAULT_PRIVCLASS_ORDER)
            .min_by(|a, b| a.name().cmp(b.name()))
    }

    pub fn insert_privclass(&mut self, class: PrivClass) -> Result<(), RoomError> {
        if self.privclasses.contains_key(class.name()) {
            return Err(RoomError::DuplicatePrivClass(class.name().to_owned()));
        }
        self.privclasses.insert(class.name().to_owned(), class);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Property pushes
    // ---------------------------------------------------------------

    /// Applies a `property` push to the model.
    pub fn apply_property(&mut self, event: &PropertyEvent, users: &mut UserRegistry) {
        match event.kind {
            PropertyKind::Title => self.title = Some(RoomProperty::from_event(event)),
            PropertyKind::Topic => self.topic = Some(RoomProperty::from_event(event)),
            PropertyKind::Privclasses => self.update_privclasses(&event.value),
            PropertyKind::Members => self.process_members(&event.value, users),
            PropertyKind::Unknown => {
                tracing::warn!(chatroom = %self.id, property = %event.name, "unknown room property");
            }
        }
    }

    /// Resynchronizes privclass orders from an `order:name` list.
    ///
    /// Existing classes keep their privileges and members and only take
    /// the new order. Classes missing from the list are left alone.
    pub fn update_privclasses(&mut self, raw: &str) {
        for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
            match parse_privclass_line(line) {
                Ok((order, name)) => match self.privclasses.get_mut(name) {
                    Some(class) => class.set_order(order),
                    None => {
                        self.privclasses
                            .insert(name.to_owned(), PrivClass::new(name, order));
                    }
                },
                Err(e) => tracing::warn!(chatroom = %self.id, error = %e, "skipping privclass line"),
            }
        }
        tracing::debug!(chatroom = %self.id, count = self.privclasses.len(), "privclasses updated");
    }

    /// Applies a bulk member dump.
    ///
    /// `member <name>` opens a record, following `key=value` lines fill it
    /// in, and the next `member` line or the end of input adds it.
    pub fn process_members(&mut self, raw: &str, users: &mut UserRegistry) {
        let mut pending: Option<(String, MemberInfo)> = None;

        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            if let Some(name) = line.strip_prefix("member ") {
                if let Some((name, info)) = pending.take() {
                    self.add_member(&name, &info, users);
                }
                pending = Some((name.trim().to_owned(), MemberInfo::default()));
                continue;
            }

            match (pending.as_mut(), split_pair(line)) {
                (Some((name, info)), Some((key, value))) => {
                    if let Err(e) = info.set_field(key, value) {
                        tracing::warn!(chatroom = %self.id, user = %name, error = %e, "ignoring member property");
                    }
                }
                (None, _) => {
                    tracing::warn!(chatroom = %self.id, line, "member property before any member line");
                }
                (Some(_), None) => {
                    tracing::warn!(chatroom = %self.id, line, "malformed member line");
                }
            }
        }

        if let Some((name, info)) = pending {
            self.add_member(&name, &info, users);
        }
    }

    // ---------------------------------------------------------------
    // Membership primitives
    // ---------------------------------------------------------------

    /// Adds or refreshes a member.
    ///
    /// An empty `pc` falls back to the default class. A named class that
    /// does not exist yet is created with order 0 and a warning, so the
    /// member is never dropped.
    pub fn add_member(&mut self, username: &str, info: &MemberInfo, users: &mut UserRegistry) {
        let class = if info.privclass.is_empty() {
            match self.default_privclass() {
                Some(class) => class.name().to_owned(),
                None => {
                    tracing::warn!(chatroom = %self.id, user = username, "member without privclass and no default class");
                    String::new()
                }
            }
        } else {
            info.privclass.clone()
        };
        self.place(username, &class);
        users.attach(username, info, &self.wire);
    }

    /// Removes a member and lets the registry collect the user if this
    /// was its last chatroom. Returns the class the member was in.
    pub fn remove_member(
        &mut self,
        username: &str,
        users: &mut UserRegistry,
    ) -> Result<String, RoomError> {
        let Some(class) = self.members.remove(username) else {
            return Err(self.member_not_found(username));
        };
        if let Some(privclass) = self.privclasses.get_mut(&class) {
            privclass.remove_member(username);
        }
        users.detach(username, &self.wire);
        Ok(class)
    }

    /// Moves one existing member into an existing class.
    pub fn move_member(&mut self, username: &str, dst: &str) -> Result<(), RoomError> {
        if !self.members.contains_key(username) {
            return Err(self.member_not_found(username));
        }
        if !self.privclasses.contains_key(dst) {
            return Err(self.privclass_not_found(dst));
        }
        self.place(username, dst);
        Ok(())
    }

    /// Moves every member of `src` into `dst` and returns how many moved.
    pub fn move_all(&mut self, src: &str, dst: &str) -> Result<usize, RoomError> {
        if !self.privclasses.contains_key(dst) {
            return Err(self.privclass_not_found(dst));
        }
        let Some(source) = self.privclasses.get_mut(src) else {
            return Err(self.privclass_not_found(src));
        };
        if src == dst {
            return Ok(source.member_count());
        }

        let moved = source.take_members();
        if let Some(target) = self.privclasses.get_mut(dst) {
            for username in &moved {
                target.insert_member(username);
            }
        }
        for username in &moved {
            self.members.insert(username.clone(), dst.to_owned());
        }
        Ok(moved.len())
    }

    /// Renames `prev` to `name`, keeping order and privileges. An existing
    /// `name` absorbs the members instead.
    pub fn rename_privclass(&mut self, prev: &str, name: &str) -> Result<usize, RoomError> {
        let Some(source) = self.privclasses.get(prev) else {
            return Err(self.privclass_not_found(prev));
        };
        if prev == name {
            return Ok(source.member_count());
        }
        if !self.privclasses.contains_key(name) {
            let renamed = source.renamed(name);
            self.privclasses.insert(name.to_owned(), renamed);
        }
        let moved = self.move_all(prev, name)?;
        self.privclasses.remove(prev);
        Ok(moved)
    }

    /// Deletes a class, moving its members to the default class first.
    ///
    /// Without a default class to receive them (or when `name` is the
    /// default), the class is kept and nothing moves.
    pub fn remove_privclass(&mut self, name: &str) -> Result<usize, RoomError> {
        if !self.privclasses.contains_key(name) {
            return Err(self.privclass_not_found(name));
        }
        let target = self
            .default_privclass()
            .map(|class| class.name().to_owned())
            .filter(|target| target != name);
        let Some(target) = target else {
            tracing::warn!(chatroom = %self.id, privclass = name, "no default privclass to receive members; keeping class");
            return Ok(0);
        };
        let moved = self.move_all(name, &target)?;
        self.privclasses.remove(name);
        Ok(moved)
    }

    /// Drops every member, detaching them from the registry. Called when
    /// the local user leaves or is kicked.
    pub fn release_all(&mut self, users: &mut UserRegistry) {
        for username in self.members.keys() {
            users.detach(username, &self.wire);
        }
        self.members.clear();
        for class in self.privclasses.values_mut() {
            class.take_members();
        }
    }

    /// Puts `username` in `class`, creating the class if needed, and
    /// returns the class it was in before.
    fn place(&mut self, username: &str, class: &str) -> Option<String> {
        self.ensure_privclass(class).insert_member(username);
        let previous = self
            .members
            .insert(username.to_owned(), class.to_owned());
        if let Some(prev) = previous.as_deref().filter(|prev| *prev != class) {
            if let Some(old) = self.privclasses.get_mut(prev) {
                old.remove_member(username);
            }
        }
        previous
    }

    fn ensure_privclass(&mut self, name: &str) -> &mut PrivClass {
        let chatroom = &self.id;
        self.privclasses.entry(name.to_owned()).or_insert_with(|| {
            tracing::warn!(chatroom = %chatroom, privclass = name, "unknown privclass, creating placeholder");
            PrivClass::new(name, 0)
        })
    }

    fn member_not_found(&self, username: &str) -> RoomError {
        RoomError::MemberNotFound {
            chatroom: self.id.to_string(),
            user: username.to_owned(),
        }
    }

    fn privclass_not_found(&self, name: &str) -> RoomError {
        RoomError::PrivClassNotFound {
            chatroom: self.id.to_string(),
            name: name.to_owned(),
        }
    }

    fn check_affected(&self, privclass: &str, reported: Option<u32>, moved: usize) {
        match reported {
            Some(n) if n as usize != moved => {
                tracing::warn!(chatroom = %self.id, privclass, reported = n, moved, "affected member count mismatch");
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------
    // Event application
    // ---------------------------------------------------------------

    pub fn notify_join(
        &mut self,
        event: &JoinEvent,
        users: &mut UserRegistry,
    ) -> Vec<RoomNotification> {
        self.add_member(&event.username, &event.member, users);
        let privclass = self
            .privclass_of(&event.username)
            .unwrap_or_default()
            .to_owned();
        tracing::info!(chatroom = %self.id, user = %event.username, privclass = %privclass, "member joined");
        vec![
            RoomNotification::Event(Event::Join(event.clone())),
            RoomNotification::Notice(RoomNotice::Joined {
                chatroom: self.id.clone(),
                username: event.username.clone(),
                privclass,
            }),
        ]
    }

    pub fn notify_part(
        &mut self,
        event: &PartEvent,
        users: &mut UserRegistry,
    ) -> Vec<RoomNotification> {
        if let Err(e) = self.remove_member(&event.username, users) {
            tracing::warn!(error = %e, "part for unknown member");
        }
        tracing::info!(chatroom = %self.id, user = %event.username, "member parted");
        vec![
            RoomNotification::Event(Event::Part(event.clone())),
            RoomNotification::Notice(RoomNotice::Parted {
                chatroom: self.id.clone(),
                username: event.username.clone(),
                reason: event.reason.clone(),
            }),
        ]
    }

    pub fn notify_kick(
        &mut self,
        event: &KickEvent,
        users: &mut UserRegistry,
    ) -> Vec<RoomNotification> {
        if let Err(e) = self.remove_member(&event.username, users) {
            tracing::warn!(error = %e, "kick for unknown member");
        }
        tracing::info!(chatroom = %self.id, user = %event.username, by = %event.by, "member kicked");
        vec![
            RoomNotification::Event(Event::Kick(event.clone())),
            RoomNotification::Notice(RoomNotice::Kicked {
                chatroom: self.id.clone(),
                username: event.username.clone(),
                by: event.by.clone(),
                reason: event.reason.clone(),
            }),
        ]
    }

    /// Moves a present member to their new class. Absent users can be
    /// promoted too; for them only the event is forwarded.
    pub fn notify_privchg(&mut self, event: &PrivchgEvent) -> Vec<RoomNotification> {
        let from = if self.has_member(&event.username) {
            self.place(&event.username, &event.privclass)
        } else {
            tracing::debug!(chatroom = %self.id, user = %event.username, "privchg for a user not in the room");
            self.ensure_privclass(&event.privclass);
            None
        };
        vec![
            RoomNotification::Event(Event::Privchg(event.clone())),
            RoomNotification::Notice(RoomNotice::PrivclassChanged {
                chatroom: self.id.clone(),
                username: event.username.clone(),
                from,
                to: event.privclass.clone(),
                by: event.by.clone(),
            }),
        ]
    }

    pub fn notify_priv_update(&mut self, event: &PrivUpdateEvent) -> Vec<RoomNotification> {
        match event.kind {
            PrivUpdateKind::Create => {
                if let Err(e) = self.insert_privclass(PrivClass::new(&event.name, 0)) {
                    tracing::warn!(chatroom = %self.id, error = %e, "create for existing privclass");
                }
            }
            PrivUpdateKind::Update => {}
        }
        self.ensure_privclass(&event.name).apply(&event.privs);
        vec![RoomNotification::Event(Event::PrivUpdate(event.clone()))]
    }

    pub fn notify_priv_move(&mut self, event: &PrivMoveEvent) -> Vec<RoomNotification> {
        let result = match event.kind {
            PrivMoveKind::Rename => self.rename_privclass(&event.prev, &event.name),
            PrivMoveKind::Move => {
                self.ensure_privclass(&event.name);
                self.move_all(&event.prev, &event.name)
            }
        };
        let mut out = vec![RoomNotification::Event(Event::PrivMove(event.clone()))];
        match result {
            Ok(moved) => {
                self.check_affected(&event.prev, event.affected, moved);
                out.push(RoomNotification::Notice(RoomNotice::PrivclassMoved {
                    chatroom: self.id.clone(),
                    from: event.prev.clone(),
                    to: event.name.clone(),
                    moved,
                }));
            }
            Err(e) => tracing::warn!(error = %e, "privclass move not applied"),
        }
        out
    }

    pub fn notify_priv_remove(&mut self, event: &PrivRemoveEvent) -> Vec<RoomNotification> {
        match self.remove_privclass(&event.name) {
            Ok(moved) => self.check_affected(&event.name, event.affected, moved),
            Err(e) => tracing::warn!(error = %e, "privclass removal not applied"),
        }
        vec![RoomNotification::Event(Event::PrivRemove(event.clone()))]
    }

    /// Applies privilege strings from an `admin show privclass` reply.
    pub fn notify_priv_show(&mut self, event: &PrivShowEvent) -> Vec<RoomNotification> {
        for entry in &event.entries {
            self.ensure_privclass(&entry.name).apply(&entry.privs);
        }
        vec![RoomNotification::Event(Event::PrivShow(event.clone()))]
    }

    /// Applies class memberships from an `admin show users` reply.
    ///
    /// The reply lists everyone assigned to a class; only users currently
    /// in the room are placed.
    pub fn notify_priv_users(&mut self, event: &PrivUsersEvent) -> Vec<RoomNotification> {
        for class in &event.classes {
            for username in &class.users {
                if self.has_member(username) {
                    self.place(username, &class.name);
                } else {
                    tracing::debug!(chatroom = %self.id, user = %username, privclass = %class.name, "listed user not in the room");
                }
            }
        }
        vec![RoomNotification::Event(Event::PrivUsers(event.clone()))]
    }
}
