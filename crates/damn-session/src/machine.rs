//! The session state machine.
//!
//! [`Session`] does no I/O. The owner feeds it connection lifecycle calls
//! and received bytes, then drains [`SessionOutput`] items: bytes to
//! write, a request to close the socket, and events for observers.
//!
//! ```text
//!   transport ──bytes──→ receive() ──→ Framer ──→ Event::decode ──→ dispatch
//!                                                                     │
//!        ┌──────────────────────────── drain_output() ←───────────────┘
//!        ▼
//!   Transmit(bytes) │ Disconnect │ Event(SessionEvent)
//! ```
//!
//! Everything runs synchronously inside the calling task, in arrival
//! order, so the room model needs no locking.

use std::collections::{HashMap, VecDeque};

use damn_protocol::events::{HandshakeEvent, LoginEvent};
use damn_protocol::{ChatroomId, Event, Framer, MemberInfo, Packet, requests};
use damn_room::{Chatroom, RoomNotice, RoomNotification, UserRegistry};
use serde::Serialize;

use crate::{Credentials, SessionConfig, SessionState};

/// Something observers should know about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    /// The server speaks another protocol version. Credentials were not
    /// sent; the connection should be closed.
    VersionMismatch { expected: String, received: String },
    Protocol { event: Event },
    Notice { notice: RoomNotice },
}

impl From<RoomNotification> for SessionEvent {
    fn from(notification: RoomNotification) -> Self {
        match notification {
            RoomNotification::Event(event) => Self::Protocol { event },
            RoomNotification::Notice(notice) => Self::Notice { notice },
        }
    }
}

/// An action the session asks its owner to perform.
#[derive(Debug, Clone)]
pub enum SessionOutput {
    /// Write these bytes to the socket.
    Transmit(Vec<u8>),
    /// Close the socket.
    Disconnect,
    Event(SessionEvent),
}

/// One client connection to a dAmn server.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    credentials: Credentials,
    state: SessionState,
    framer: Framer,
    identity: Option<MemberInfo>,
    /// Joined chatrooms, keyed by lowercased wire id.
    chatrooms: HashMap<String, Chatroom>,
    users: UserRegistry,
    output: VecDeque<SessionOutput>,
}

impl Session {
    pub fn new(config: SessionConfig, credentials: Credentials) -> Self {
        let framer = Framer::with_max_frame_len(config.max_frame_len);
        Self {
            config,
            credentials,
            state: SessionState::Offline,
            framer,
            identity: None,
            chatrooms: HashMap::new(),
            users: UserRegistry::new(),
            output: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Identity fields from the login reply, once online.
    pub fn identity(&self) -> Option<&MemberInfo> {
        self.identity.as_ref()
    }

    pub fn chatroom(&self, id: &ChatroomId) -> Option<&Chatroom> {
        self.chatrooms.get(&room_key(id))
    }

    pub fn chatrooms(&self) -> impl Iterator<Item = &Chatroom> {
        self.chatrooms.values()
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    /// Parses a chatroom identifier relative to this session's user.
    pub fn parse_chatroom(&self, text: &str) -> Result<ChatroomId, crate::SessionError> {
        Ok(ChatroomId::parse(text, self.username())?)
    }

    /// Takes everything queued since the last call, oldest first.
    pub fn drain_output(&mut self) -> Vec<SessionOutput> {
        self.output.drain(..).collect()
    }

    // ---------------------------------------------------------------
    // Connection lifecycle
    // ---------------------------------------------------------------

    /// Starts a connection attempt. Only valid from `Offline`; anything
    /// else is ignored with a warning and returns `false`.
    pub fn connect_to_host(&mut self) -> bool {
        if self.state != SessionState::Offline {
            tracing::warn!(state = %self.state, "connect requested while not offline; ignoring");
            return false;
        }
        tracing::info!(host = %self.config.host, port = self.config.port, "connecting");
        self.set_state(SessionState::Connecting);
        true
    }

    /// The socket is up: send the handshake and wait for the server's.
    pub fn on_connected(&mut self) {
        if self.state != SessionState::Connecting {
            tracing::warn!(state = %self.state, "socket connected in unexpected state");
        }
        self.set_state(SessionState::Connected);
        let handshake = requests::handshake(&self.config.protocol_version, &self.config.agent);
        self.transmit(&handshake);
        self.set_state(SessionState::LoggingIn);
    }

    /// The socket is gone. Drops all chatrooms and users and any partial
    /// frame, so the next connection starts clean.
    pub fn on_disconnected(&mut self) {
        for room in self.chatrooms.values_mut() {
            room.release_all(&mut self.users);
        }
        self.chatrooms.clear();
        self.users.clear();
        self.framer.reset();
        self.identity = None;
        self.set_state(SessionState::Offline);
    }

    /// Feeds received bytes and dispatches every packet they complete.
    pub fn receive(&mut self, bytes: &[u8]) {
        for packet in self.framer.feed(bytes) {
            self.handle_packet(&packet);
        }
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    /// Decodes and applies a single packet.
    ///
    /// Packets that fail to decode are logged and dropped; the session
    /// keeps going.
    pub fn handle_packet(&mut self, packet: &Packet) {
        tracing::debug!(command = packet.command_name(), param = packet.param(), "packet received");
        let event = match Event::decode(packet, self.credentials.username()) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(command = packet.command_name(), error = %e, "dropping undecodable packet");
                return;
            }
        };

        match event {
            Event::Handshake(handshake) => self.on_handshake(handshake),
            Event::Login(login) => self.on_login(login),
            Event::Ping => {
                self.transmit(&requests::pong());
                self.emit(SessionEvent::Protocol { event: Event::Ping });
            }
            Event::Joined(joined) => {
                if joined.is_ok() {
                    tracing::info!(chatroom = %joined.chatroom, "joined");
                    self.chatrooms
                        .entry(room_key(&joined.chatroom))
                        .or_insert_with(|| Chatroom::new(joined.chatroom.clone()));
                } else {
                    tracing::warn!(chatroom = %joined.chatroom, reason = %joined.message, "join refused");
                }
                self.emit_protocol(Event::Joined(joined));
            }
            Event::Parted(parted) => {
                if parted.is_ok() {
                    tracing::info!(chatroom = %parted.chatroom, "parted");
                    self.drop_chatroom(&parted.chatroom);
                } else {
                    tracing::warn!(chatroom = %parted.chatroom, reason = %parted.message, "part refused");
                }
                self.emit_protocol(Event::Parted(parted));
            }
            Event::Kicked(kicked) => {
                tracing::info!(chatroom = %kicked.chatroom, by = %kicked.by, "kicked from chatroom");
                self.drop_chatroom(&kicked.chatroom);
                self.emit_protocol(Event::Kicked(kicked));
            }
            Event::Disconnect(disconnect) => {
                tracing::info!(reason = %disconnect.message, "server closed the session");
                self.emit_protocol(Event::Disconnect(disconnect));
                self.output.push_back(SessionOutput::Disconnect);
                self.on_disconnected();
            }
            Event::Unknown(packet) => {
                tracing::debug!(command = packet.command_name(), "unhandled packet");
                self.emit_protocol(Event::Unknown(packet));
            }
            event @ (Event::Property(_)
            | Event::Join(_)
            | Event::Part(_)
            | Event::Kick(_)
            | Event::Privchg(_)
            | Event::PrivUpdate(_)
            | Event::PrivMove(_)
            | Event::PrivRemove(_)
            | Event::PrivShow(_)
            | Event::PrivUsers(_)) => self.apply_room_event(event),
            other => self.emit_protocol(other),
        }
    }

    fn on_handshake(&mut self, handshake: HandshakeEvent) {
        if self.state != SessionState::LoggingIn {
            tracing::warn!(state = %self.state, "unexpected server handshake");
        }
        let expected = self.config.protocol_version.clone();
        let matches = handshake.matches(&expected);
        let received = handshake.version.clone();
        self.emit_protocol(Event::Handshake(handshake));

        if !matches {
            tracing::error!(%expected, %received, "protocol version mismatch; not logging in");
            self.emit(SessionEvent::VersionMismatch { expected, received });
            return;
        }
        tracing::debug!(user = %self.credentials.username(), "handshake accepted, sending login");
        let login = requests::login(self.credentials.username(), self.credentials.token());
        self.transmit(&login);
    }

    fn on_login(&mut self, login: LoginEvent) {
        if login.is_ok() {
            tracing::info!(user = %login.username, "logged in");
            self.identity = login.identity.clone();
            self.emit_protocol(Event::Login(login));
            self.set_state(SessionState::Online);
        } else {
            tracing::error!(user = %login.username, reason = %login.message, "login failed");
            self.emit_protocol(Event::Login(login));
            self.output.push_back(SessionOutput::Disconnect);
            self.on_disconnected();
        }
    }

    /// Routes a chatroom-scoped event to its room and forwards what the
    /// room reports back.
    fn apply_room_event(&mut self, event: Event) {
        let Some(key) = event.chatroom().map(room_key) else {
            self.emit_protocol(event);
            return;
        };
        let Some(room) = self.chatrooms.get_mut(&key) else {
            tracing::warn!(chatroom = %key, "event for a chatroom not joined");
            self.emit_protocol(event);
            return;
        };

        let users = &mut self.users;
        let notifications = match &event {
            Event::Property(e) => {
                room.apply_property(e, users);
                vec![RoomNotification::Event(event.clone())]
            }
            Event::Join(e) => room.notify_join(e, users),
            Event::Part(e) => room.notify_part(e, users),
            Event::Kick(e) => room.notify_kick(e, users),
            Event::Privchg(e) => room.notify_privchg(e),
            Event::PrivUpdate(e) => room.notify_priv_update(e),
            Event::PrivMove(e) => room.notify_priv_move(e),
            Event::PrivRemove(e) => room.notify_priv_remove(e),
            Event::PrivShow(e) => room.notify_priv_show(e),
            Event::PrivUsers(e) => room.notify_priv_users(e),
            _ => vec![RoomNotification::Event(event.clone())],
        };
        for notification in notifications {
            self.emit(notification.into());
        }
    }

    fn drop_chatroom(&mut self, id: &ChatroomId) {
        match self.chatrooms.remove(&room_key(id)) {
            Some(mut room) => room.release_all(&mut self.users),
            None => tracing::warn!(chatroom = %id, "leaving a chatroom that was not joined"),
        }
    }

    // ---------------------------------------------------------------
    // Output helpers
    // ---------------------------------------------------------------

    pub(crate) fn is_joined(&self, id: &ChatroomId) -> bool {
        self.chatrooms.contains_key(&room_key(id))
    }

    pub(crate) fn transmit(&mut self, packet: &Packet) {
        tracing::debug!(command = packet.command_name(), param = packet.param(), "packet sent");
        self.output.push_back(SessionOutput::Transmit(packet.encode()));
    }

    fn emit(&mut self, event: SessionEvent) {
        self.output.push_back(SessionOutput::Event(event));
    }

    fn emit_protocol(&mut self, event: Event) {
        self.emit(SessionEvent::Protocol { event });
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        tracing::info!(%from, %to, "session state changed");
        self.state = to;
        self.emit(SessionEvent::StateChanged { from, to });
    }
}

/// Map key for a chatroom. The server is not consistent about the case
/// it echoes room names in.
fn room_key(id: &ChatroomId) -> String {
    id.to_wire().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn session() -> Session {
        let creds = Credentials::new("alice", TOKEN).expect("valid");
        Session::new(SessionConfig::default(), creds)
    }

    fn transmitted(out: &[SessionOutput]) -> Vec<String> {
        out.iter()
            .filter_map(|o| match o {
                SessionOutput::Transmit(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    fn online() -> Session {
        let mut s = session();
        s.connect_to_host();
        s.on_connected();
        s.receive(b"dAmnServer 0.3\n\n\0login alice\ne=ok\n\n\0");
        s.drain_output();
        s
    }

    #[test]
    fn test_connect_to_host_only_from_offline() {
        let mut s = session();
        assert!(s.connect_to_host());
        assert_eq!(s.state(), SessionState::Connecting);
        assert!(!s.connect_to_host());
        assert_eq!(s.state(), SessionState::Connecting);
    }

    #[test]
    fn test_on_connected_sends_handshake_and_logs_in() {
        let mut s = session();
        s.connect_to_host();
        s.on_connected();
        assert_eq!(s.state(), SessionState::LoggingIn);
        let sent = transmitted(&s.drain_output());
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("dAmnClient 0.3\nagent=damn-rs/"));
    }

    #[test]
    fn test_handshake_match_sends_credentials() {
        let mut s = session();
        s.connect_to_host();
        s.on_connected();
        s.drain_output();

        s.receive(b"dAmnServer 0.3\n\n\0");
        let sent = transmitted(&s.drain_output());
        assert_eq!(sent, vec![format!("login alice\npk={TOKEN}\n\n\0")]);
    }

    #[test]
    fn test_handshake_mismatch_withholds_credentials() {
        let mut s = session();
        s.connect_to_host();
        s.on_connected();
        s.drain_output();

        s.receive(b"dAmnServer 0.2\n\n\0");
        let out = s.drain_output();
        assert!(transmitted(&out).is_empty());
        assert!(out.iter().any(|o| matches!(
            o,
            SessionOutput::Event(SessionEvent::VersionMismatch { received, .. }) if received == "0.2"
        )));
    }

    #[test]
    fn test_login_ok_goes_online_with_identity() {
        let mut s = session();
        s.connect_to_host();
        s.on_connected();
        s.receive(b"dAmnServer 0.3\n\n\0login alice\ne=ok\n\nsymbol=~\nrealname=Alice\n\0");
        assert_eq!(s.state(), SessionState::Online);
        assert_eq!(s.identity().map(|i| i.realname.as_str()), Some("Alice"));
    }

    #[test]
    fn test_login_failure_requests_disconnect() {
        let mut s = session();
        s.connect_to_host();
        s.on_connected();
        s.receive(b"dAmnServer 0.3\n\n\0login alice\ne=authentication failed\n\n\0");
        assert_eq!(s.state(), SessionState::Offline);
        assert!(s.drain_output().iter().any(|o| matches!(o, SessionOutput::Disconnect)));
    }

    #[test]
    fn test_ping_is_answered_with_pong() {
        let mut s = online();
        s.receive(b"ping\n\n\0");
        assert_eq!(transmitted(&s.drain_output()), vec!["pong\n\n\0".to_owned()]);
    }

    #[test]
    fn test_join_then_members_populates_model() {
        let mut s = online();
        s.receive(b"join chat:Botdom\ne=ok\n\n\0");
        s.receive(b"property chat:Botdom\np=privclasses\n\n25:Members\n99:Founders\n\0");
        s.receive(b"property chat:Botdom\np=members\n\nmember zed\npc=Founders\nusericon=1\n\nmember bob\npc=Members\n\0");

        let room = s.chatroom(&ChatroomId::public("Botdom")).expect("joined");
        assert_eq!(room.privclass_of("zed"), Some("Founders"));
        assert_eq!(room.member_count(), 2);
        assert!(s.users().contains("bob"));
    }

    #[test]
    fn test_peer_join_emits_event_then_notice() {
        let mut s = online();
        s.receive(b"join chat:Botdom\ne=ok\n\n\0");
        s.receive(b"property chat:Botdom\np=privclasses\n\n25:Members\n\0");
        s.drain_output();

        s.receive(b"recv chat:Botdom\n\njoin bob\ns=0\n\npc=Members\nrealname=Bob\n\0");
        let events: Vec<_> = s
            .drain_output()
            .into_iter()
            .filter_map(|o| match o {
                SessionOutput::Event(e) => Some(e),
                _ => None,
            })
            .collect();
        assert!(matches!(events[0], SessionEvent::Protocol { event: Event::Join(_) }));
        assert!(matches!(
            &events[1],
            SessionEvent::Notice { notice: RoomNotice::Joined { username, .. } } if username == "bob"
        ));
    }

    #[test]
    fn test_kicked_tears_down_room_and_users() {
        let mut s = online();
        s.receive(b"join chat:Botdom\ne=ok\n\n\0");
        s.receive(b"property chat:Botdom\np=members\n\nmember bob\npc=Members\n\0");
        s.receive(b"kicked chat:Botdom\nby=zed\n\nbye\n\0");

        assert!(s.chatroom(&ChatroomId::public("Botdom")).is_none());
        assert!(s.users().is_empty());
    }

    #[test]
    fn test_disconnect_event_resets_to_offline() {
        let mut s = online();
        s.receive(b"join chat:Botdom\ne=ok\n\n\0");
        s.receive(b"disconnect\ne=killed\n\n\0");

        assert_eq!(s.state(), SessionState::Offline);
        assert_eq!(s.chatrooms().count(), 0);
        assert!(s.connect_to_host());
    }

    #[test]
    fn test_on_disconnected_discards_partial_frame() {
        let mut s = online();
        s.receive(b"join chat:Bot");
        s.on_disconnected();
        s.connect_to_host();
        s.on_connected();
        s.drain_output();

        s.receive(b"dAmnServer 0.3\n\n\0");
        let out = s.drain_output();
        assert!(out.iter().any(|o| matches!(
            o,
            SessionOutput::Event(SessionEvent::Protocol { event: Event::Handshake(_) })
        )));
    }

    #[test]
    fn test_room_key_ignores_case() {
        let mut s = online();
        s.receive(b"join chat:Botdom\ne=ok\n\n\0");
        s.receive(b"part chat:botdom\ne=ok\n\n\0");
        assert_eq!(s.chatrooms().count(), 0);
    }
}
