//! `DamnClient` builder and the handle used to talk to a running client.
//!
//! This is the entry point for connecting to dAmn. It ties together all
//! the layers: transport → protocol → session → room.
//!
//! ```text
//!   ClientHandle ──ClientCommand──→ driver task ──bytes──→ server
//!        (clone)      (mpsc)          │ owns Session
//!                                     └──SessionEvent──→ DamnClient::next_event
//! ```

use std::time::Duration;

use damn_protocol::ChatroomId;
use damn_session::{Credentials, Session, SessionConfig, SessionError, SessionEvent, SessionState};
use damn_transport::{Connection, Connector, TcpConnector, TransportError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::driver::{ClientCommand, drive};
use crate::{ClientConfig, DamnError};

/// Capacity of the command channel between handles and the driver.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Builder for configuring and connecting a dAmn client.
///
/// # Example
///
/// ```rust,ignore
/// use damn::prelude::*;
///
/// let credentials = Credentials::new("botname", token)?;
/// let mut client = DamnClient::builder()
///     .idle_timeout(Duration::from_secs(120))
///     .connect(credentials)
///     .await?;
/// ```
pub struct DamnClientBuilder<C = TcpConnector> {
    config: ClientConfig,
    connector: C,
}

impl DamnClientBuilder {
    /// Creates a new builder with default settings and a TCP connector.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: TcpConnector::new(),
        }
    }

    /// Replaces the whole client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.connector = self.connector.with_read_buffer_size(config.read_buffer_size);
        self.config = config;
        self
    }

    /// Sets how many bytes each socket read asks for.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self.connector = self.connector.with_read_buffer_size(size);
        self
    }
}

impl Default for DamnClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> DamnClientBuilder<C> {
    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.session.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.session.port = port;
        self
    }

    /// Sets the agent string sent in the handshake.
    pub fn agent(mut self, agent: &str) -> Self {
        self.config.session.agent = agent.to_string();
        self
    }

    /// Closes the connection when the server stays silent this long.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Uses a different way of reaching the server.
    pub fn connector<D>(self, connector: D) -> DamnClientBuilder<D> {
        DamnClientBuilder {
            config: self.config,
            connector,
        }
    }
}

impl<C> DamnClientBuilder<C>
where
    C: Connector<Error = TransportError>,
    C::Connection: Connection<Error = TransportError>,
{
    /// Opens the connection, sends the handshake, and spawns the driver.
    ///
    /// Returns once the socket is up. Login completes in the background;
    /// watch for `StateChanged { to: Online, .. }` before sending.
    pub async fn connect(self, credentials: Credentials) -> Result<DamnClient, DamnError> {
        let mut session = Session::new(self.config.session.clone(), credentials);
        session.connect_to_host();

        let conn = match self
            .connector
            .connect(&self.config.session.host, self.config.session.port)
            .await
        {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(host = %self.config.session.host, error = %e, "connect failed");
                return Err(e.into());
            }
        };
        tracing::info!(conn_id = %conn.id(), user = %session.username(), "connected");
        session.on_connected();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(
            conn,
            session,
            command_rx,
            event_tx,
            self.config.idle_timeout,
        ));

        Ok(DamnClient {
            handle: ClientHandle { tx: command_tx },
            events: event_rx,
            task,
        })
    }
}

/// A connected dAmn client.
///
/// Owns the event stream and the driver task. Use [`handle()`](Self::handle)
/// to get a cloneable handle for sending.
pub struct DamnClient {
    handle: ClientHandle,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    task: JoinHandle<Result<(), DamnError>>,
}

impl DamnClient {
    /// Creates a new builder.
    pub fn builder() -> DamnClientBuilder {
        DamnClientBuilder::new()
    }

    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Waits for the next event. Returns `None` once the driver has
    /// stopped and every event has been delivered.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Waits for the driver task to finish and returns how it ended.
    ///
    /// Events not yet read are dropped.
    pub async fn wait(self) -> Result<(), DamnError> {
        drop(self.events);
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "driver task failed");
                Err(DamnError::ClientClosed)
            }
        }
    }

    /// Splits the client so events and commands can live in different tasks.
    pub fn into_parts(
        self,
    ) -> (
        ClientHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
        JoinHandle<Result<(), DamnError>>,
    ) {
        (self.handle, self.events, self.task)
    }
}

/// Cloneable handle for sending commands to a running client.
///
/// Every method waits until the driver has applied the command, so
/// errors such as [`SessionError::NotOnline`] come back here.
#[derive(Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    async fn run<F>(&self, op: F) -> Result<(), DamnError>
    where
        F: FnOnce(&mut Session) -> Result<(), SessionError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ClientCommand::Run {
                op: Box::new(op),
                reply: reply_tx,
            })
            .await
            .map_err(|_| DamnError::ClientClosed)?;
        reply_rx
            .await
            .map_err(|_| DamnError::ClientClosed)?
            .map_err(DamnError::from)
    }

    /// Runs `f` against the session inside the driver and returns its
    /// result. Use it to read rooms, members, or the current state.
    pub async fn inspect<F, R>(&self, f: F) -> Result<R, DamnError>
    where
        F: FnOnce(&Session) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let inspect = move |session: &Session| {
            let _ = reply_tx.send(f(session));
        };
        self.tx
            .send(ClientCommand::Inspect(Box::new(inspect)))
            .await
            .map_err(|_| DamnError::ClientClosed)?;
        reply_rx.await.map_err(|_| DamnError::ClientClosed)
    }

    pub async fn state(&self) -> Result<SessionState, DamnError> {
        self.inspect(|session| session.state()).await
    }

    /// Joins a chatroom given as `#name`, `@user`, `chat:name` or
    /// `pchat:a:b`.
    pub async fn join(&self, chatroom: &str) -> Result<(), DamnError> {
        let chatroom = chatroom.to_string();
        self.run(move |session| {
            let id = session.parse_chatroom(&chatroom)?;
            session.join(&id)
        })
        .await
    }

    pub async fn part(&self, chatroom: &ChatroomId) -> Result<(), DamnError> {
        let chatroom = chatroom.clone();
        self.run(move |session| session.part(&chatroom)).await
    }

    pub async fn say(&self, chatroom: &ChatroomId, text: &str) -> Result<(), DamnError> {
        let (chatroom, text) = (chatroom.clone(), text.to_string());
        self.run(move |session| session.say(&chatroom, &text)).await
    }

    pub async fn act(&self, chatroom: &ChatroomId, text: &str) -> Result<(), DamnError> {
        let (chatroom, text) = (chatroom.clone(), text.to_string());
        self.run(move |session| session.act(&chatroom, &text)).await
    }

    /// Sends a message that is not parsed for emoticons or links.
    pub async fn npmsg(&self, chatroom: &ChatroomId, text: &str) -> Result<(), DamnError> {
        let (chatroom, text) = (chatroom.clone(), text.to_string());
        self.run(move |session| session.npmsg(&chatroom, &text)).await
    }

    pub async fn promote(
        &self,
        chatroom: &ChatroomId,
        username: &str,
        privclass: Option<&str>,
    ) -> Result<(), DamnError> {
        let (chatroom, username) = (chatroom.clone(), username.to_string());
        let privclass = privclass.map(str::to_string);
        self.run(move |session| session.promote(&chatroom, &username, privclass.as_deref()))
            .await
    }

    pub async fn demote(
        &self,
        chatroom: &ChatroomId,
        username: &str,
        privclass: Option<&str>,
    ) -> Result<(), DamnError> {
        let (chatroom, username) = (chatroom.clone(), username.to_string());
        let privclass = privclass.map(str::to_string);
        self.run(move |session| session.demote(&chatroom, &username, privclass.as_deref()))
            .await
    }

    pub async fn kick(
        &self,
        chatroom: &ChatroomId,
        username: &str,
        reason: Option<&str>,
    ) -> Result<(), DamnError> {
        let (chatroom, username) = (chatroom.clone(), username.to_string());
        let reason = reason.map(str::to_string);
        self.run(move |session| session.kick(&chatroom, &username, reason.as_deref()))
            .await
    }

    pub async fn ban(&self, chatroom: &ChatroomId, username: &str) -> Result<(), DamnError> {
        let (chatroom, username) = (chatroom.clone(), username.to_string());
        self.run(move |session| session.ban(&chatroom, &username)).await
    }

    pub async fn unban(&self, chatroom: &ChatroomId, username: &str) -> Result<(), DamnError> {
        let (chatroom, username) = (chatroom.clone(), username.to_string());
        self.run(move |session| session.unban(&chatroom, &username)).await
    }

    /// Requests a room property (`title`, `topic`, `privclasses`,
    /// `members`). The value arrives later as a property event.
    pub async fn get_property(&self, chatroom: &ChatroomId, property: &str) -> Result<(), DamnError> {
        let (chatroom, property) = (chatroom.clone(), property.to_string());
        self.run(move |session| session.get_room_property(&chatroom, &property))
            .await
    }

    pub async fn set_property(
        &self,
        chatroom: &ChatroomId,
        property: &str,
        value: &str,
    ) -> Result<(), DamnError> {
        let (chatroom, property, value) =
            (chatroom.clone(), property.to_string(), value.to_string());
        self.run(move |session| session.set_room_property(&chatroom, &property, &value))
            .await
    }

    pub async fn admin(&self, chatroom: &ChatroomId, command: &str) -> Result<(), DamnError> {
        let (chatroom, command) = (chatroom.clone(), command.to_string());
        self.run(move |session| session.send_admin_command(&chatroom, &command))
            .await
    }

    pub async fn kill(&self, username: &str, reason: &str) -> Result<(), DamnError> {
        let (username, reason) = (username.to_string(), reason.to_string());
        self.run(move |session| session.kill(&username, &reason)).await
    }

    pub async fn whois(&self, username: &str) -> Result<(), DamnError> {
        let username = username.to_string();
        self.run(move |session| session.whois(&username)).await
    }

    /// Asks the server to end the session. The driver stops once the
    /// server acknowledges and closes the socket.
    pub async fn quit(&self) -> Result<(), DamnError> {
        self.run(|session| session.quit()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_setters() {
        let builder = DamnClientBuilder::new()
            .host("localhost")
            .port(3901)
            .agent("test-agent")
            .idle_timeout(Duration::from_secs(5))
            .read_buffer_size(512);
        assert_eq!(builder.config.session.host, "localhost");
        assert_eq!(builder.config.session.port, 3901);
        assert_eq!(builder.config.session.agent, "test-agent");
        assert_eq!(builder.config.idle_timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.config.read_buffer_size, 512);
    }

    #[test]
    fn test_builder_config_replaces_everything() {
        let mut config = ClientConfig::default();
        config.session.port = 1;
        let builder = DamnClientBuilder::default().config(config.clone());
        assert_eq!(builder.config, config);
    }

    #[tokio::test]
    async fn test_handle_on_dropped_driver_is_client_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = ClientHandle { tx };
        assert!(matches!(handle.quit().await, Err(DamnError::ClientClosed)));
        assert!(matches!(handle.state().await, Err(DamnError::ClientClosed)));
    }
}
