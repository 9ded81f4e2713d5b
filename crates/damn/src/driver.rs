//! Connection driver: the task that moves bytes between socket and session.
//!
//! One task per client. The flow is:
//!   1. Flush whatever the session queued (handshake, replies, events)
//!   2. Wait for either socket bytes or a command from a `ClientHandle`
//!   3. Feed the bytes or apply the command, then go back to 1
//!
//! The loop ends when the server closes the socket, the session asks for
//! a disconnect, the handshake version does not match, or the idle
//! watchdog fires.

use std::time::Duration;

use damn_session::{Session, SessionError, SessionEvent, SessionOutput};
use damn_transport::{Connection, TransportError};
use tokio::sync::{mpsc, oneshot};

use crate::DamnError;

/// Mutating operation run against the session inside the driver task.
pub(crate) type SessionOp = Box<dyn FnOnce(&mut Session) -> Result<(), SessionError> + Send>;

/// Read-only closure; it sends its own result back.
pub(crate) type SessionInspect = Box<dyn FnOnce(&Session) + Send>;

/// Commands sent to the driver through its channel.
pub(crate) enum ClientCommand {
    Run {
        op: SessionOp,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Inspect(SessionInspect),
}

enum Received {
    Bytes(Vec<u8>),
    Closed,
    Idle,
}

/// Runs a connected session until the connection ends.
pub(crate) async fn drive<C>(
    conn: C,
    mut session: Session,
    mut commands: mpsc::Receiver<ClientCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    idle_timeout: Option<Duration>,
) -> Result<(), DamnError>
where
    C: Connection<Error = TransportError>,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "driver started");
    let mut commands_open = true;

    let result = loop {
        match flush(&conn, &mut session, &events).await {
            Ok(false) => {}
            Ok(true) => break Ok(()),
            Err(e) => break Err(DamnError::from(e)),
        }

        tokio::select! {
            received = recv(&conn, idle_timeout) => match received {
                Ok(Received::Bytes(bytes)) => session.receive(&bytes),
                Ok(Received::Closed) => {
                    tracing::info!(%conn_id, "server closed the connection");
                    break Ok(());
                }
                Ok(Received::Idle) => {
                    tracing::warn!(%conn_id, timeout = ?idle_timeout, "connection idle, closing");
                    break Ok(());
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break Err(DamnError::from(e));
                }
            },
            command = commands.recv(), if commands_open => match command {
                Some(ClientCommand::Run { op, reply }) => {
                    let _ = reply.send(op(&mut session));
                }
                Some(ClientCommand::Inspect(inspect)) => inspect(&session),
                None => {
                    tracing::debug!(%conn_id, "all client handles dropped");
                    commands_open = false;
                }
            },
        }
    };

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    session.on_disconnected();
    for output in session.drain_output() {
        if let SessionOutput::Event(event) = output {
            let _ = events.send(event);
        }
    }
    tracing::debug!(%conn_id, "driver stopped");
    result
}

/// Sends queued bytes and forwards queued events. Returns `true` when the
/// connection should be closed.
async fn flush<C>(
    conn: &C,
    session: &mut Session,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> Result<bool, TransportError>
where
    C: Connection<Error = TransportError>,
{
    let mut close = false;
    for output in session.drain_output() {
        match output {
            SessionOutput::Transmit(bytes) => conn.send(&bytes).await?,
            SessionOutput::Disconnect => close = true,
            SessionOutput::Event(event) => {
                if matches!(event, SessionEvent::VersionMismatch { .. }) {
                    close = true;
                }
                // Nobody listening is fine; the session keeps running.
                let _ = events.send(event);
            }
        }
    }
    Ok(close)
}

async fn recv<C>(conn: &C, idle_timeout: Option<Duration>) -> Result<Received, TransportError>
where
    C: Connection<Error = TransportError>,
{
    let received = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
            Ok(received) => received?,
            Err(_) => return Ok(Received::Idle),
        },
        None => conn.recv().await?,
    };
    Ok(match received {
        Some(bytes) => Received::Bytes(bytes),
        None => Received::Closed,
    })
}
