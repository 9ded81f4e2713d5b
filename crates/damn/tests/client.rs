//! Integration tests for the full client against a scripted fake server.
//!
//! Each test binds a loopback listener and plays the dAmn server side
//! frame by frame, so the client runs its real TCP transport and driver.

use std::time::Duration;

use damn::prelude::*;
use damn::session::SessionError;
use damn::transport::TransportError;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const TOKEN: &str = "0123456789abcdef0123456789abcdef";
const WAIT: Duration = Duration::from_secs(5);

// =========================================================================
// Helpers
// =========================================================================

/// Set `RUST_LOG=damn=debug` to see the driver's side of a failing test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
    let port = listener.local_addr().expect("bound").port();
    (listener, port)
}

fn credentials() -> Credentials {
    Credentials::new("alice", TOKEN).expect("valid credentials")
}

fn builder(port: u16) -> DamnClientBuilder {
    init_tracing();
    DamnClient::builder().host("127.0.0.1").port(port)
}

/// Reads one NUL-terminated frame, without the NUL.
async fn read_frame(reader: &mut BufReader<TcpStream>) -> String {
    let mut buf = Vec::new();
    let n = reader.read_until(0, &mut buf).await.expect("read frame");
    assert!(n > 0, "client closed before sending a frame");
    assert_eq!(buf.pop(), Some(0), "frame should end with NUL");
    String::from_utf8(buf).expect("utf-8 frame")
}

async fn write_frame(reader: &mut BufReader<TcpStream>, frame: &str) {
    let mut bytes = frame.as_bytes().to_vec();
    bytes.push(0);
    reader.get_mut().write_all(&bytes).await.expect("write frame");
}

/// Accepts the client and plays the handshake and a successful login.
async fn accept_and_login(listener: TcpListener) -> BufReader<TcpStream> {
    let (socket, _) = listener.accept().await.expect("should accept");
    let mut reader = BufReader::new(socket);
    let handshake = read_frame(&mut reader).await;
    assert!(handshake.starts_with("dAmnClient 0.3\nagent="), "{handshake:?}");
    write_frame(&mut reader, "dAmnServer 0.3\n\n").await;
    assert_eq!(
        read_frame(&mut reader).await,
        format!("login alice\npk={TOKEN}\n\n")
    );
    write_frame(&mut reader, "login alice\ne=ok\n\nsymbol=~\nrealname=Alice\ngpc=guest\n").await;
    reader
}

async fn next_event(client: &mut DamnClient) -> SessionEvent {
    tokio::time::timeout(WAIT, client.next_event())
        .await
        .expect("event should arrive")
        .expect("driver should still be running")
}

/// Skips events until `pred` matches.
async fn wait_for(client: &mut DamnClient, pred: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
    loop {
        let event = next_event(client).await;
        if pred(&event) {
            return event;
        }
    }
}

fn is_online(event: &SessionEvent) -> bool {
    matches!(
        event,
        SessionEvent::StateChanged {
            to: SessionState::Online,
            ..
        }
    )
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_client_full_session_against_fake_server() {
    let (listener, port) = listener().await;
    let server = tokio::spawn(async move {
        let mut reader = accept_and_login(listener).await;

        assert_eq!(read_frame(&mut reader).await, "join chat:Botdom\n\n");
        write_frame(&mut reader, "join chat:Botdom\ne=ok\n\n").await;
        write_frame(
            &mut reader,
            "property chat:Botdom\np=privclasses\n\n99:Founders\n25:Members\n",
        )
        .await;
        write_frame(
            &mut reader,
            "property chat:Botdom\np=members\n\nmember zed\npc=Founders\n\nmember alice\npc=Members\n",
        )
        .await;
        write_frame(&mut reader, "ping\n\n").await;
        assert_eq!(read_frame(&mut reader).await, "pong\n\n");

        assert_eq!(
            read_frame(&mut reader).await,
            "send chat:Botdom\n\nmsg main\n\nhello room"
        );
        assert_eq!(read_frame(&mut reader).await, "disconnect\n\n");
        write_frame(&mut reader, "disconnect\ne=ok\n\n").await;
    });

    let mut client = builder(port).connect(credentials()).await.expect("should connect");
    let handle = client.handle();
    wait_for(&mut client, is_online).await;
    assert_eq!(handle.state().await.expect("running"), SessionState::Online);

    handle.join("#Botdom").await.expect("join sent");
    wait_for(&mut client, |e| {
        matches!(e, SessionEvent::Protocol { event: Event::Ping })
    })
    .await;

    let botdom = ChatroomId::public("Botdom");
    let id = botdom.clone();
    let members = handle
        .inspect(move |session| session.chatroom(&id).map(|room| room.member_count()))
        .await
        .expect("running");
    assert_eq!(members, Some(2));

    handle.say(&botdom, "hello room").await.expect("say sent");
    handle.quit().await.expect("quit sent");

    wait_for(&mut client, |e| {
        matches!(
            e,
            SessionEvent::StateChanged {
                to: SessionState::Offline,
                ..
            }
        )
    })
    .await;
    tokio::time::timeout(WAIT, client.wait())
        .await
        .expect("driver should stop")
        .expect("clean shutdown");
    server.await.expect("server script should complete");

    assert!(matches!(handle.say(&botdom, "late").await, Err(DamnError::ClientClosed)));
}

#[tokio::test]
async fn test_client_version_mismatch_closes_without_login() {
    let (listener, port) = listener().await;
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("should accept");
        let mut reader = BufReader::new(socket);
        read_frame(&mut reader).await;
        write_frame(&mut reader, "dAmnServer 0.2\n\n").await;
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.expect("read to eof");
        rest
    });

    let mut client = builder(port).connect(credentials()).await.expect("should connect");
    let event = wait_for(&mut client, |e| {
        matches!(e, SessionEvent::VersionMismatch { .. })
    })
    .await;
    match event {
        SessionEvent::VersionMismatch { expected, received } => {
            assert_eq!(expected, "0.3");
            assert_eq!(received, "0.2");
        }
        other => panic!("unexpected event {other:?}"),
    }

    tokio::time::timeout(WAIT, client.wait())
        .await
        .expect("driver should stop")
        .expect("clean shutdown");
    let rest = server.await.expect("server task");
    assert!(rest.is_empty(), "credentials must not be sent");
}

#[tokio::test]
async fn test_client_login_failure_ends_session() {
    let (listener, port) = listener().await;
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("should accept");
        let mut reader = BufReader::new(socket);
        read_frame(&mut reader).await;
        write_frame(&mut reader, "dAmnServer 0.3\n\n").await;
        read_frame(&mut reader).await;
        write_frame(&mut reader, "login alice\ne=authentication failed\n\n").await;
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.expect("read to eof");
    });

    let mut client = builder(port).connect(credentials()).await.expect("should connect");
    let event = wait_for(&mut client, |e| {
        matches!(e, SessionEvent::Protocol { event: Event::Login(_) })
    })
    .await;
    if let SessionEvent::Protocol {
        event: Event::Login(login),
    } = event
    {
        assert!(!login.is_ok());
    }

    tokio::time::timeout(WAIT, client.wait())
        .await
        .expect("driver should stop")
        .expect("clean shutdown");
    server.await.expect("server task");
}

#[tokio::test]
async fn test_client_idle_timeout_stops_driver() {
    let (listener, port) = listener().await;
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("should accept");
        let mut reader = BufReader::new(socket);
        read_frame(&mut reader).await;
        // Say nothing; wait for the client to give up.
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.expect("read to eof");
    });

    let client = builder(port)
        .idle_timeout(Duration::from_millis(100))
        .connect(credentials())
        .await
        .expect("should connect");

    tokio::time::timeout(WAIT, client.wait())
        .await
        .expect("idle watchdog should fire")
        .expect("clean shutdown");
    server.await.expect("server task");
}

#[tokio::test]
async fn test_client_say_before_login_is_not_online() {
    let (listener, port) = listener().await;
    let _server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("should accept");
        let mut reader = BufReader::new(socket);
        let mut rest = Vec::new();
        let _ = reader.read_to_end(&mut rest).await;
    });

    let client = builder(port).connect(credentials()).await.expect("should connect");
    let result = client
        .handle()
        .say(&ChatroomId::public("Botdom"), "too early")
        .await;
    assert!(matches!(result, Err(DamnError::Session(SessionError::NotOnline))));
}

#[tokio::test]
async fn test_client_join_rejects_bad_chatroom() {
    let (listener, port) = listener().await;
    let _server = tokio::spawn(async move {
        let mut reader = accept_and_login(listener).await;
        let mut rest = Vec::new();
        let _ = reader.read_to_end(&mut rest).await;
    });

    let mut client = builder(port).connect(credentials()).await.expect("should connect");
    wait_for(&mut client, is_online).await;

    let result = client.handle().join("chat:").await;
    assert!(matches!(result, Err(DamnError::Session(SessionError::Protocol(_)))));
}

#[tokio::test]
async fn test_client_connect_refused_is_transport_error() {
    let (listener, port) = listener().await;
    drop(listener);

    let result = builder(port).connect(credentials()).await;
    assert!(matches!(
        result,
        Err(DamnError::Transport(TransportError::ConnectFailed { .. }))
    ));
}
