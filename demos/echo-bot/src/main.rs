use damn::prelude::*;
use damn::protocol::events::MessageEvent;

// ---------------------------------------------------------------------------
// Bot behaviour
// ---------------------------------------------------------------------------

/// Decides what to say back to a message, if anything.
fn reply_to(message: &MessageEvent, me: &str) -> Option<String> {
    if message.from.eq_ignore_ascii_case(me) {
        return None;
    }
    let text = message.text.trim();
    if text == "!ping" {
        return Some(format!("{}: pong", message.from));
    }
    text.strip_prefix("!echo ")
        .map(|rest| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Reads the authtoken from `DAMN_TOKEN`; the password is never used.
struct EnvToken;

impl CredentialProvider for EnvToken {
    async fn fetch_token(&self, _username: &str, _password: &str) -> Result<String, damn::session::SessionError> {
        std::env::var("DAMN_TOKEN")
            .map_err(|e| damn::session::SessionError::AuthFailed(format!("DAMN_TOKEN: {e}")))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let username = std::env::var("DAMN_USERNAME")?;
    let room = std::env::var("DAMN_ROOM").unwrap_or_else(|_| "#Botdom".to_string());
    let credentials = Credentials::fetch(&EnvToken, &username, "").await?;

    let mut client = DamnClient::builder()
        .idle_timeout(std::time::Duration::from_secs(300))
        .connect(credentials)
        .await?;
    let handle = client.handle();

    while let Some(event) = client.next_event().await {
        println!("{}", serde_json::to_string(&event)?);
        match event {
            SessionEvent::StateChanged {
                to: SessionState::Online,
                ..
            } => handle.join(&room).await?,
            SessionEvent::Protocol {
                event: Event::Msg(message),
            } => {
                if let Some(reply) = reply_to(&message, &username) {
                    handle.say(&message.chatroom, &reply).await?;
                }
            }
            SessionEvent::VersionMismatch { expected, received } => {
                tracing::error!(%expected, %received, "server speaks another protocol");
            }
            _ => {}
        }
    }

    client.wait().await?;
    Ok(())
}
