//! Hook for obtaining an authtoken.
//!
//! The chat server never sees a password; it wants the 32-character
//! authtoken issued by the website. How that token is obtained (a login
//! form, a cache on disk, an environment variable) is outside the session,
//! so it sits behind the [`CredentialProvider`] trait.

use crate::{Credentials, SessionError, TOKEN_LEN};

/// Trades a username and password for an authtoken.
///
/// # Example
///
/// ```rust
/// use damn_session::{CredentialProvider, SessionError};
///
/// /// Reads the token from the environment and ignores the password.
/// struct EnvToken;
///
/// impl CredentialProvider for EnvToken {
///     async fn fetch_token(&self, _username: &str, _password: &str) -> Result<String, SessionError> {
///         std::env::var("DAMN_TOKEN").map_err(|e| SessionError::AuthFailed(e.to_string()))
///     }
/// }
/// ```
pub trait CredentialProvider: Send + Sync + 'static {
    /// Returns the authtoken for `username`.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] when the account or password is refused.
    fn fetch_token(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send;
}

/// A provider that always hands out the same, already known token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    async fn fetch_token(&self, _username: &str, _password: &str) -> Result<String, SessionError> {
        Ok(self.0.clone())
    }
}

impl Credentials {
    /// Asks `provider` for a token and checks it has the expected shape.
    pub async fn fetch<P: CredentialProvider>(
        provider: &P,
        username: &str,
        password: &str,
    ) -> Result<Self, SessionError> {
        let token = provider.fetch_token(username, password).await?;
        if !token.is_empty() && token.len() != TOKEN_LEN {
            return Err(SessionError::AuthFailed(format!(
                "provider returned a {}-character token",
                token.len()
            )));
        }
        Self::new(username, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refuse;

    impl CredentialProvider for Refuse {
        async fn fetch_token(&self, username: &str, _password: &str) -> Result<String, SessionError> {
            Err(SessionError::AuthFailed(format!("bad password for {username}")))
        }
    }

    #[tokio::test]
    async fn test_fetch_static_token_builds_credentials() {
        let provider = StaticToken("0123456789abcdef0123456789abcdef".into());
        let creds = Credentials::fetch(&provider, "alice", "hunter2")
            .await
            .expect("token accepted");
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.token(), "0123456789abcdef0123456789abcdef");
    }

    #[tokio::test]
    async fn test_fetch_rejects_wrong_length_token() {
        let provider = StaticToken("short".into());
        let err = Credentials::fetch(&provider, "alice", "hunter2").await.unwrap_err();
        assert!(matches!(err, SessionError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_empty_token_is_missing_credentials() {
        let provider = StaticToken(String::new());
        let err = Credentials::fetch(&provider, "alice", "hunter2").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_fetch_propagates_provider_refusal() {
        let err = Credentials::fetch(&Refuse, "alice", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "authentication failed: bad password for alice");
    }
}
