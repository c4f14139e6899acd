use crate::config::Credentials;
use crate::error::AuthError;
use crate::session::session::Session;

/// Produces a fresh session from account credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}
