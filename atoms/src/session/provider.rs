use async_trait::async_trait;

use super::model::{Identity, Session, SessionTokens};
use crate::error::AuthError;

/// Email/password identity backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Invalidate every token issued for this session.
    async fn sign_out(&self, tokens: &SessionTokens) -> Result<(), AuthError>;

    /// Who the access token belongs to. An expired token is
    /// `AuthError::SessionExpired`.
    async fn identify(&self, tokens: &SessionTokens) -> Result<Identity, AuthError>;

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, tokens: &SessionTokens) -> Result<SessionTokens, AuthError>;
}
