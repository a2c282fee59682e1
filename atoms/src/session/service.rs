use super::model::{Session, SessionTokens};
use super::provider::IdentityProvider;
use crate::error::AuthError;

pub async fn sign_in(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let session = provider.sign_in(email, password).await?;
    tracing::info!(user_id = %session.identity.user_id, "signed in");
    Ok(session)
}

pub async fn sign_out(provider: &dyn IdentityProvider, tokens: &SessionTokens) -> Result<(), AuthError> {
    provider.sign_out(tokens).await?;
    tracing::info!(username = %tokens.username, "signed out");
    Ok(())
}

/// Resolve the session behind `tokens`, if any. Never fails: backend errors
/// are logged and treated as "no session".
///
/// An expired access token is refreshed once; the returned session then
/// carries the new tokens.
pub async fn get_current_session(
    provider: &dyn IdentityProvider,
    tokens: Option<&SessionTokens>,
) -> Option<Session> {
    let tokens = tokens?;

    match provider.identify(tokens).await {
        Ok(identity) => Some(Session {
            identity,
            tokens: tokens.clone(),
        }),
        Err(AuthError::SessionExpired) if tokens.refresh_token.is_some() => {
            let refreshed = match provider.refresh(tokens).await {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    tracing::info!(username = %tokens.username, "session refresh failed: {}", e);
                    return None;
                }
            };
            match provider.identify(&refreshed).await {
                Ok(identity) => {
                    tracing::info!(user_id = %identity.user_id, "session refreshed");
                    Some(Session {
                        identity,
                        tokens: refreshed,
                    })
                }
                Err(e) => {
                    tracing::warn!("refreshed token rejected: {}", e);
                    None
                }
            }
        }
        Err(AuthError::Backend(e)) => {
            tracing::warn!("session lookup failed: {}", e);
            None
        }
        Err(_) => None,
    }
}
