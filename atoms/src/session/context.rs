use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

use super::model::{Identity, Session, SessionTokens};
use super::provider::IdentityProvider;
use super::service;
use crate::error::AuthError;

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    loading: bool,
    error: Option<String>,
}

/// Holder of the current admin session.
///
/// Constructed explicitly and handed by reference to whatever needs it. The
/// lock is never held across an await.
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    initial_tokens: Option<SessionTokens>,
    state: Mutex<SessionState>,
    bootstrap: OnceCell<()>,
}

/// Clears `loading` when dropped, whichever way the operation exits.
struct LoadingGuard<'a> {
    context: &'a SessionContext,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(context: &'a SessionContext) -> Self {
        let mut state = context.lock();
        state.loading = true;
        state.error = None;
        Self { context }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.context.lock().loading = false;
    }
}

impl SessionContext {
    /// A context that has not asked the backend yet. `loading` stays true
    /// until `initialize` resolves.
    pub fn new(provider: Arc<dyn IdentityProvider>, tokens: Option<SessionTokens>) -> Self {
        Self {
            provider,
            initial_tokens: tokens,
            state: Mutex::new(SessionState {
                session: None,
                loading: true,
                error: None,
            }),
            bootstrap: OnceCell::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State is plain data; a panic elsewhere cannot leave it half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask the backend for an existing session. Runs the query exactly once;
    /// concurrent and later callers wait for that first answer.
    pub async fn initialize(&self) {
        self.bootstrap
            .get_or_init(|| async {
                let session =
                    service::get_current_session(self.provider.as_ref(), self.initial_tokens.as_ref()).await;
                let mut state = self.lock();
                state.session = session;
                state.loading = false;
            })
            .await;
    }

    /// Sign in and replace the session. Waits for the bootstrap first so its
    /// answer can never overwrite this one.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.initialize().await;
        let _loading = LoadingGuard::acquire(self);

        match service::sign_in(self.provider.as_ref(), email, password).await {
            Ok(session) => {
                self.lock().session = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                tracing::warn!("login failed: {}", e);
                self.lock().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Sign out. On failure the local session is kept and the error recorded.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.initialize().await;
        let _loading = LoadingGuard::acquire(self);

        let tokens = match self.lock().session.as_ref() {
            Some(session) => session.tokens.clone(),
            None => return Ok(()),
        };

        match service::sign_out(self.provider.as_ref(), &tokens).await {
            Ok(()) => {
                self.lock().session = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("logout failed: {}", e);
                self.lock().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.lock().session.as_ref().map(|s| s.identity.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Tokens differ from the ones the context was built with (login or refresh).
    pub fn tokens_changed(&self) -> bool {
        let current = self.lock().session.as_ref().map(|s| s.tokens.clone());
        current.is_some() && current.as_ref() != self.initial_tokens.as_ref()
    }
}
