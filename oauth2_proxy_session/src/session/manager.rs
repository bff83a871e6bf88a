use chrono::Duration;
use http::HeaderMap;
use std::sync::Arc;

use crate::provider::Provider;
use crate::store::SessionStore;

use super::errors::SessionError;
use super::state::SessionState;

/// Loads sessions per request and decides when the provider must refresh them.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn Provider>,
    refresh_period: Duration,
}

impl SessionManager {
    /// `refresh_period` of zero disables periodic revalidation; expired sessions
    /// are still offered to the provider.
    pub fn new(
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn Provider>,
        refresh_period: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            refresh_period,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn is_stale(&self, session: &SessionState) -> bool {
        self.refresh_period > Duration::zero() && session.age() > self.refresh_period
    }

    /// Load the request's session, refreshing it through the provider when it
    /// is expired or older than the refresh period.
    ///
    /// `Ok(None)` means the request carries no session. Any other failure
    /// clears the session cookies into `response` before returning the error.
    #[tracing::instrument(skip_all)]
    pub async fn load_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<Option<SessionState>, SessionError> {
        let mut session = match self.store.load(request).await {
            Ok(session) => session,
            Err(SessionError::NoCookie(_)) => return Ok(None),
            Err(e) => {
                tracing::warn!("Error loading session: {}", e);
                return Err(self.clear_after(request, response, e).await);
            }
        };

        let stale = self.is_stale(&session);
        let mut needs_save = false;
        let mut refreshed = false;

        if stale || session.is_expired() {
            tracing::debug!(
                "Refreshing session (age {}s, expired {})",
                session.age().num_seconds(),
                session.is_expired()
            );
            match self.provider.refresh_session_if_needed(&session).await {
                Ok(Some(renewed)) => {
                    tracing::info!("Refreshed session {}", renewed);
                    session = renewed;
                    needs_save = true;
                    refreshed = true;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Error refreshing session: {}", e);
                    return Err(self.clear_after(request, response, e.into()).await);
                }
            }
        }

        if session.is_expired() {
            tracing::info!("Removing expired session {}", session);
            return Err(self
                .clear_after(request, response, SessionError::Expired)
                .await);
        }

        if stale
            && !refreshed
            && session.has_access_token()
            && !self.provider.validate_session_state(&session).await
        {
            tracing::info!("Removing session, token no longer valid {}", session);
            return Err(self
                .clear_after(request, response, SessionError::Invalid)
                .await);
        }

        if needs_save {
            self.store.save(request, response, &mut session).await?;
        }

        Ok(Some(session))
    }

    pub async fn save_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        session: &mut SessionState,
    ) -> Result<(), SessionError> {
        self.store.save(request, response, session).await
    }

    pub async fn clear_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        self.store.clear(request, response).await
    }

    /// Clear the session, keeping `err` as the reported failure.
    async fn clear_after(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        err: SessionError,
    ) -> SessionError {
        if let Err(clear_err) = self.store.clear(request, response).await {
            tracing::error!("Error clearing session: {}", clear_err);
        }
        err
    }
}
