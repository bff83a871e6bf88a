//! What the session layer needs from an identity provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("email in id_token ({0}) isn't verified")]
    UnverifiedEmail(String),
}

/// Provider-side hooks consulted when a session is expired or due for refresh.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Renew `session` if the provider can. `Ok(None)` means nothing was refreshed.
    async fn refresh_session_if_needed(
        &self,
        session: &SessionState,
    ) -> Result<Option<SessionState>, ProviderError>;

    /// Whether the provider still accepts the session's access token.
    async fn validate_session_state(&self, _session: &SessionState) -> bool {
        true
    }
}

/// Provider without refresh support. Every session is considered valid until
/// it expires.
#[derive(Debug, Clone, Default)]
pub struct DefaultProvider;

#[async_trait]
impl Provider for DefaultProvider {
    async fn refresh_session_if_needed(
        &self,
        _session: &SessionState,
    ) -> Result<Option<SessionState>, ProviderError> {
        Ok(None)
    }
}

/// The ID token claims a session is built from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdTokenClaims {
    #[serde(rename = "sub", default)]
    pub subject: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

/// Build a session from an ID token whose signature and audience were already verified.
///
/// The raw token doubles as access token. The subject stands in for a missing
/// email, and an email the provider explicitly marks unverified is rejected.
pub fn session_from_id_token(
    raw_id_token: &str,
    claims: &IdTokenClaims,
    expiry: DateTime<Utc>,
) -> Result<SessionState, ProviderError> {
    let email = claims
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| claims.subject.clone());

    if email.is_empty() {
        return Err(ProviderError::InvalidClaims(
            "id_token carries neither email nor subject".to_string(),
        ));
    }

    if claims.email_verified == Some(false) {
        return Err(ProviderError::UnverifiedEmail(email));
    }

    Ok(SessionState {
        email: Some(email.clone()),
        user: Some(email),
        preferred_username: claims.preferred_username.clone(),
        access_token: Some(raw_id_token.to_string()),
        id_token: Some(raw_id_token.to_string()),
        refresh_token: None,
        expires_on: Some(expiry),
        created_at: None,
    })
}
