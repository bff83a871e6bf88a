use async_trait::async_trait;
use chrono::{DurationRound, TimeDelta, Utc};
use http::HeaderMap;
use std::sync::Arc;

use crate::config::CookieOptions;
use crate::cookies::{
    append_set_cookie, join_cookies, make_clearing_cookie, make_split_cookies, present_shards,
};
use crate::encryption::{Cipher, signed_value, validate};
use crate::session::{SessionError, SessionState, decode_session_state, encode_session_state};

use super::types::SessionStore;

/// Keeps the whole encoded session in signed cookies on the client.
pub struct CookieSessionStore {
    cookie: CookieOptions,
    cipher: Option<Arc<Cipher>>,
}

impl CookieSessionStore {
    pub fn new(cipher: Option<Arc<Cipher>>, cookie: CookieOptions) -> Self {
        Self { cookie, cipher }
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    #[tracing::instrument(skip_all)]
    async fn save(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        session: &mut SessionState,
    ) -> Result<(), SessionError> {
        let now = Utc::now();
        let created_at = *session
            .created_at
            .get_or_insert_with(|| now.duration_trunc(TimeDelta::seconds(1)).unwrap_or(now));

        let encoded = encode_session_state(session, self.cipher.as_deref())?;
        let signed = signed_value(&self.cookie.secret, &self.cookie.name, &encoded, created_at);

        let cookies = make_split_cookies(
            request,
            &self.cookie.name,
            &signed,
            &self.cookie,
            self.cookie.expire,
            now,
        )?;
        let written = cookies.len();
        for cookie in &cookies {
            append_set_cookie(response, cookie)?;
        }

        // Drop shards left over from a previously larger session.
        for stale in present_shards(request, &self.cookie.name).into_iter().skip(written) {
            tracing::debug!("Clearing stale cookie shard '{}'", stale);
            append_set_cookie(
                response,
                &make_clearing_cookie(request, &stale, &self.cookie, now)?,
            )?;
        }

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn load(&self, request: &HeaderMap) -> Result<SessionState, SessionError> {
        let value = join_cookies(request, &self.cookie.name)?
            .ok_or_else(|| SessionError::NoCookie(self.cookie.name.clone()))?;

        let (payload, _) = validate(
            &self.cookie.name,
            &value,
            &self.cookie.secret,
            self.cookie.expire,
            self.cookie.signature_policy(),
        )?;

        decode_session_state(&payload, self.cipher.as_deref())
    }

    #[tracing::instrument(skip_all)]
    async fn clear(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut names = present_shards(request, &self.cookie.name);
        if !names.contains(&self.cookie.name) {
            names.insert(0, self.cookie.name.clone());
        }

        for name in names {
            append_set_cookie(
                response,
                &make_clearing_cookie(request, &name, &self.cookie, now)?,
            )?;
        }
        Ok(())
    }
}
