use async_trait::async_trait;
use chrono::{DurationRound, TimeDelta, Utc};
use http::HeaderMap;
use std::sync::Arc;

use crate::config::{CookieOptions, RedisStoreOptions};
use crate::cookies::{append_set_cookie, get_cookie, make_clearing_cookie, make_cookie};
use crate::encryption::{Cipher, signed_value, validate};
use crate::session::{SessionError, SessionState, decode_session_state, encode_session_state};
use crate::storage::{SessionCache, StorageError, new_redis_cache};

use super::ticket::Ticket;
use super::types::SessionStore;

/// Keeps sessions in a shared cache. The browser only holds a signed ticket.
pub struct RedisSessionStore {
    cookie: CookieOptions,
    cipher: Option<Arc<Cipher>>,
    cache: Arc<dyn SessionCache>,
}

impl RedisSessionStore {
    /// Build the store over the redis deployment described by `redis`.
    pub fn new(
        cipher: Option<Arc<Cipher>>,
        cookie: CookieOptions,
        redis: &RedisStoreOptions,
    ) -> Result<Self, SessionError> {
        let cache = new_redis_cache(redis).map_err(|e| match e {
            StorageError::Config(msg) => SessionError::Config(msg),
            other => SessionError::CacheUnavailable(other),
        })?;
        Ok(Self::with_cache(cipher, cookie, cache))
    }

    /// Build the store over any [`SessionCache`].
    pub fn with_cache(
        cipher: Option<Arc<Cipher>>,
        cookie: CookieOptions,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        Self {
            cookie,
            cipher,
            cache,
        }
    }

    /// Validate the request cookie and parse the ticket it carries.
    fn ticket_from_cookie(&self, cookie_value: &str) -> Result<Ticket, SessionError> {
        let (payload, _) = validate(
            &self.cookie.name,
            cookie_value,
            &self.cookie.secret,
            self.cookie.expire,
            self.cookie.signature_policy(),
        )?;
        Ticket::decode(&self.cookie.name, &payload)
    }

    /// Reuse the request's ticket if it validates and decodes, otherwise mint a new one.
    fn get_ticket(&self, request: &HeaderMap) -> Result<Ticket, SessionError> {
        let Some(value) = get_cookie(request, &self.cookie.name) else {
            tracing::debug!("No session cookie on request, minting new ticket");
            return Ticket::new();
        };

        match self.ticket_from_cookie(&value) {
            Ok(ticket) => {
                tracing::debug!("Reusing ticket {}", ticket.id());
                Ok(ticket)
            }
            Err(e) => {
                tracing::debug!("Existing session cookie unusable ({}), minting new ticket", e);
                Ticket::new()
            }
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
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

        let ticket = self.get_ticket(request)?;

        // Cookie-level encryption first, so a leaked cache entry alone reveals nothing.
        let encoded = encode_session_state(session, self.cipher.as_deref())?;
        let sealed = ticket.seal(encoded.as_bytes())?;

        self.cache
            .set(
                &ticket.handle(&self.cookie.name),
                &sealed,
                self.cookie.expire_secs(),
            )
            .await?;

        let signed = signed_value(
            &self.cookie.secret,
            &self.cookie.name,
            &ticket.encode(&self.cookie.name),
            created_at,
        );
        append_set_cookie(
            response,
            &make_cookie(
                request,
                &self.cookie.name,
                &signed,
                &self.cookie,
                self.cookie.expire,
                now,
            )?,
        )
    }

    #[tracing::instrument(skip_all)]
    async fn load(&self, request: &HeaderMap) -> Result<SessionState, SessionError> {
        let value = get_cookie(request, &self.cookie.name)
            .ok_or_else(|| SessionError::NoCookie(self.cookie.name.clone()))?;

        let ticket = self.ticket_from_cookie(&value)?;

        let sealed = self
            .cache
            .get(&ticket.handle(&self.cookie.name))
            .await?
            .ok_or(SessionError::NotFound)?;

        let plaintext = ticket.open(&sealed)?;
        let encoded = String::from_utf8(plaintext)
            .map_err(|e| SessionError::Malformed(format!("session is not UTF-8: {e}")))?;

        decode_session_state(&encoded, self.cipher.as_deref())
    }

    #[tracing::instrument(skip_all)]
    async fn clear(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<(), SessionError> {
        // The browser forgets the session even if the cache is unreachable.
        append_set_cookie(
            response,
            &make_clearing_cookie(request, &self.cookie.name, &self.cookie, Utc::now())?,
        )?;

        let Some(value) = get_cookie(request, &self.cookie.name) else {
            return Ok(());
        };

        let (payload, _) = validate(
            &self.cookie.name,
            &value,
            &self.cookie.secret,
            self.cookie.expire,
            self.cookie.signature_policy(),
        )?;

        // Only cache failures are errors here; an undecodable ticket has nothing to delete.
        if let Ok(ticket) = Ticket::decode(&self.cookie.name, &payload) {
            self.cache.del(&ticket.handle(&self.cookie.name)).await?;
            tracing::debug!("Cleared session for ticket {}", ticket.id());
        }

        Ok(())
    }
}
