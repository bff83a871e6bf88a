use async_trait::async_trait;
use chrono::{Duration, Utc};
use http::HeaderMap;
use http::header::SET_COOKIE;
use oauth2_proxy_session::{
    Cipher, CookieOptions, CookieSessionStore, DefaultProvider, InMemoryCache, RedisSessionStore,
    SessionCache, SessionManager, SessionState, SessionStore, StorageError,
};
use std::sync::Arc;

use crate::state::GatewayState;

fn cookie_options() -> CookieOptions {
    CookieOptions {
        secret: "axum-test-cookie-secret".to_string(),
        ..CookieOptions::default()
    }
}

fn cipher() -> Option<Arc<Cipher>> {
    Some(Arc::new(Cipher::new(b"0123456789abcdef").unwrap()))
}

fn state_over(store: Arc<dyn SessionStore>) -> GatewayState {
    GatewayState::new(SessionManager::new(
        store,
        Arc::new(DefaultProvider),
        Duration::zero(),
    ))
}

/// Gateway over an encrypting cookie store, so tokens and expiry survive a round trip.
pub(crate) fn gateway_state() -> GatewayState {
    state_over(Arc::new(CookieSessionStore::new(cipher(), cookie_options())))
}

/// Gateway over the ticketed store backed by `cache`.
pub(crate) fn ticketed_gateway_state(cache: Arc<dyn SessionCache>) -> GatewayState {
    state_over(Arc::new(RedisSessionStore::with_cache(
        cipher(),
        cookie_options(),
        cache,
    )))
}

/// In-memory cache whose deletes always fail, as if the connection dropped mid-session.
#[derive(Default)]
pub(crate) struct DelFailsCache(InMemoryCache);

#[async_trait]
impl SessionCache for DelFailsCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.0.get(key).await
    }
    async fn set(&self, key: &str, value: &[u8], ttl: u64) -> Result<(), StorageError> {
        self.0.set(key, value, ttl).await
    }
    async fn del(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Storage("connection reset".to_string()))
    }
}

pub(crate) fn session() -> SessionState {
    SessionState {
        email: Some("user@example.com".to_string()),
        user: Some("user".to_string()),
        access_token: Some("tok".to_string()),
        expires_on: Some(Utc::now() + Duration::hours(1)),
        ..Default::default()
    }
}

/// `Cookie` header value from the `Set-Cookie` headers in `response`.
pub(crate) fn cookie_header(response: &HeaderMap) -> String {
    response
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Save `session` and return the `Cookie` header a browser would send back.
pub(crate) async fn sign_in(state: &GatewayState, mut session: SessionState) -> String {
    let mut response = HeaderMap::new();
    state
        .manager
        .save_session(&HeaderMap::new(), &mut response, &mut session)
        .await
        .unwrap();
    cookie_header(&response)
}
