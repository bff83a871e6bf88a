//! oauth2-proxy-session - Session layer for an authenticating reverse proxy
//!
//! This crate holds the authenticated identity of a proxied user between
//! requests. Sessions are kept either entirely in signed cookies, or in a
//! shared cache addressed by a signed ticket cookie.

mod config;
mod cookies;
mod encryption;
mod provider;
mod session;
mod storage;
mod store;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{
    CookieOptions, DEFAULT_COOKIE_NAME, MAX_COOKIE_EXPIRE_SECS, RedisStoreOptions, SessionOptions,
};
pub use cookies::{
    MAX_COOKIE_LENGTH, MAX_COOKIE_SHARDS, SameSite, cookie_domain, get_cookie, make_cookie,
};

pub use encryption::{
    Cipher, CryptoError, SignatureError, SignaturePolicy, sign, signed_value, validate, verify,
};

pub use provider::{DefaultProvider, IdTokenClaims, Provider, ProviderError, session_from_id_token};

pub use session::{
    SessionError, SessionManager, SessionState, decode_session_state, encode_session_state,
};

// Cache backends for the ticketed store
pub use storage::{
    ClusterCache, InMemoryCache, RedisCache, SentinelCache, SessionCache, StorageError,
    new_redis_cache,
};

pub use store::{
    CookieSessionStore, RedisSessionStore, SessionStore, SessionStoreType, Ticket,
    new_session_store,
};

pub use utils::secret_bytes;
