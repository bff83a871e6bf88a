use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{CookieOptions, SessionOptions};
use crate::session::SessionError;

use super::cookie::CookieSessionStore;
use super::redis::RedisSessionStore;
use super::types::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreType {
    Cookie,
    Redis,
}

impl FromStr for SessionStoreType {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cookie" => Ok(Self::Cookie),
            "redis" => Ok(Self::Redis),
            other => Err(SessionError::UnknownStoreType(other.to_string())),
        }
    }
}

impl fmt::Display for SessionStoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cookie => f.write_str("cookie"),
            Self::Redis => f.write_str("redis"),
        }
    }
}

/// Build the session store selected by `opts.store_type`.
pub fn new_session_store(
    opts: &SessionOptions,
    cookie: &CookieOptions,
) -> Result<Arc<dyn SessionStore>, SessionError> {
    let store_type: SessionStoreType = opts.store_type.parse()?;
    tracing::info!("Using {} session store", store_type);

    match store_type {
        SessionStoreType::Cookie => Ok(Arc::new(CookieSessionStore::new(
            opts.cipher.clone(),
            cookie.clone(),
        ))),
        SessionStoreType::Redis => Ok(Arc::new(RedisSessionStore::new(
            opts.cipher.clone(),
            cookie.clone(),
            &opts.redis,
        )?)),
    }
}
