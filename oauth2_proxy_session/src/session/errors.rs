use thiserror::Error;

use crate::encryption::{CryptoError, SignatureError};
use crate::provider::ProviderError;
use crate::storage::StorageError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// No session cookie on the request. Callers treat this as "not signed in".
    #[error("Session cookie '{0}' not present")]
    NoCookie(String),

    #[error("Cookie signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Malformed session: {0}")]
    Malformed(String),

    #[error("Session cache unavailable: {0}")]
    CacheUnavailable(#[from] StorageError),

    #[error("Session not found in cache")]
    NotFound,

    #[error("Ticket error: {0}")]
    Ticket(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Session expired")]
    Expired,

    #[error("Session invalid")]
    Invalid,

    #[error("unknown session store type '{0}'")]
    UnknownStoreType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
