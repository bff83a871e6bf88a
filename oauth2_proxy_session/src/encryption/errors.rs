use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The cipher secret is not 16, 24 or 32 bytes long.
    #[error("Invalid key: cipher secret must be 16, 24 or 32 bytes, got {0}")]
    InvalidKey(usize),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Random error: {0}")]
    Random(String),
}

impl From<UtilError> for CryptoError {
    fn from(err: UtilError) -> Self {
        match err {
            UtilError::Crypto(msg) => Self::Random(msg),
            UtilError::Format(msg) => Self::Decryption(msg),
        }
    }
}

/// Reasons a signed cookie envelope is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Cookie value is not a signed envelope")]
    Malformed,

    #[error("Cookie signature not valid")]
    InvalidSignature,

    #[error("Cookie expired")]
    Expired,

    #[error("Cookie timestamp is in the future")]
    FromFuture,

    #[error("Cookie payload encoding is invalid")]
    Encoding,
}
