use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use ring::rand::SecureRandom;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}

/// Fill a fresh buffer of `len` bytes from the system CSPRNG.
///
/// Failure to read randomness is returned to the caller; there is no fallback source.
pub(crate) fn gen_random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(buf)
}

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Interpret a configured secret.
///
/// A value that base64url-decodes (with or without padding) to a valid AES key
/// length is used decoded, anything else is used as raw bytes.
pub fn secret_bytes(secret: &str) -> Vec<u8> {
    let trimmed = secret.trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| URL_SAFE.decode(secret));
    match decoded {
        Ok(bytes) if matches!(bytes.len(), 16 | 24 | 32) => bytes,
        _ => secret.as_bytes().to_vec(),
    }
}
