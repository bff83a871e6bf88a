//! Signed cookie envelope: `base64url(value)|unix-timestamp|signature`.
//!
//! The signature is an HMAC over the cookie name, the encoded value and the
//! timestamp, keyed by the cookie secret. New signatures always use HMAC-SHA256.
//! HMAC-SHA1 signatures issued by older deployments are still accepted when the
//! [`SignaturePolicy`] allows it.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// How far ahead of the local clock a cookie timestamp may be.
const MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

/// Which signature algorithms are accepted on verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignaturePolicy {
    /// Accept HMAC-SHA1 signatures. Compatibility path for cookies minted by
    /// older releases; slated for removal.
    pub accept_legacy_sha1: bool,
}

impl Default for SignaturePolicy {
    fn default() -> Self {
        Self {
            accept_legacy_sha1: true,
        }
    }
}

impl SignaturePolicy {
    pub const STRICT: Self = Self {
        accept_legacy_sha1: false,
    };
}

fn sha256_signature(secret: &str, cookie_name: &str, value: &str, timestamp: &str) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(cookie_name.as_bytes());
    mac.update(value.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn legacy_sha1_signature(
    secret: &str,
    cookie_name: &str,
    value: &str,
    timestamp: &str,
) -> Vec<u8> {
    let key = ring::hmac::Key::new(
        ring::hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        secret.as_bytes(),
    );
    let mut ctx = ring::hmac::Context::with_key(&key);
    ctx.update(cookie_name.as_bytes());
    ctx.update(value.as_bytes());
    ctx.update(timestamp.as_bytes());
    ctx.sign().as_ref().to_vec()
}

/// Sign `(cookie_name, value, timestamp)` with the current algorithm.
pub fn sign(secret: &str, cookie_name: &str, value: &str, timestamp: &str) -> String {
    URL_SAFE.encode(sha256_signature(secret, cookie_name, value, timestamp))
}

/// Sign with the legacy algorithm. Only used to exercise the compatibility path.
#[cfg(test)]
pub(crate) fn sign_legacy(secret: &str, cookie_name: &str, value: &str, timestamp: &str) -> String {
    URL_SAFE.encode(legacy_sha1_signature(
        secret,
        cookie_name,
        value,
        timestamp,
    ))
}

/// Check a signature against the current algorithm, then the legacy one if allowed.
pub fn verify(
    signature: &str,
    secret: &str,
    cookie_name: &str,
    value: &str,
    timestamp: &str,
    policy: SignaturePolicy,
) -> bool {
    let Ok(provided) = URL_SAFE.decode(signature) else {
        return false;
    };

    let expected = sha256_signature(secret, cookie_name, value, timestamp);
    if bool::from(provided.ct_eq(&expected)) {
        return true;
    }

    if policy.accept_legacy_sha1 {
        let legacy = legacy_sha1_signature(secret, cookie_name, value, timestamp);
        return bool::from(provided.ct_eq(&legacy));
    }

    false
}

/// Wrap `value` in a signed envelope stamped with `now`.
pub fn signed_value(secret: &str, cookie_name: &str, value: &str, now: DateTime<Utc>) -> String {
    let encoded = URL_SAFE.encode(value.as_bytes());
    let timestamp = now.timestamp().to_string();
    let signature = sign(secret, cookie_name, &encoded, &timestamp);
    format!("{encoded}|{timestamp}|{signature}")
}

/// Validate a signed envelope read from cookie `cookie_name`.
///
/// Returns the decoded payload and the signing time. Rejects envelopes that are
/// malformed, carry a bad signature, are older than `max_age`, or are stamped
/// further in the future than the tolerated clock skew.
pub fn validate(
    cookie_name: &str,
    cookie_value: &str,
    secret: &str,
    max_age: Duration,
    policy: SignaturePolicy,
) -> Result<(String, DateTime<Utc>), SignatureError> {
    let parts: Vec<&str> = cookie_value.split('|').collect();
    let [encoded, timestamp, signature] = parts.as_slice() else {
        return Err(SignatureError::Malformed);
    };

    if !verify(signature, secret, cookie_name, encoded, timestamp, policy) {
        return Err(SignatureError::InvalidSignature);
    }

    let seconds: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    let signed_at = DateTime::from_timestamp(seconds, 0).ok_or(SignatureError::Malformed)?;

    let now = Utc::now();
    if signed_at > now + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
        return Err(SignatureError::FromFuture);
    }
    if now - signed_at > max_age {
        return Err(SignatureError::Expired);
    }

    let raw = URL_SAFE
        .decode(encoded)
        .map_err(|_| SignatureError::Encoding)?;
    let value = String::from_utf8(raw).map_err(|_| SignatureError::Encoding)?;

    Ok((value, signed_at))
}
