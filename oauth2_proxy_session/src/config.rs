//! Option structs consumed by the session stores.
//!
//! Nothing here is global: callers build the options once (usually with
//! `from_env`) and pass them into the store constructors.

use chrono::Duration;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cookies::SameSite;
use crate::encryption::{Cipher, SignaturePolicy};
use crate::session::SessionError;
use crate::utils::secret_bytes;

pub const DEFAULT_COOKIE_NAME: &str = "_oauth2_proxy";
pub const DEFAULT_COOKIE_EXPIRE_SECS: i64 = 168 * 3600;
/// Upper bound on the cookie lifetime (ten years).
pub const MAX_COOKIE_EXPIRE_SECS: i64 = 10 * 365 * 24 * 3600;
pub const DEFAULT_REDIS_TIMEOUT_SECS: u64 = 5;

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool, SessionError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(SessionError::Config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

fn parse_secs(key: &str, value: Option<String>, default: i64) -> Result<i64, SessionError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs >= 0)
            .ok_or_else(|| {
                SessionError::Config(format!("{key} must be a number of seconds, got '{v}'"))
            }),
    }
}

fn parse_duration(key: &str, value: Option<String>, default: i64) -> Result<Duration, SessionError> {
    let secs = parse_secs(key, value, default)?;
    Duration::try_seconds(secs)
        .ok_or_else(|| SessionError::Config(format!("{key} is out of range, got {secs}s")))
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                        | b'{'
                        | b'}'
                )
        })
}

/// Attributes and secrets of the session cookie.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    /// HMAC key for the signed cookie envelope.
    pub secret: String,
    pub domains: Vec<String>,
    pub path: String,
    pub expire: Duration,
    /// Sessions older than this are revalidated with the provider. Zero disables.
    pub refresh: Duration,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Accept HMAC-SHA1 signed cookies from older releases.
    pub legacy_sha1_signatures: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            secret: String::new(),
            domains: Vec::new(),
            path: "/".to_string(),
            expire: Duration::seconds(DEFAULT_COOKIE_EXPIRE_SECS),
            refresh: Duration::zero(),
            secure: true,
            http_only: true,
            same_site: SameSite::Default,
            legacy_sha1_signatures: true,
        }
    }
}

impl CookieOptions {
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let opts = Self {
            name: lookup("SESSION_COOKIE_NAME").unwrap_or(defaults.name),
            secret: lookup("SESSION_COOKIE_SECRET").unwrap_or_default(),
            domains: parse_list(lookup("SESSION_COOKIE_DOMAINS")),
            path: lookup("SESSION_COOKIE_PATH").unwrap_or(defaults.path),
            expire: parse_duration(
                "SESSION_COOKIE_EXPIRE",
                lookup("SESSION_COOKIE_EXPIRE"),
                DEFAULT_COOKIE_EXPIRE_SECS,
            )?,
            refresh: parse_duration(
                "SESSION_COOKIE_REFRESH",
                lookup("SESSION_COOKIE_REFRESH"),
                0,
            )?,
            secure: parse_bool("SESSION_COOKIE_SECURE", lookup("SESSION_COOKIE_SECURE"), true)?,
            http_only: parse_bool(
                "SESSION_COOKIE_HTTPONLY",
                lookup("SESSION_COOKIE_HTTPONLY"),
                true,
            )?,
            same_site: lookup("SESSION_COOKIE_SAMESITE")
                .as_deref()
                .unwrap_or("")
                .parse()?,
            legacy_sha1_signatures: parse_bool(
                "SESSION_COOKIE_LEGACY_SHA1",
                lookup("SESSION_COOKIE_LEGACY_SHA1"),
                true,
            )?,
        };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::Config(
                "cookie secret must be set".to_string(),
            ));
        }
        if !is_cookie_token(&self.name) {
            return Err(SessionError::Config(format!(
                "cookie name '{}' is not a valid cookie name",
                self.name
            )));
        }
        // A zero lifetime would leave ticketed cache entries without a TTL.
        if self.expire <= Duration::zero() || self.expire.num_seconds() > MAX_COOKIE_EXPIRE_SECS {
            return Err(SessionError::Config(format!(
                "cookie expire must be between 1s and {MAX_COOKIE_EXPIRE_SECS}s, got {}s",
                self.expire.num_seconds()
            )));
        }
        if self.refresh > Duration::zero() && self.refresh >= self.expire {
            return Err(SessionError::Config(format!(
                "cookie refresh ({}s) must be less than cookie expire ({}s)",
                self.refresh.num_seconds(),
                self.expire.num_seconds()
            )));
        }
        Ok(())
    }

    pub fn signature_policy(&self) -> SignaturePolicy {
        SignaturePolicy {
            accept_legacy_sha1: self.legacy_sha1_signatures,
        }
    }

    /// Cache TTL matching the cookie lifetime.
    pub(crate) fn expire_secs(&self) -> u64 {
        self.expire.num_seconds().max(0) as u64
    }
}

/// Connection settings for the redis-backed store.
#[derive(Debug, Clone)]
pub struct RedisStoreOptions {
    pub connection_url: String,
    pub use_sentinel: bool,
    pub sentinel_master_name: String,
    pub sentinel_connection_urls: Vec<String>,
    pub use_cluster: bool,
    pub cluster_connection_urls: Vec<String>,
    /// PEM bundle appended to the trusted roots for `rediss://` connections.
    pub ca_path: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
    /// Upper bound for each cache round trip.
    pub timeout: std::time::Duration,
}

impl Default for RedisStoreOptions {
    fn default() -> Self {
        Self {
            connection_url: String::new(),
            use_sentinel: false,
            sentinel_master_name: String::new(),
            sentinel_connection_urls: Vec::new(),
            use_cluster: false,
            cluster_connection_urls: Vec::new(),
            ca_path: None,
            insecure_skip_tls_verify: false,
            timeout: std::time::Duration::from_secs(DEFAULT_REDIS_TIMEOUT_SECS),
        }
    }
}

impl RedisStoreOptions {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = parse_secs(
            "SESSION_REDIS_TIMEOUT",
            lookup("SESSION_REDIS_TIMEOUT"),
            DEFAULT_REDIS_TIMEOUT_SECS as i64,
        )?;

        Ok(Self {
            connection_url: lookup("SESSION_REDIS_CONNECTION_URL").unwrap_or_default(),
            use_sentinel: parse_bool(
                "SESSION_REDIS_USE_SENTINEL",
                lookup("SESSION_REDIS_USE_SENTINEL"),
                false,
            )?,
            sentinel_master_name: lookup("SESSION_REDIS_SENTINEL_MASTER_NAME").unwrap_or_default(),
            sentinel_connection_urls: parse_list(lookup("SESSION_REDIS_SENTINEL_CONNECTION_URLS")),
            use_cluster: parse_bool(
                "SESSION_REDIS_USE_CLUSTER",
                lookup("SESSION_REDIS_USE_CLUSTER"),
                false,
            )?,
            cluster_connection_urls: parse_list(lookup("SESSION_REDIS_CLUSTER_CONNECTION_URLS")),
            ca_path: lookup("SESSION_REDIS_CA_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            insecure_skip_tls_verify: parse_bool(
                "SESSION_REDIS_INSECURE_SKIP_TLS_VERIFY",
                lookup("SESSION_REDIS_INSECURE_SKIP_TLS_VERIFY"),
                false,
            )?,
            timeout: std::time::Duration::from_secs(timeout as u64),
        })
    }
}

/// Store selection plus the secrets shared by both store variants.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// `cookie` or `redis`; checked by [`crate::new_session_store`].
    pub store_type: String,
    /// Field cipher. `None` keeps only identity fields in plaintext.
    pub cipher: Option<Arc<Cipher>>,
    pub redis: RedisStoreOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            store_type: "cookie".to_string(),
            cipher: None,
            redis: RedisStoreOptions::default(),
        }
    }
}

impl SessionOptions {
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cipher = match lookup("SESSION_CIPHER_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => Some(Arc::new(Cipher::new(&secret_bytes(&secret))?)),
            None => None,
        };

        Ok(Self {
            store_type: lookup("SESSION_STORE_TYPE")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "cookie".to_string()),
            cipher,
            redis: RedisStoreOptions::from_lookup(&lookup)?,
        })
    }
}
