//! Request cookie parsing, `Set-Cookie` rendering and cookie splitting.

use chrono::{DateTime, Duration, Utc};
use headers::HeaderMapExt;
use http::header::{HOST, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use std::str::FromStr;

use crate::config::CookieOptions;
use crate::session::SessionError;

/// Rendered `Set-Cookie` strings at or above this size are split.
pub const MAX_COOKIE_LENGTH: usize = 4000;

/// Upper bound on `name`, `name_1`, ... shards written or scanned.
pub const MAX_COOKIE_SHARDS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SameSite {
    /// Attribute omitted; the browser default applies.
    #[default]
    Default,
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn attribute(self) -> Option<&'static str> {
        match self {
            SameSite::Default => None,
            SameSite::Lax => Some("Lax"),
            SameSite::Strict => Some("Strict"),
            SameSite::None => Some("None"),
        }
    }
}

impl FromStr for SameSite {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(SameSite::Default),
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(SessionError::Config(format!(
                "invalid SameSite value '{other}', expected one of '', lax, strict, none"
            ))),
        }
    }
}

/// Name of shard `index`: the base name for 0, `name_<index>` otherwise.
pub fn shard_name(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}_{index}")
    }
}

/// Value of cookie `name` on the request, if any.
pub fn get_cookie(request: &HeaderMap, name: &str) -> Option<String> {
    request
        .typed_get::<headers::Cookie>()
        .and_then(|cookies| cookies.get(name).map(String::from))
}

/// Names of `base` and its numbered shards present on the request.
pub fn present_shards(request: &HeaderMap, base: &str) -> Vec<String> {
    let Some(cookies) = request.typed_get::<headers::Cookie>() else {
        return Vec::new();
    };

    (0..MAX_COOKIE_SHARDS)
        .map(|i| shard_name(base, i))
        .filter(|name| cookies.get(name).is_some())
        .collect()
}

/// Reassemble a possibly split cookie value from the request.
///
/// Returns `Ok(None)` when neither the base cookie nor any shard is present.
/// Shards without a base cookie, or shards after a gap, are rejected.
pub fn join_cookies(request: &HeaderMap, base: &str) -> Result<Option<String>, SessionError> {
    let Some(cookies) = request.typed_get::<headers::Cookie>() else {
        return Ok(None);
    };

    let mut joined = String::new();
    let mut found = 0;
    let mut gap_at = None;

    for i in 0..MAX_COOKIE_SHARDS {
        let name = shard_name(base, i);
        match cookies.get(&name) {
            Some(part) => {
                if let Some(gap) = gap_at {
                    return Err(SessionError::Cookie(format!(
                        "cookie '{name}' present but shard {gap} is missing"
                    )));
                }
                joined.push_str(part);
                found += 1;
            }
            None if gap_at.is_none() => gap_at = Some(i),
            None => {}
        }
    }

    match (found, gap_at) {
        (0, _) => Ok(None),
        (_, Some(0)) => Err(SessionError::Cookie(format!(
            "cookie shards of '{base}' present without the base cookie"
        ))),
        _ => Ok(Some(joined)),
    }
}

fn request_host(request: &HeaderMap) -> Option<&str> {
    let host = request.get(HOST)?.to_str().ok()?;
    // Bracketed IPv6 literals keep their colons.
    if let Some(end) = host.strip_prefix('[').and_then(|h| h.find(']')) {
        return Some(&host[..end + 2]);
    }
    Some(host.split(':').next().unwrap_or(host))
}

/// `host` is `domain` itself or one of its subdomains. A leading dot on `domain` is ignored.
fn host_in_domain(host: &str, domain: &str) -> bool {
    let bare = domain.trim_start_matches('.');
    if bare.is_empty() {
        return false;
    }
    host == bare
        || host
            .strip_suffix(bare)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// First configured domain that the request host falls under.
pub fn cookie_domain(request: &HeaderMap, opts: &CookieOptions) -> Option<String> {
    if opts.domains.is_empty() {
        return None;
    }

    let host = request_host(request).unwrap_or_default();
    let domain = opts
        .domains
        .iter()
        .find(|d| host_in_domain(host, d))
        .cloned();

    if domain.is_none() {
        tracing::warn!(
            "Request host '{}' matches none of the configured cookie domains; omitting Domain",
            host
        );
    }
    domain
}

/// Render a `Set-Cookie` value for `name=value` that lives for `expiration` from `now`.
///
/// A negative `expiration` yields a clearing cookie. An expiry outside the
/// representable date range is a [`SessionError::Cookie`].
pub fn make_cookie(
    request: &HeaderMap,
    name: &str,
    value: &str,
    opts: &CookieOptions,
    expiration: Duration,
    now: DateTime<Utc>,
) -> Result<String, SessionError> {
    let mut cookie = format!("{name}={value}; Path={}", opts.path);

    if let Some(domain) = cookie_domain(request, opts) {
        cookie.push_str(&format!("; Domain={domain}"));
    }

    let expires = now.checked_add_signed(expiration).ok_or_else(|| {
        SessionError::Cookie(format!(
            "cookie expiry {}s from now is out of range",
            expiration.num_seconds()
        ))
    })?;
    cookie.push_str(&format!(
        "; Expires={}; Max-Age={}",
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        expiration.num_seconds().max(0)
    ));

    if opts.http_only {
        cookie.push_str("; HttpOnly");
    }
    if opts.secure {
        cookie.push_str("; Secure");
    }
    if let Some(same_site) = opts.same_site.attribute() {
        cookie.push_str(&format!("; SameSite={same_site}"));
    }

    Ok(cookie)
}

/// Expired, empty cookie for `name`.
pub fn make_clearing_cookie(
    request: &HeaderMap,
    name: &str,
    opts: &CookieOptions,
    now: DateTime<Utc>,
) -> Result<String, SessionError> {
    make_cookie(request, name, "", opts, Duration::hours(-1), now)
}

pub fn append_set_cookie(response: &mut HeaderMap, cookie: &str) -> Result<(), SessionError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| SessionError::Cookie(format!("invalid Set-Cookie value: {e}")))?;
    response.append(SET_COOKIE, value);
    Ok(())
}

fn chunk_ascii(value: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Render `name=value`, splitting into numbered shards when the single cookie
/// would reach [`MAX_COOKIE_LENGTH`].
pub fn make_split_cookies(
    request: &HeaderMap,
    name: &str,
    value: &str,
    opts: &CookieOptions,
    expiration: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<String>, SessionError> {
    let single = make_cookie(request, name, value, opts, expiration, now)?;
    if single.len() < MAX_COOKIE_LENGTH {
        return Ok(vec![single]);
    }

    // Size the chunks for the longest shard name that could be emitted.
    let longest_name = shard_name(name, MAX_COOKIE_SHARDS - 1);
    let overhead = make_cookie(request, &longest_name, "", opts, expiration, now)?.len();
    let chunk_size = MAX_COOKIE_LENGTH
        .checked_sub(overhead + 1)
        .filter(|size| *size > 0)
        .ok_or_else(|| SessionError::Cookie("cookie attributes leave no room for a value".into()))?;

    let chunks = chunk_ascii(value, chunk_size);
    if chunks.len() > MAX_COOKIE_SHARDS {
        return Err(SessionError::Cookie(format!(
            "session needs {} cookies, more than the {MAX_COOKIE_SHARDS} allowed",
            chunks.len()
        )));
    }

    tracing::debug!("Splitting cookie '{}' into {} shards", name, chunks.len());

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| make_cookie(request, &shard_name(name, i), chunk, opts, expiration, now))
        .collect()
}
