//! Helpers shared by unit tests.

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};

use crate::config::CookieOptions;

pub(crate) const COOKIE_SECRET: &str = "cookie-secret-for-tests";

pub(crate) fn cookie_options() -> CookieOptions {
    CookieOptions {
        secret: COOKIE_SECRET.to_string(),
        ..CookieOptions::default()
    }
}

/// `(name, value)` of every `Set-Cookie` header in `response`.
pub(crate) fn set_cookies(response: &HeaderMap) -> Vec<(String, String)> {
    response
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Request headers a browser would send after receiving `response`.
/// Cookies cleared by the response are left out.
pub(crate) fn request_from_response(response: &HeaderMap) -> HeaderMap {
    let jar: Vec<String> = set_cookies(response)
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect();

    let mut request = HeaderMap::new();
    if !jar.is_empty() {
        request.insert(
            COOKIE,
            HeaderValue::from_str(&jar.join("; ")).expect("valid cookie header"),
        );
    }
    request
}

pub(crate) fn request_with_cookie(cookie: &str) -> HeaderMap {
    let mut request = HeaderMap::new();
    request.insert(COOKIE, HeaderValue::from_str(cookie).expect("valid cookie header"));
    request
}
