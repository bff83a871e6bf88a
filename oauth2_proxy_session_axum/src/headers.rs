//! Identity headers passed to the upstream.

use http::{HeaderMap, HeaderName, HeaderValue};
use oauth2_proxy_session::SessionState;

pub const X_FORWARDED_USER: HeaderName = HeaderName::from_static("x-forwarded-user");
pub const X_FORWARDED_EMAIL: HeaderName = HeaderName::from_static("x-forwarded-email");
pub const X_FORWARDED_PREFERRED_USERNAME: HeaderName =
    HeaderName::from_static("x-forwarded-preferred-username");
pub const X_FORWARDED_ACCESS_TOKEN: HeaderName =
    HeaderName::from_static("x-forwarded-access-token");

const IDENTITY_HEADERS: [HeaderName; 4] = [
    X_FORWARDED_USER,
    X_FORWARDED_EMAIL,
    X_FORWARDED_PREFERRED_USERNAME,
    X_FORWARDED_ACCESS_TOKEN,
];

/// Remove identity headers supplied by the client.
pub(crate) fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in IDENTITY_HEADERS {
        if headers.remove(&name).is_some() {
            tracing::warn!("Dropped client-supplied {} header", name);
        }
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Session value for {} is not a valid header value", name),
    }
}

/// Set identity headers from `session`.
pub(crate) fn inject_identity_headers(
    headers: &mut HeaderMap,
    session: &SessionState,
    pass_access_token: bool,
) {
    insert(headers, X_FORWARDED_USER, session.identity());
    insert(headers, X_FORWARDED_EMAIL, session.email.as_deref());
    insert(
        headers,
        X_FORWARDED_PREFERRED_USERNAME,
        session.preferred_username.as_deref(),
    );
    if pass_access_token {
        insert(
            headers,
            X_FORWARDED_ACCESS_TOKEN,
            session.access_token.as_deref(),
        );
    }
}
