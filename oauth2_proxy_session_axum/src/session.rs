use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use http::{HeaderMap, Method, StatusCode, request::Parts};
use std::convert::Infallible;
use std::ops::Deref;

use super::config::SESSION_SIGN_IN_PATH;
use oauth2_proxy_session::SessionState;

/// Rejection for unauthenticated requests.
///
/// GET requests are redirected to the sign-in path; anything else gets a 401.
/// Headers collected while loading the session (clearing cookies) are sent along.
pub struct AuthRedirect {
    method: Method,
    headers: HeaderMap,
}

impl AuthRedirect {
    pub(crate) fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
        }
    }

    pub(crate) fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        let mut response = if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", SESSION_SIGN_IN_PATH.as_str());
            Redirect::temporary(SESSION_SIGN_IN_PATH.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        };
        append_headers(response.headers_mut(), &self.headers);
        response
    }
}

/// Append every header in `from`, keeping repeated values such as `Set-Cookie`.
pub(crate) fn append_headers(to: &mut HeaderMap, from: &HeaderMap) {
    for (name, value) in from {
        to.append(name.clone(), value.clone());
    }
}

/// The session loaded by [`require_session`](crate::require_session).
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use oauth2_proxy_session_axum::AuthSession;
///
/// async fn whoami(session: AuthSession) -> String {
///     session.identity().unwrap_or_default().to_string()
/// }
///
/// let app: Router = Router::new().route("/whoami", get(whoami));
/// ```
#[derive(Clone, Debug)]
pub struct AuthSession(pub SessionState);

impl Deref for AuthSession {
    type Target = SessionState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthSession>().cloned().ok_or_else(|| {
            tracing::debug!("No session on request; is require_session installed?");
            AuthRedirect::new(parts.method.clone())
        })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthSession>().cloned())
    }
}
