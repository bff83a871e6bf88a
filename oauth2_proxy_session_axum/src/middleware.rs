use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};

use crate::error::IntoResponseError;
use crate::headers::{inject_identity_headers, strip_identity_headers};
use crate::session::{AuthRedirect, AuthSession, append_headers};
use crate::state::GatewayState;

/// Authenticate the request from its session cookie before passing it on.
///
/// Identity headers sent by the client are always dropped. With a valid
/// session they are set from the session and the request reaches `next`;
/// cookies rewritten during a refresh are added to the response. Otherwise
/// GET requests are redirected to the sign-in path and other methods get a
/// 401, with any clearing cookies attached.
pub async fn require_session(
    State(state): State<GatewayState>,
    mut req: Request,
    next: Next,
) -> Response {
    strip_identity_headers(req.headers_mut());

    let mut set_headers = HeaderMap::new();
    let result = state
        .manager
        .load_session(req.headers(), &mut set_headers)
        .await;

    let session = match result.into_response_error() {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::debug!("No session cookie");
            return AuthRedirect::new(req.method().clone())
                .with_headers(set_headers)
                .into_response();
        }
        // A failed refresh has already cleared the session, so sign in again.
        Err((status, message))
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_GATEWAY =>
        {
            tracing::debug!("Rejected session: {}", message);
            return AuthRedirect::new(req.method().clone())
                .with_headers(set_headers)
                .into_response();
        }
        Err((status, message)) => {
            tracing::error!("Session lookup failed: {}", message);
            let mut response = (status, message).into_response();
            append_headers(response.headers_mut(), &set_headers);
            return response;
        }
    };

    inject_identity_headers(req.headers_mut(), &session, state.pass_access_token);
    req.extensions_mut().insert(AuthSession(session));

    let mut response = next.run(req).await;
    append_headers(response.headers_mut(), &set_headers);
    response
}
