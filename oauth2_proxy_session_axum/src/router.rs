use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use http::HeaderMap;
use oauth2_proxy_session::SessionError;

use crate::error::IntoResponseError;
use crate::session::append_headers;
use crate::state::GatewayState;

/// Routes owned by the session layer, to be nested under the proxy prefix.
pub fn session_router(state: GatewayState) -> Router {
    Router::new()
        .route("/sign_out", get(sign_out))
        .with_state(state)
}

async fn sign_out(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let mut set_headers = HeaderMap::new();
    let result = state.manager.clear_session(&headers, &mut set_headers).await;

    let mut response = match result {
        Err(SessionError::Signature(e)) => {
            tracing::debug!("Signing out with an unverifiable cookie: {}", e);
            Redirect::to("/").into_response()
        }
        result => match result.into_response_error() {
            Ok(()) => Redirect::to("/").into_response(),
            Err((status, message)) => {
                tracing::error!("Error clearing session: {}", message);
                (status, message).into_response()
            }
        },
    };

    // Clearing cookies go out even when the cache could not be reached.
    append_headers(response.headers_mut(), &set_headers);
    response
}
