use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use http::{HeaderMap, HeaderName, StatusCode};
use serde::Deserialize;

use oauth2_proxy_session::{IdTokenClaims, ProviderError, session_from_id_token};
use oauth2_proxy_session_axum::{
    AuthSession, GatewayState, IntoResponseError, X_FORWARDED_EMAIL, X_FORWARDED_USER,
};

pub(crate) async fn index(session: Option<AuthSession>) -> Html<String> {
    let body = match session {
        Some(s) => format!("Signed in as {}", s.identity().unwrap_or("unknown")),
        None => concat!(
            "<a href=\"/oauth2/sign_in?email=demo@example.com\">Sign in</a> | ",
            "<a href=\"/protected\">Protected</a> | ",
            "<a href=\"/oauth2/sign_out\">Sign out</a>"
        )
        .to_string(),
    };
    Html(body)
}

/// Stand-in upstream: shows what the gateway forwarded.
pub(crate) async fn upstream(headers: HeaderMap, session: AuthSession) -> String {
    let forwarded = |name: HeaderName| {
        headers
            .get(&name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    format!(
        "{}: {}\n{}: {}\nsession: {}\n",
        X_FORWARDED_USER,
        forwarded(X_FORWARDED_USER),
        X_FORWARDED_EMAIL,
        forwarded(X_FORWARDED_EMAIL),
        *session
    )
}

#[derive(Deserialize)]
pub(crate) struct SignInParams {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Development sign-in: trusts the query string in place of a verified ID token.
pub(crate) async fn sign_in(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<SignInParams>,
) -> Result<Response, (StatusCode, String)> {
    let claims = IdTokenClaims {
        subject: params.email.clone(),
        email: Some(params.email),
        email_verified: Some(true),
        preferred_username: params.name,
    };
    let mut session = session_from_id_token("demo-token", &claims, Utc::now() + Duration::hours(1))
        .map_err(|e: ProviderError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut set_headers = HeaderMap::new();
    state
        .manager
        .save_session(&headers, &mut set_headers, &mut session)
        .await
        .into_response_error()?;

    tracing::info!("Signed in {}", session);
    Ok((set_headers, Redirect::to("/protected")).into_response())
}
