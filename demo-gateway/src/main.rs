use axum::{Router, middleware::from_fn_with_state, routing::get};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oauth2_proxy_session::{
    CookieOptions, DefaultProvider, SessionManager, SessionOptions, new_session_store,
};
use oauth2_proxy_session_axum::{GatewayState, require_session, session_router};

mod handlers;
mod server;

use crate::{
    handlers::{index, sign_in, upstream},
    server::spawn_http_server,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,oauth2_proxy_session=debug,oauth2_proxy_session_axum=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cookie = CookieOptions::from_env()?;
    let session = SessionOptions::from_env()?;
    let store = new_session_store(&session, &cookie)?;

    let manager = SessionManager::new(store, Arc::new(DefaultProvider), cookie.refresh);
    let pass_access_token = std::env::var("PASS_ACCESS_TOKEN")
        .map(|v| v == "true")
        .unwrap_or(false);
    let state = GatewayState::new(manager).with_access_token(pass_access_token);

    let protected = Router::new()
        .route("/protected", get(upstream))
        .layer(from_fn_with_state(state.clone(), require_session));

    let oauth2 = Router::new()
        .route("/sign_in", get(sign_in))
        .with_state(state.clone())
        .merge(session_router(state));

    let app = Router::new()
        .route("/", get(index))
        .nest("/oauth2", oauth2)
        .merge(protected);

    spawn_http_server(3001, app).await?;
    Ok(())
}
