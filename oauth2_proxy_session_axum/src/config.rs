//! Central configuration for the oauth2_proxy_session_axum crate

use std::sync::LazyLock;

/// Where unauthenticated browsers are sent.
/// Default: "/oauth2/sign_in"
pub static SESSION_SIGN_IN_PATH: LazyLock<String> =
    LazyLock::new(|| sign_in_path(std::env::var("SESSION_SIGN_IN_PATH").ok()));

fn sign_in_path(env_value: Option<String>) -> String {
    env_value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/oauth2/sign_in".to_string())
}
