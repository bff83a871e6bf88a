//! Axum integration for `oauth2-proxy-session`.
//!
//! [`require_session`] authenticates proxied requests and forwards the
//! signed-in identity upstream as `X-Forwarded-*` headers.
//! [`session_router`] serves the sign-out endpoint.

mod config;
mod error;
mod headers;
mod middleware;
mod router;
mod session;
mod state;

#[cfg(test)]
mod test_utils;

pub use config::SESSION_SIGN_IN_PATH;
pub use error::IntoResponseError;
pub use headers::{
    X_FORWARDED_ACCESS_TOKEN, X_FORWARDED_EMAIL, X_FORWARDED_PREFERRED_USERNAME,
    X_FORWARDED_USER,
};
pub use middleware::require_session;
pub use router::session_router;
pub use session::{AuthRedirect, AuthSession};
pub use state::GatewayState;
