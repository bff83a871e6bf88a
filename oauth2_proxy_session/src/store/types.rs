use async_trait::async_trait;
use http::HeaderMap;

use crate::session::{SessionError, SessionState};

/// Persists a [`SessionState`] across requests.
///
/// Stores read cookies from the request headers and append `Set-Cookie`
/// headers to the response headers; they never touch request bodies.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Persist `session`, stamping `created_at` if unset, and emit the cookies
    /// that address it.
    async fn save(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
        session: &mut SessionState,
    ) -> Result<(), SessionError>;

    /// Recover the session addressed by the request cookies.
    ///
    /// A request without a session cookie fails with [`SessionError::NoCookie`].
    async fn load(&self, request: &HeaderMap) -> Result<SessionState, SessionError>;

    /// Forget the session and emit cookies that expire it in the browser.
    async fn clear(&self, request: &HeaderMap, response: &mut HeaderMap)
    -> Result<(), SessionError>;
}
