use http::StatusCode;
use oauth2_proxy_session::SessionError;

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match e {
                SessionError::NoCookie(_)
                | SessionError::Signature(_)
                | SessionError::Crypto(_)
                | SessionError::Malformed(_)
                | SessionError::NotFound
                | SessionError::Ticket(_)
                | SessionError::Expired
                | SessionError::Invalid => StatusCode::UNAUTHORIZED,
                SessionError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                SessionError::Provider(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for http::Result<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}
