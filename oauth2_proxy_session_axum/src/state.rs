use oauth2_proxy_session::SessionManager;

/// Shared state for the session middleware and router.
#[derive(Clone)]
pub struct GatewayState {
    pub manager: SessionManager,
    /// Forward the access token upstream as `X-Forwarded-Access-Token`.
    pub pass_access_token: bool,
}

impl GatewayState {
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager,
            pass_access_token: false,
        }
    }

    pub fn with_access_token(mut self, pass_access_token: bool) -> Self {
        self.pass_access_token = pass_access_token;
        self
    }
}
