use http::header::{COOKIE, HOST, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use std::collections::BTreeMap;

/// Mock browser for integration testing
///
/// Keeps a cookie jar fed by `Set-Cookie` response headers and renders it as
/// the `Cookie` header of the next request. Cookies with an empty value or
/// `Max-Age=0` are removed from the jar.
#[derive(Default)]
pub struct MockBrowser {
    jar: BTreeMap<String, String>,
    host: Option<String>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(host: &str) -> Self {
        Self {
            host: Some(host.to_string()),
            ..Self::default()
        }
    }

    /// Request headers carrying the current jar.
    pub fn request(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(host) = &self.host {
            headers.insert(HOST, HeaderValue::from_str(host).unwrap());
        }
        if !self.jar.is_empty() {
            let cookie = self
                .jar
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        }
        headers
    }

    /// Apply every `Set-Cookie` header from `response`.
    pub fn receive(&mut self, response: &HeaderMap) {
        for header in response.get_all(SET_COOKIE) {
            let raw = header.to_str().unwrap();
            let (pair, attributes) = raw.split_once(';').unwrap_or((raw, ""));
            let (name, value) = pair.split_once('=').unwrap();

            let expired = attributes
                .split(';')
                .any(|attr| attr.trim().eq_ignore_ascii_case("Max-Age=0"));

            if value.is_empty() || expired {
                self.jar.remove(name.trim());
            } else {
                self.jar.insert(name.trim().to_string(), value.to_string());
            }
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.jar.get(name).map(String::as_str)
    }

    pub fn cookie_names(&self) -> Vec<&str> {
        self.jar.keys().map(String::as_str).collect()
    }

    /// Overwrite a cookie, as a tampering client would.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.jar.insert(name.to_string(), value.to_string());
    }

    pub fn remove_cookie(&mut self, name: &str) {
        self.jar.remove(name);
    }
}
