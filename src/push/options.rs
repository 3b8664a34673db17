//! Headers attached to push sub-requests.

use axum::http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};

/// Marks a request as server-pushed.
pub const SENTINEL_HEADER: &str = "x-h2-push";

/// Request headers copied verbatim onto every push sub-request.
pub const PROXIED_HEADERS: [HeaderName; 4] =
    [ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT];

/// Extra headers sent with every push.
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub headers: HeaderMap,
}

impl PushOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configured header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Build the headers for push sub-requests triggered by a request with
    /// `request` headers.
    ///
    /// Configured headers come first; proxied headers present on the request
    /// replace them, and the sentinel is always set.
    pub fn merge(&self, request: &HeaderMap) -> HeaderMap {
        let mut headers = self.headers.clone();
        for name in &PROXIED_HEADERS {
            let mut values = request.get_all(name).iter();
            if let Some(first) = values.next() {
                headers.insert(name.clone(), first.clone());
                for value in values {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
        headers.insert(
            HeaderName::from_static(SENTINEL_HEADER),
            HeaderValue::from_static("1"),
        );
        headers
    }
}

/// Returns true if the request was pushed by this crate.
pub fn is_push<B>(request: &Request<B>) -> bool {
    is_push_headers(request.headers())
}

/// Header-only form of [`is_push`].
pub fn is_push_headers(headers: &HeaderMap) -> bool {
    headers.contains_key(SENTINEL_HEADER)
}
