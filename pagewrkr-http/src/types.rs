use std::time::Duration;

use bytes::Bytes;

/// Status and fully read body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// A JSON `GET` against a listing URL.
///
/// Always sent with `Content-Type: application/json` and no body.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    /// Query parameters appended to `url` in order.
    pub query: Vec<(&'static str, String)>,
    pub timeout: Option<Duration>,
}

impl PageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
