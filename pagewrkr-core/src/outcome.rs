use std::fmt;
use std::time::Duration;

use pagewrkr_http::HttpTransportErrorKind;

use crate::payload::Payload;

/// Query parameters of one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestSpec {
    pub page: u64,
    pub size: u64,
}

impl RequestSpec {
    #[must_use]
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TransportErrorKind {
    InvalidUrl,
    Connect,
    Request,
    Timeout,
    BodyRead,
    /// The run was stopped while the request was in flight.
    Cancelled,
}

impl From<HttpTransportErrorKind> for TransportErrorKind {
    fn from(kind: HttpTransportErrorKind) -> Self {
        match kind {
            HttpTransportErrorKind::InvalidUrl => Self::InvalidUrl,
            HttpTransportErrorKind::Connect => Self::Connect,
            HttpTransportErrorKind::Request => Self::Request,
            HttpTransportErrorKind::Timeout => Self::Timeout,
            HttpTransportErrorKind::BodyRead => Self::BodyRead,
        }
    }
}

/// Why a 2xx listing body failed the `{items: [{id, name, price}]}` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("response body is not valid JSON")]
    InvalidJson,

    #[error("`items` field is missing")]
    MissingItems,

    #[error("`items` is not an array")]
    ItemsNotArray,

    #[error("item {index} is not an object")]
    ItemNotObject { index: usize },

    #[error("item {index}: `{field}` is missing")]
    MissingField { index: usize, field: &'static str },

    #[error("item {index}: `{field}` has the wrong type")]
    WrongFieldType { index: usize, field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Transport(TransportErrorKind),
    /// A response arrived with a status other than 200.
    HttpStatus(u16),
    /// A 200 response whose body does not match the listing shape.
    Schema(SchemaError),
    /// Building the request spec or executing it panicked.
    Panicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(kind) => write!(f, "transport error: {kind}"),
            Self::HttpStatus(status) => write!(f, "unexpected http status {status}"),
            Self::Schema(err) => write!(f, "schema error: {err}"),
            Self::Panicked => f.write_str("worker panicked"),
        }
    }
}

/// The classified result of exactly one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// `None` when no response was received.
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    /// Length of `items`; `None` when the field was absent or unreadable.
    pub item_count: Option<usize>,
    pub has_valid_schema: bool,
    pub error: Option<ErrorKind>,
}

fn millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}

impl RequestOutcome {
    #[must_use]
    pub fn transport(kind: TransportErrorKind, latency: Duration) -> Self {
        Self {
            status_code: None,
            latency_ms: millis(latency),
            item_count: None,
            has_valid_schema: false,
            error: Some(ErrorKind::Transport(kind)),
        }
    }

    #[must_use]
    pub fn http_status(status: u16, latency: Duration) -> Self {
        Self {
            status_code: Some(status),
            latency_ms: millis(latency),
            item_count: None,
            has_valid_schema: false,
            error: Some(ErrorKind::HttpStatus(status)),
        }
    }

    /// A 200 response whose body was inspected as a listing.
    #[must_use]
    pub fn listing(latency: Duration, payload: Payload) -> Self {
        let (has_valid_schema, error) = match payload.schema {
            Ok(()) => (true, None),
            Err(err) => (false, Some(ErrorKind::Schema(err))),
        };
        Self {
            status_code: Some(200),
            latency_ms: millis(latency),
            item_count: payload.item_count,
            has_valid_schema,
            error,
        }
    }

    #[must_use]
    pub fn panicked(latency: Duration) -> Self {
        Self {
            status_code: None,
            latency_ms: millis(latency),
            item_count: None,
            has_valid_schema: false,
            error: Some(ErrorKind::Panicked),
        }
    }

    /// Shorthand for a 200 response carrying `item_count` well-formed items.
    #[must_use]
    pub fn ok(item_count: usize, latency: Duration) -> Self {
        Self::listing(
            latency,
            Payload {
                item_count: Some(item_count),
                schema: Ok(()),
            },
        )
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.error,
            Some(ErrorKind::Transport(TransportErrorKind::Timeout))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_kinds_map_onto_transport_kinds() {
        assert_eq!(
            TransportErrorKind::from(HttpTransportErrorKind::Connect),
            TransportErrorKind::Connect
        );
        assert_eq!(
            TransportErrorKind::from(HttpTransportErrorKind::Timeout),
            TransportErrorKind::Timeout
        );
        assert_eq!(TransportErrorKind::Connect.to_string(), "connect");
    }

    #[test]
    fn schema_error_payload_keeps_item_count() {
        let outcome = RequestOutcome::listing(
            Duration::from_millis(12),
            Payload {
                item_count: Some(2),
                schema: Err(SchemaError::MissingField {
                    index: 1,
                    field: "price",
                }),
            },
        );
        assert_eq!(outcome.item_count, Some(2));
        assert!(!outcome.has_valid_schema);
        assert_eq!(outcome.latency_ms, 12);
        assert_eq!(
            outcome.error.map(|e| e.to_string()),
            Some("schema error: item 1: `price` is missing".to_string())
        );
    }

    #[test]
    fn transport_outcome_has_no_status() {
        let outcome = RequestOutcome::transport(TransportErrorKind::Timeout, Duration::ZERO);
        assert_eq!(outcome.status_code, None);
        assert!(outcome.is_timeout());
    }
}
