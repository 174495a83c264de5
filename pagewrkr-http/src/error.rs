use std::time::Duration;

use hyper_util::client::legacy;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse reason a listing request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HttpTransportErrorKind {
    InvalidUrl,
    Connect,
    Request,
    Timeout,
    BodyRead,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{0}` is not a valid http(s) url")]
    InvalidUrl(String),

    #[error("could not connect: {0}")]
    Connect(#[source] legacy::Error),

    #[error("request failed before a response arrived: {0}")]
    Request(#[source] legacy::Error),

    #[error("no complete response within {0:?}")]
    Timeout(Duration),

    #[error("response body was cut off: {0}")]
    BodyRead(#[from] hyper::Error),
}

impl From<legacy::Error> for Error {
    fn from(err: legacy::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Request(err)
        }
    }
}

impl Error {
    #[must_use]
    pub fn transport_error_kind(&self) -> HttpTransportErrorKind {
        match self {
            Self::InvalidUrl(_) => HttpTransportErrorKind::InvalidUrl,
            Self::Connect(_) => HttpTransportErrorKind::Connect,
            Self::Request(_) => HttpTransportErrorKind::Request,
            Self::Timeout(_) => HttpTransportErrorKind::Timeout,
            Self::BodyRead(_) => HttpTransportErrorKind::BodyRead,
        }
    }
}
