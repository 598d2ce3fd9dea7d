use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// A parameter record could not be encoded. Always a caller bug.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Error building request: {0}")]
    RequestConstruction(String),

    /// The transport or socket could not complete the call.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The venue answered with a non-success status.
    #[error(transparent)]
    Http(#[from] HttpFailure),

    #[error("Error decoding response: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    /// Returns the venue failure if this error came from a non-success status
    pub fn as_http_failure(&self) -> Option<&HttpFailure> {
        match self {
            Self::Http(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Error body returned by binance alongside a non-200 status
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub msg: String,
}

/// A non-200 response from binance.
///
/// `code` and `message` are only populated when the body matched the venue
/// error schema; otherwise they hold their zero values and only the status is
/// meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    status: u16,
    body: ErrorBody,
}

impl HttpFailure {
    pub fn new(status: u16, body: ErrorBody) -> Self {
        Self { status, body }
    }

    pub fn status_only(status: u16) -> Self {
        Self {
            status,
            body: ErrorBody::default(),
        }
    }

    /// HTTP status code received from binance
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Value of the `code` field in the error body, 0 when the body was not decodable
    pub fn error_code(&self) -> i64 {
        self.body.code
    }

    pub fn message(&self) -> &str {
        &self.body.msg
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "got status {} from binance. error code was {}: {}",
            self.status, self.body.code, self.body.msg
        )
    }
}

impl std::error::Error for HttpFailure {}
