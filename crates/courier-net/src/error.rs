//! Transport errors reported by the HTTP client.

use courier_core::{ErrorDomain, NormalizedError, codes};

/// Failures below the API layer: connectivity, status codes, decoding.
///
/// These never reach application code directly; the API manager passes them
/// through the error normalizer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),
    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
    /// The body is valid JSON but not a mapping or a sequence.
    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
    /// Request was cancelled.
    #[error("Request was cancelled")]
    Cancelled,
    /// HTTP error status (4xx or 5xx).
    #[error("HTTP {status}{}", .reason.as_deref().map(|r| format!(" {r}")).unwrap_or_default())]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase, if the status has one.
        reason: Option<String>,
    },
}

impl NetworkError {
    /// Build an HTTP status error with its canonical reason phrase.
    pub fn http_status(status: u16) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_string);
        Self::HttpStatus { status, reason }
    }

    /// The code used when the server declares no error of its own.
    ///
    /// HTTP status errors use the status; everything else maps to one of
    /// the negative codes in [`courier_core::codes`].
    pub fn code(&self) -> i64 {
        match self {
            Self::HttpStatus { status, .. } => i64::from(*status),
            Self::Timeout => codes::TIMEOUT,
            Self::Connection(_) => codes::CONNECTION,
            Self::Json(_) | Self::UnexpectedBody(_) => codes::DECODE,
            Self::Cancelled => codes::CANCELLED,
            Self::Io(_) => codes::IO,
            Self::Request(_) | Self::InvalidUrl(_) | Self::InvalidHeader(_) => codes::UNKNOWN,
        }
    }

    /// The fallback normalized error for this failure in `domain`.
    pub fn fallback(&self, domain: &ErrorDomain) -> NormalizedError {
        let message = match self {
            Self::HttpStatus {
                reason: Some(reason),
                ..
            } => reason.clone(),
            other => other.to_string(),
        };
        NormalizedError::new(domain.clone(), self.code(), message)
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else if let Some(status) = err.status() {
            Self::http_status(status.as_u16())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<courier_core::RawShapeError> for NetworkError {
    fn from(err: courier_core::RawShapeError) -> Self {
        Self::UnexpectedBody(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for transport operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// The result of an API manager operation.
pub type ApiResult<T> = std::result::Result<T, NormalizedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_reason() {
        assert_eq!(NetworkError::http_status(404).to_string(), "HTTP 404 Not Found");
        assert_eq!(
            NetworkError::HttpStatus {
                status: 599,
                reason: None
            }
            .to_string(),
            "HTTP 599"
        );
    }

    #[test]
    fn codes_for_transport_failures() {
        assert_eq!(NetworkError::http_status(503).code(), 503);
        assert_eq!(NetworkError::Timeout.code(), codes::TIMEOUT);
        assert_eq!(NetworkError::Connection("refused".into()).code(), codes::CONNECTION);
        assert_eq!(NetworkError::Json("eof".into()).code(), codes::DECODE);
    }

    #[test]
    fn fallback_uses_reason_phrase() {
        let domain = ErrorDomain::new("com.example");
        let fallback = NetworkError::http_status(500).fallback(&domain);
        assert_eq!(fallback.code(), 500);
        assert_eq!(fallback.message(), "Internal Server Error");
        assert_eq!(fallback.domain(), &domain);

        let fallback = NetworkError::Timeout.fallback(&domain);
        assert_eq!(fallback.message(), "Request timed out");
    }
}
