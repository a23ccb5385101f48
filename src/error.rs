//! Error types for SCM API operations.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Boxed error kept as the `source` of wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured payload carried by every classified API error.
///
/// Callers branch on `error_code`, `http_status` and `details` instead of
/// parsing `message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    /// Human-readable message.
    pub message: String,
    /// Stable error code (vendor code such as `E005`, or `E003` for
    /// client-side validation failures).
    pub error_code: String,
    /// HTTP status the failure originated from (or the status a
    /// client-side validation failure is equivalent to).
    pub http_status: u16,
    /// Machine-inspectable detail mapping.
    pub details: Map<String, Value>,
}

impl ErrorPayload {
    /// Create a payload without details.
    pub fn new(
        message: impl Into<String>,
        error_code: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            http_status,
            details: Map::new(),
        }
    }

    /// Payload for a client-side validation failure (`E003`, HTTP 400).
    pub fn client_side(message: impl Into<String>) -> Self {
        Self::new(message, "E003", 400)
    }

    /// Payload for a response the server sent that could not be understood
    /// (`E003`, HTTP 500).
    pub fn server_side(message: impl Into<String>) -> Self {
        Self::new(message, "E003", 500)
    }

    /// Add one detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Replace the detail mapping.
    #[must_use]
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    /// Look up a string detail.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }

    /// Whether the failure was caused by the server rather than the caller.
    pub fn is_server_side(&self) -> bool {
        self.http_status >= 500
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (code {}, HTTP {})",
            self.message, self.error_code, self.http_status
        )
    }
}

/// Errors that can occur during SCM API operations.
#[derive(Debug, Error)]
pub enum ScmError {
    /// Configuration is missing or incomplete.
    #[error("SCM configuration required: {0}")]
    ConfigMissing(String),

    /// Credentials or the access token were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(ErrorPayload),

    /// The authenticated identity may not perform the operation.
    #[error("Not authorized: {0}")]
    Authorization(ErrorPayload),

    /// Malformed configuration, bad container combination, invalid
    /// pagination bound or unparseable server response.
    #[error("Invalid object: {0}")]
    InvalidObject(ErrorPayload),

    /// A required query argument was blank.
    #[error("Missing query parameter: {0}")]
    MissingQueryParameter(ErrorPayload),

    /// Direct lookup found nothing.
    #[error("Object not found: {0}")]
    NotFound(ErrorPayload),

    /// Creation conflicts with an existing name.
    #[error("Name not unique: {0}")]
    NameNotUnique(ErrorPayload),

    /// Deletion blocked by objects that still reference the target.
    #[error("Reference not zero: {0}")]
    ReferenceNotZero(ErrorPayload),

    /// API failure that could not be classified further.
    #[error("SCM API error: {0}")]
    Api(ErrorPayload),

    /// No access token has been obtained yet.
    #[error("No access token available: {0}")]
    TokenUnavailable(String),

    /// Session setup or key retrieval failed outside the vendor error
    /// contract (network, encoding, unexpected body).
    #[error("{message}")]
    Session {
        message: String,
        #[source]
        source: BoxError,
    },

    /// Access token failed validation for a reason other than expiry.
    #[error("Access token validation failed: {0}")]
    TokenValidation(#[from] jsonwebtoken::errors::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl ScmError {
    /// Wrap a lower-level failure, keeping it as the source.
    pub fn session(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Session {
            message: message.into(),
            source: source.into(),
        }
    }

    /// The structured payload, for classified API errors.
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Authentication(p)
            | Self::Authorization(p)
            | Self::InvalidObject(p)
            | Self::MissingQueryParameter(p)
            | Self::NotFound(p)
            | Self::NameNotUnique(p)
            | Self::ReferenceNotZero(p)
            | Self::Api(p) => Some(p),
            _ => None,
        }
    }

    /// HTTP status of the failure, when known.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => self.payload().map(|p| p.http_status),
        }
    }

    /// Stable error code of the failure, when known.
    pub fn error_code(&self) -> Option<&str> {
        self.payload().map(|p| p.error_code.as_str())
    }

    /// Whether this is a not-found-class error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for SCM operations.
pub type Result<T> = core::result::Result<T, ScmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_server_side_flag() {
        assert!(!ErrorPayload::client_side("bad").is_server_side());
        assert!(ErrorPayload::server_side("bad").is_server_side());
    }

    #[test]
    fn test_error_exposes_payload() {
        let err = ScmError::NotFound(
            ErrorPayload::new("Object 'web' not found", "E005", 404).with_detail("name", "web"),
        );

        assert_eq!(err.http_status(), Some(404));
        assert_eq!(err.error_code(), Some("E005"));
        assert_eq!(err.payload().unwrap().detail_str("name"), Some("web"));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Object 'web' not found"));
    }

    #[test]
    fn test_session_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = ScmError::session("Failed to obtain access token", io);

        let source = std::error::Error::source(&err).expect("source should be kept");
        assert!(source.to_string().contains("connection reset"));
        assert!(err.payload().is_none());
    }
}
