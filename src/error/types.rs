//! Error type definitions
//!
//! Defines the main error types used throughout the lottery client.

use thiserror::Error;

/// Main error type for the lottery client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A request failed at the network level (connect, timeout, HTTP status)
    #[error("Request to {url} failed: {source}")]
    Request {
        /// The URL that failed
        url: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Login rejected by the site (bad credentials)
    #[error("Login rejected: {0}")]
    PermissionDenied(String),

    /// RSA modulus or exponent missing from the key endpoint payload
    #[error("RSA key material missing from response: {payload}")]
    MissingKeyMaterial {
        /// Excerpt of the decoded payload for diagnostics
        payload: String,
    },

    /// No session cookie could be extracted after an otherwise successful login
    #[error(
        "Session cookie missing after login (status={status}, set_cookie={set_cookie:?}): {body_excerpt}"
    )]
    SessionCookieMissing {
        /// HTTP status of the login response
        status: u16,
        /// Raw Set-Cookie header value, if any
        set_cookie: Option<String>,
        /// Leading bytes of the response body
        body_excerpt: String,
    },

    /// The site returned an HTML page where JSON was expected
    #[error("Malformed response (status={status}, content_type={content_type}): {body_excerpt}")]
    MalformedResponse {
        /// HTTP status of the response
        status: u16,
        /// Content-Type header value
        content_type: String,
        /// Leading bytes of the response body
        body_excerpt: String,
    },

    /// Caller-supplied purchase parameters violate count/range constraints
    #[error("Validation error: {0}")]
    Validation(String),

    /// RSA encryption errors
    #[error("Credential encryption failed: {0}")]
    Crypto(#[from] rsa::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Date/time parsing errors
    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a request error from a URL and its underlying cause
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source,
        }
    }

    /// Create a permission-denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a missing-key-material error
    pub fn missing_key_material(payload: impl Into<String>) -> Self {
        Self::MissingKeyMaterial {
            payload: payload.into(),
        }
    }

    /// Create a malformed-response error from response metadata and a body excerpt
    pub fn malformed_response(
        status: u16,
        content_type: impl Into<String>,
        body_excerpt: impl Into<String>,
    ) -> Self {
        Self::MalformedResponse {
            status,
            content_type: content_type.into(),
            body_excerpt: body_excerpt.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error represents a malformed (HTML-shaped) server response
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test config error");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: test config error");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_permission_denied_error() {
        let err = Error::permission_denied("invalid user id or password");
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(err.to_string().contains("Login rejected"));
    }

    #[test]
    fn test_missing_key_material_error() {
        let err = Error::missing_key_material(r#"{"data":{}}"#);
        assert!(matches!(err, Error::MissingKeyMaterial { .. }));
        assert!(err.to_string().contains("RSA key material missing"));
    }

    #[test]
    fn test_malformed_response_error() {
        let err = Error::malformed_response(200, "text/html", "<html><head>");
        assert!(err.is_malformed_response());
        assert!(err.to_string().contains("content_type=text/html"));
        assert!(err.to_string().contains("<html><head>"));
    }

    #[test]
    fn test_session_cookie_missing_display() {
        let err = Error::SessionCookieMissing {
            status: 302,
            set_cookie: None,
            body_excerpt: String::new(),
        };
        assert!(err.to_string().contains("status=302"));
    }

    #[test]
    fn test_validation_error() {
        let err = Error::validation("expected 6 numbers");
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("expected 6 numbers"));
    }

    #[test]
    fn test_date_parse_error() {
        let date_err = chrono::DateTime::parse_from_rfc3339("invalid date");
        assert!(date_err.is_err());

        let err: Error = date_err.unwrap_err().into();
        assert!(matches!(err, Error::DateParse(_)));
    }
}
