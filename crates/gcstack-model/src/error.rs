//! GCS JSON API error taxonomy.
//!
//! Every failure surfaced over HTTP is a [`GcsError`]. It carries the status
//! code and the `reason` string that the JSON API places in
//! `error.errors[].reason`, and renders itself as the standard error document.

use std::fmt;

use serde_json::{Value, json};

/// Well-known GCS error reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum GcsErrorCode {
    /// The bucket, object or upload session does not exist.
    NotFound,
    /// The resource already exists or is in a conflicting state.
    Conflict,
    /// A required field or parameter is missing.
    Required,
    /// A field or parameter carries an unsupported value.
    Invalid,
    /// The request body could not be decoded.
    BadRequest,
    /// No route accepts the request.
    NotImplemented,
    /// Unexpected server-side failure.
    #[default]
    InternalError,
}

impl GcsErrorCode {
    /// The `reason` string used in the JSON error document.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "notFound",
            Self::Conflict => "conflict",
            Self::Required => "required",
            Self::Invalid => "invalid",
            Self::BadRequest => "badRequest",
            Self::NotImplemented => "notImplemented",
            Self::InternalError => "backendError",
        }
    }

    /// The HTTP status code normally returned with this reason.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::Conflict => http::StatusCode::CONFLICT,
            Self::Required | Self::Invalid | Self::BadRequest => http::StatusCode::BAD_REQUEST,
            Self::NotImplemented => http::StatusCode::NOT_IMPLEMENTED,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for GcsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned to a client of the emulated JSON API.
///
/// `Clone` so that a request body decode failure can be cached and returned
/// again on later accesses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsError {
    /// The reason code.
    pub code: GcsErrorCode,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status_code: http::StatusCode,
}

impl fmt::Display for GcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcsError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for GcsError {}

impl GcsError {
    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: GcsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: code.default_status_code(),
        }
    }

    /// Create a `notFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(GcsErrorCode::NotFound, message)
    }

    /// Create a `required` error for a missing field or parameter.
    #[must_use]
    pub fn required(field: &str) -> Self {
        Self::with_message(GcsErrorCode::Required, format!("Required: {field}"))
    }

    /// Create an `invalid` error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::with_message(GcsErrorCode::Invalid, message)
    }

    /// Create a `badRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_message(GcsErrorCode::BadRequest, message)
    }

    /// Create a `notImplemented` error.
    #[must_use]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::with_message(GcsErrorCode::NotImplemented, message)
    }

    /// Create a `backendError` error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(GcsErrorCode::InternalError, message)
    }

    /// Render the JSON API error document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "errors": [{
                    "domain": "global",
                    "reason": self.code.as_str(),
                    "message": self.message,
                }],
                "code": self.status_code.as_u16(),
                "message": self.message,
            }
        })
    }
}
