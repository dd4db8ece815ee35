//! Response under construction.
//!
//! Handlers set a status, headers and exactly one payload on a
//! [`ResponseContext`]. The service calls [`ResponseContext::finalize`] once
//! per request, on every code path, to produce the hyper response with a
//! `Content-Length` matching the encoded body.

use bytes::Bytes;
use gcstack_model::GcsError;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::body::GcsResponseBody;

/// Content type of JSON documents.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// The single payload a response carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// A JSON document, serialized on finalize.
    Json(Value),
    /// Raw bytes with an explicit content type.
    Bytes {
        /// Body bytes.
        data: Bytes,
        /// Value for the `Content-Type` header.
        content_type: String,
    },
}

/// Response state mutated by handlers.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    status: StatusCode,
    headers: HeaderMap,
    payload: Payload,
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseContext {
    /// A `200 OK` response with no body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            payload: Payload::Empty,
        }
    }

    /// The response for a failed request.
    #[must_use]
    pub fn from_error(err: &GcsError) -> Self {
        let mut resp = Self::new();
        resp.status = err.status_code;
        resp.payload = Payload::Json(err.to_json());
        resp
    }

    /// Current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Current payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Current headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Insert a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `backendError` if the value is not a legal header value.
    pub fn insert_header(&mut self, name: HeaderName, value: &str) -> Result<(), GcsError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| GcsError::internal_error(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Set a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns `backendError` if the value cannot be serialized.
    pub fn json(&mut self, value: &impl Serialize) -> Result<(), GcsError> {
        let value = serde_json::to_value(value)
            .map_err(|e| GcsError::internal_error(format!("failed to serialize response: {e}")))?;
        self.payload = Payload::Json(value);
        Ok(())
    }

    /// Set a raw byte payload.
    pub fn bytes(&mut self, data: Bytes, content_type: impl Into<String>) {
        self.payload = Payload::Bytes {
            data,
            content_type: content_type.into(),
        };
    }

    /// Clear the payload and set the status, as for `204 No Content`.
    pub fn empty(&mut self, status: StatusCode) {
        self.status = status;
        self.payload = Payload::Empty;
    }

    /// Produce the wire response.
    #[must_use]
    pub fn finalize(self) -> http::Response<GcsResponseBody> {
        let Self {
            status,
            mut headers,
            payload,
        } = self;

        let (body, content_type) = match payload {
            Payload::Empty => (Bytes::new(), None),
            Payload::Json(value) => (
                Bytes::from(value.to_string()),
                Some(HeaderValue::from_static(JSON_CONTENT_TYPE)),
            ),
            Payload::Bytes { data, content_type } => {
                let header = HeaderValue::from_str(&content_type).unwrap_or_else(|_| {
                    HeaderValue::from_static(gcstack_core::state::DEFAULT_CONTENT_TYPE)
                });
                (data, Some(header))
            }
        };

        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        let body = if body.is_empty() {
            GcsResponseBody::empty()
        } else {
            GcsResponseBody::from_bytes(body)
        };

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
