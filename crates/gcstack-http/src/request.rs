//! Per-request view handed to handlers.
//!
//! [`RequestContext`] exposes the decoded path, the server base URL, multi-valued
//! query parameters, path parameters bound by the router, and the request body.
//! The body is decoded on first access according to its `Content-Type` and the
//! result (including a decode failure) is cached for later accesses.

use std::collections::HashMap;

use bytes::Bytes;
use gcstack_model::GcsError;
use http::{HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::multipart::{MultipartUpload, extract_boundary, parse_multipart};

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No `Content-Type` and no `Content-Length` header, or an empty JSON body.
    Absent,
    /// `application/json` (or any `+json` type).
    Json(Value),
    /// `multipart/*` two-part upload.
    Multipart(MultipartUpload),
    /// Anything else, undecoded.
    Raw(Bytes),
}

/// Request state visible to a handler.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    raw_query: Option<String>,
    base_url: String,
    headers: HeaderMap,
    query: HashMap<String, Vec<String>>,
    params: HashMap<String, String>,
    raw_body: Bytes,
    decoded: Option<Result<RequestBody, GcsError>>,
}

impl RequestContext {
    /// Build a context from the request head and collected body.
    #[must_use]
    pub fn new(
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: Bytes,
        base_url: impl Into<String>,
    ) -> Self {
        let raw_query = uri.query().map(str::to_owned);
        Self {
            method,
            path: decode_uri_component(uri.path()),
            query: parse_query_params(raw_query.as_deref().unwrap_or("")),
            raw_query,
            base_url: base_url.into(),
            headers,
            params: HashMap::new(),
            raw_body: body,
            decoded: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Percent-decoded request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Scheme, host and port the server is bound to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL as received, used in logs.
    #[must_use]
    pub fn url(&self) -> String {
        match &self.raw_query {
            Some(q) => format!("{}{}?{q}", self.base_url, self.path),
            None => format!("{}{}", self.base_url, self.path),
        }
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a query parameter, in request order.
    #[must_use]
    pub fn query_all(&self, key: &str) -> &[String] {
        self.query
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A path parameter bound by the router.
    ///
    /// # Errors
    ///
    /// Returns `backendError` if the matched route declares no such segment.
    pub fn param(&self, name: &str) -> Result<&str, GcsError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| GcsError::internal_error(format!("route has no '{name}' parameter")))
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// The body bytes exactly as received.
    #[must_use]
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// The decoded body, decoding it on first access.
    ///
    /// # Errors
    ///
    /// Returns `badRequest` if the body does not match its declared content
    /// type. The same error is returned on every later call.
    pub fn body(&mut self) -> Result<&RequestBody, GcsError> {
        let decoded = self
            .decoded
            .get_or_insert_with(|| decode_body(&self.headers, &self.raw_body));
        decoded.as_ref().map_err(GcsError::clone)
    }

    /// The decoded body if it is a JSON object, `None` if the body is absent.
    ///
    /// # Errors
    ///
    /// Returns `badRequest` if the body is present but not a JSON object.
    pub fn json_object(&mut self) -> Result<Option<&serde_json::Map<String, Value>>, GcsError> {
        match self.body()? {
            RequestBody::Absent => Ok(None),
            RequestBody::Json(Value::Object(map)) => Ok(Some(map)),
            _ => Err(GcsError::bad_request("Expected a JSON object body")),
        }
    }
}

/// Decode a body according to the request headers.
fn decode_body(headers: &HeaderMap, raw: &Bytes) -> Result<RequestBody, GcsError> {
    let content_type = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let Some(content_type) = content_type else {
        if !headers.contains_key(http::header::CONTENT_LENGTH) && raw.is_empty() {
            return Ok(RequestBody::Absent);
        }
        return Ok(RequestBody::Raw(raw.clone()));
    };

    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return Ok(RequestBody::Raw(raw.clone()));
    };

    if mime.type_() == mime::MULTIPART {
        let boundary = extract_boundary(&mime)?;
        return parse_multipart(raw, &boundary).map(RequestBody::Multipart);
    }

    let is_json = mime.type_() == mime::APPLICATION
        && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON));
    if is_json {
        if raw.is_empty() {
            return Ok(RequestBody::Absent);
        }
        return serde_json::from_slice(raw)
            .map(RequestBody::Json)
            .map_err(|e| GcsError::bad_request(format!("Invalid JSON body: {e}")));
    }

    Ok(RequestBody::Raw(raw.clone()))
}

/// Percent-decode a URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into a multi-valued map. `+` decodes to a space.
fn parse_query_params(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_query_component(key))
            .or_default()
            .push(decode_query_component(value));
    }
    params
}

fn decode_query_component(s: &str) -> String {
    decode_uri_component(&s.replace('+', " "))
}
