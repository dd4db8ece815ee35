//! `multipart/related` parser for object uploads.
//!
//! A multipart upload carries exactly two parts: JSON object metadata first,
//! then the object content. This is a synchronous parser over the already
//! collected body bytes.

use bytes::Bytes;
use gcstack_model::GcsError;
use serde_json::Value;

/// Content type used for a content part that declares none.
pub const DEFAULT_PART_CONTENT_TYPE: &str = "application/octet-stream";

/// A decoded two-part upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartUpload {
    /// Parsed metadata part.
    pub meta: Value,
    /// Raw bytes of the content part.
    pub content: Bytes,
    /// Declared content type of the content part.
    pub content_type: String,
}

/// One part of a multipart body.
#[derive(Debug)]
struct Part<'a> {
    content_type: Option<String>,
    body: &'a [u8],
}

/// Extract the `boundary` parameter from a parsed `multipart/*` media type.
///
/// # Errors
///
/// Returns `badRequest` if the parameter is missing or empty.
pub fn extract_boundary(content_type: &mime::Mime) -> Result<String, GcsError> {
    let boundary = content_type
        .get_param(mime::BOUNDARY)
        .map(|b| b.as_str().trim_matches('"'))
        .unwrap_or_default();
    if boundary.is_empty() {
        return Err(GcsError::bad_request("Missing boundary in multipart Content-Type"));
    }
    Ok(boundary.to_owned())
}

/// Parse a two-part upload body.
///
/// # Errors
///
/// Returns `badRequest` when the body does not split into exactly two parts
/// or the first part is not JSON.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<MultipartUpload, GcsError> {
    let parts = split_multipart_parts(body, boundary)?;
    let [meta_part, content_part] = parts.as_slice() else {
        return Err(GcsError::bad_request(format!(
            "Multipart upload must have exactly 2 parts, got {}",
            parts.len()
        )));
    };

    let meta: Value = serde_json::from_slice(meta_part.body).map_err(|e| {
        GcsError::bad_request(format!("Invalid JSON in multipart metadata part: {e}"))
    })?;

    Ok(MultipartUpload {
        meta,
        content: Bytes::copy_from_slice(content_part.body),
        content_type: content_part
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_PART_CONTENT_TYPE.to_owned()),
    })
}

/// Split the body into parts at `--boundary` delimiters.
fn split_multipart_parts<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<Part<'a>>, GcsError> {
    let delimiter = format!("--{boundary}");
    let inner_delimiter = format!("\r\n--{boundary}");

    // Skip the preamble.
    let Some(start) = find_bytes(body, delimiter.as_bytes()) else {
        return Err(GcsError::bad_request("Multipart body has no opening boundary"));
    };
    let mut remaining = &body[start + delimiter.len()..];

    let mut parts = Vec::new();
    loop {
        if remaining.starts_with(b"--") {
            break;
        }
        remaining = skip_crlf(remaining);
        let Some(end) = find_bytes(remaining, inner_delimiter.as_bytes()) else {
            return Err(GcsError::bad_request("Multipart body is not terminated"));
        };
        parts.push(parse_part(&remaining[..end])?);
        remaining = &remaining[end + inner_delimiter.len()..];
    }

    Ok(parts)
}

/// Split a part into its headers and body.
fn parse_part(part: &[u8]) -> Result<Part<'_>, GcsError> {
    // A part without headers starts directly with the blank line.
    if let Some(body) = part.strip_prefix(b"\r\n") {
        return Ok(Part {
            content_type: None,
            body,
        });
    }

    let separator = b"\r\n\r\n";
    let Some(pos) = find_bytes(part, separator) else {
        return Err(GcsError::bad_request("Multipart part has no header terminator"));
    };

    Ok(Part {
        content_type: parse_part_content_type(&part[..pos]),
        body: &part[pos + separator.len()..],
    })
}

/// Extract the Content-Type from a part's headers section.
fn parse_part_content_type(headers: &[u8]) -> Option<String> {
    let headers = String::from_utf8_lossy(headers);
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-type")
            .then(|| value.trim().to_owned())
            .filter(|v| !v.is_empty())
    })
}

/// Find the position of a needle in a haystack.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Skip leading \r\n.
fn skip_crlf(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n").unwrap_or(data)
}
