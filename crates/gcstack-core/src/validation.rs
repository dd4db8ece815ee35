//! Bucket and object name validation.
//!
//! Bucket names become top-level directories and object names become nested
//! paths below them, so both are checked before anything is written.

use crate::error::GcsServiceError;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Maximum object name length in bytes.
const MAX_OBJECT_NAME_BYTES: usize = 1024;

/// Validate a bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, digits, `-`, `_` and `.`
/// - Must start and end with a letter or digit
///
/// # Examples
///
/// ```
/// use gcstack_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my_bucket-1").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), GcsServiceError> {
    let invalid = |reason: &str| GcsServiceError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&name.len()) {
        return Err(invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
        )));
    }

    if !name.bytes().all(|b| {
        b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_' || b == b'.'
    }) {
        return Err(invalid(
            "Bucket name must only contain lowercase letters, digits, dashes, underscores and dots",
        ));
    }

    let alnum = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if !alnum(name.bytes().next()) || !alnum(name.bytes().last()) {
        return Err(invalid("Bucket name must start and end with a letter or digit"));
    }

    Ok(())
}

/// Validate an object name.
///
/// Object names may contain `/` and map onto nested directories, so every
/// segment must be non-empty and neither `.` nor `..`.
pub fn validate_object_name(name: &str) -> Result<(), GcsServiceError> {
    let invalid = |reason: &str| GcsServiceError::InvalidObjectName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    if name.is_empty() || name.len() > MAX_OBJECT_NAME_BYTES {
        return Err(invalid(&format!(
            "Object name must be between 1 and {MAX_OBJECT_NAME_BYTES} bytes long"
        )));
    }

    if name.bytes().any(|b| matches!(b, b'\0' | b'\r' | b'\n' | b'\\')) {
        return Err(invalid("Object name must not contain NUL, CR, LF or backslash"));
    }

    if name.starts_with('/') {
        return Err(invalid("Object name must not start with '/'"));
    }

    if name
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid("Object name must not contain empty, '.' or '..' segments"));
    }

    Ok(())
}
