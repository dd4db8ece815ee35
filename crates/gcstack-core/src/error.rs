//! Storage error types.
//!
//! [`GcsServiceError`] is what every [`Storage`](crate::storage::Storage)
//! operation returns. [`GcsServiceError::into_gcs_error`] turns it into the
//! wire-level [`GcsError`] with the right status and reason.
//!
//! ```
//! use gcstack_core::error::GcsServiceError;
//! use gcstack_model::GcsErrorCode;
//!
//! let err = GcsServiceError::NoSuchBucket {
//!     bucket: "photos".to_owned(),
//! };
//! assert_eq!(err.into_gcs_error().code, GcsErrorCode::NotFound);
//! ```

use gcstack_model::{GcsError, GcsErrorCode};

use crate::filesystem::FsError;

/// Storage service error type.
#[derive(Debug, thiserror::Error)]
pub enum GcsServiceError {
    // -----------------------------------------------------------------------
    // Bucket errors
    // -----------------------------------------------------------------------
    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// A bucket with this name already exists.
    #[error("You already own this bucket. Please select another name: {bucket}")]
    BucketAlreadyExists {
        /// The bucket name that already exists.
        bucket: String,
    },

    /// The bucket still holds objects.
    #[error("The bucket you tried to delete is not empty: {bucket}")]
    BucketNotEmpty {
        /// The bucket name that is not empty.
        bucket: String,
    },

    // -----------------------------------------------------------------------
    // Object errors
    // -----------------------------------------------------------------------
    /// The specified object does not exist.
    #[error("No such object: {bucket}/{object}")]
    NoSuchObject {
        /// Bucket the object was looked up in.
        bucket: String,
        /// The object name that was not found.
        object: String,
    },

    /// The object name collides with an existing object or folder path.
    #[error("Object path conflicts with an existing object: {bucket}/{object}")]
    ObjectPathConflict {
        /// Bucket the object was written to.
        bucket: String,
        /// The conflicting object name.
        object: String,
    },

    // -----------------------------------------------------------------------
    // Resumable upload errors
    // -----------------------------------------------------------------------
    /// The resumable upload session does not exist or was already finalized.
    #[error("No such upload session: {upload_id}")]
    NoSuchUpload {
        /// The session id that was not found.
        upload_id: String,
    },

    // -----------------------------------------------------------------------
    // Validation errors
    // -----------------------------------------------------------------------
    /// The bucket name is not valid.
    #[error("Invalid bucket name: '{name}': {reason}")]
    InvalidBucketName {
        /// The invalid bucket name.
        name: String,
        /// The reason for the error.
        reason: String,
    },

    /// The object name is not valid.
    #[error("Invalid object name: '{name}': {reason}")]
    InvalidObjectName {
        /// The invalid object name.
        name: String,
        /// The reason for the error.
        reason: String,
    },

    // -----------------------------------------------------------------------
    // Internal / catch-all
    // -----------------------------------------------------------------------
    /// The filesystem adapter failed.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),

    /// The metadata snapshot could not be encoded or decoded.
    #[error("metadata snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl GcsServiceError {
    /// Convert this error into a wire-level [`GcsError`].
    #[must_use]
    pub fn into_gcs_error(self) -> GcsError {
        GcsError::from(self)
    }
}

impl From<GcsServiceError> for GcsError {
    fn from(err: GcsServiceError) -> Self {
        let message = err.to_string();
        GcsError::with_message(error_code(&err), message)
    }
}

/// Map a [`GcsServiceError`] variant to the corresponding [`GcsErrorCode`].
fn error_code(err: &GcsServiceError) -> GcsErrorCode {
    match err {
        GcsServiceError::NoSuchBucket { .. }
        | GcsServiceError::NoSuchObject { .. }
        | GcsServiceError::NoSuchUpload { .. } => GcsErrorCode::NotFound,
        GcsServiceError::BucketAlreadyExists { .. }
        | GcsServiceError::BucketNotEmpty { .. }
        | GcsServiceError::ObjectPathConflict { .. } => GcsErrorCode::Conflict,
        GcsServiceError::InvalidBucketName { .. } | GcsServiceError::InvalidObjectName { .. } => {
            GcsErrorCode::Invalid
        }
        GcsServiceError::Filesystem(FsError::NotFound(_)) => GcsErrorCode::NotFound,
        GcsServiceError::Filesystem(FsError::InvalidPath(_)) => GcsErrorCode::Invalid,
        GcsServiceError::Filesystem(FsError::NotADirectory(_) | FsError::IsADirectory(_)) => {
            GcsErrorCode::Conflict
        }
        GcsServiceError::Filesystem(FsError::Io(_)) | GcsServiceError::Snapshot(_) => {
            GcsErrorCode::InternalError
        }
    }
}

/// Convenience result type for storage operations.
pub type GcsServiceResult<T> = Result<T, GcsServiceError>;
