//! Operations exposed by the emulated JSON API.

use std::fmt;

/// All supported storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcsOperation {
    /// `GET {api}/b`
    ListBuckets,
    /// `POST {api}/b`
    InsertBucket,
    /// `GET {api}/b/{bucket}`
    GetBucket,
    /// `DELETE {api}/b/{bucket}`
    DeleteBucket,
    /// `GET {api}/b/{bucket}/o`
    ListObjects,
    /// `POST {upload}/b/{bucket}/o`
    InsertObject,
    /// `PUT {upload}/b/{bucket}/o?upload_id=..`
    FinalizeResumableUpload,
    /// `GET {api}/b/{bucket}/o/{object}`
    GetObject,
    /// `GET {download}/b/{bucket}/o/{object}`
    DownloadObject,
    /// `DELETE {api}/b/{bucket}/o/{object}`
    DeleteObject,
}

impl GcsOperation {
    /// Returns the operation name as a static string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "ListBuckets",
            Self::InsertBucket => "InsertBucket",
            Self::GetBucket => "GetBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::ListObjects => "ListObjects",
            Self::InsertObject => "InsertObject",
            Self::FinalizeResumableUpload => "FinalizeResumableUpload",
            Self::GetObject => "GetObject",
            Self::DownloadObject => "DownloadObject",
            Self::DeleteObject => "DeleteObject",
        }
    }

    /// Whether the operation mutates storage state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::InsertBucket
                | Self::DeleteBucket
                | Self::InsertObject
                | Self::FinalizeResumableUpload
                | Self::DeleteObject
        )
    }
}

impl fmt::Display for GcsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
