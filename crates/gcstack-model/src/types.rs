//! JSON resource shapes returned by the emulated API.
//!
//! Numeric fields that the real service renders as strings (`size`,
//! `generation`, `metageneration`, `projectNumber`) are kept as strings here
//! so clients that parse them as int64-in-string keep working.

use serde::{Deserialize, Serialize};

/// `storage#bucket` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResource {
    /// Always `storage#bucket`.
    pub kind: String,
    /// Bucket id (same as the name).
    pub id: String,
    /// Link to the bucket resource.
    pub self_link: String,
    /// Owning project number.
    pub project_number: String,
    /// Bucket name.
    pub name: String,
    /// RFC 3339 creation time.
    pub time_created: String,
    /// RFC 3339 last update time.
    pub updated: String,
    /// Metadata generation.
    pub metageneration: String,
    /// Bucket location.
    pub location: String,
    /// Default storage class.
    pub storage_class: String,
    /// Entity tag.
    pub etag: String,
}

/// `storage#object` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectResource {
    /// Always `storage#object`.
    pub kind: String,
    /// `{bucket}/{name}/{generation}`.
    pub id: String,
    /// Link to the object resource.
    pub self_link: String,
    /// Link to the object content.
    pub media_link: String,
    /// Object name.
    pub name: String,
    /// Owning bucket.
    pub bucket: String,
    /// Content generation.
    pub generation: String,
    /// Metadata generation.
    pub metageneration: String,
    /// Content type of the stored data.
    pub content_type: String,
    /// Storage class.
    pub storage_class: String,
    /// Content length in bytes.
    pub size: String,
    /// Base64 MD5 digest.
    pub md5_hash: String,
    /// Base64 big-endian CRC32C.
    pub crc32c: String,
    /// Entity tag.
    pub etag: String,
    /// RFC 3339 creation time.
    pub time_created: String,
    /// RFC 3339 last update time.
    pub updated: String,
}

/// `storage#buckets` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketList {
    /// Always `storage#buckets`.
    pub kind: String,
    /// Buckets in name order.
    pub items: Vec<BucketResource>,
}

impl BucketList {
    /// Wrap a list of buckets.
    #[must_use]
    pub fn new(items: Vec<BucketResource>) -> Self {
        Self {
            kind: "storage#buckets".to_owned(),
            items,
        }
    }
}

/// `storage#objects` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectList {
    /// Always `storage#objects`.
    pub kind: String,
    /// Objects in name order.
    pub items: Vec<ObjectResource>,
}

impl ObjectList {
    /// Wrap a list of objects.
    #[must_use]
    pub fn new(items: Vec<ObjectResource>) -> Self {
        Self {
            kind: "storage#objects".to_owned(),
            items,
        }
    }
}
