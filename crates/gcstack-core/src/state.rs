//! Bucket and object records plus the persisted metadata snapshot.
//!
//! A [`MetadataSnapshot`] is owned by exactly one
//! [`Storage`](crate::storage::Storage) and is rewritten in full after every
//! mutation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksums::{compute_crc32c_base64, compute_md5_base64};

/// Storage class assigned when none is given.
pub const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

/// Content type assigned when none is given.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata for a single bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRecord {
    /// Bucket name (unique across the store).
    pub name: String,
    /// Creation time.
    pub time_created: DateTime<Utc>,
    /// Last metadata update time.
    pub updated: DateTime<Utc>,
    /// Default storage class.
    pub storage_class: String,
    /// Bucket location.
    pub location: String,
    /// Metadata generation, starting at 1.
    pub metageneration: u64,
}

impl BucketRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        storage_class: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            time_created: now,
            updated: now,
            storage_class: storage_class.into(),
            location: location.into(),
            metageneration: 1,
        }
    }
}

/// Metadata for a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Owning bucket.
    pub bucket: String,
    /// Object name (may contain `/`).
    pub name: String,
    /// Content type of the stored data.
    pub content_type: String,
    /// Storage class.
    pub storage_class: String,
    /// Content length in bytes.
    pub size: u64,
    /// Unix seconds at which this content was written, as a decimal string.
    pub generation: String,
    /// Metadata generation, starting at 1.
    pub metageneration: u64,
    /// Base64 MD5 of the content.
    pub md5_hash: String,
    /// Base64 big-endian CRC32C of the content.
    pub crc32c: String,
    /// Creation time.
    pub time_created: DateTime<Utc>,
    /// Last update time.
    pub updated: DateTime<Utc>,
}

impl ObjectRecord {
    /// A record for content that has not been written yet.
    ///
    /// Size and digests are placeholders until [`ObjectRecord::fill_content`].
    #[must_use]
    pub fn pending(
        bucket: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            bucket: bucket.into(),
            name: name.into(),
            content_type: content_type.into(),
            storage_class: DEFAULT_STORAGE_CLASS.to_owned(),
            size: 0,
            generation: now.timestamp().to_string(),
            metageneration: 1,
            md5_hash: String::new(),
            crc32c: String::new(),
            time_created: now,
            updated: now,
        }
    }

    /// Stamp size, digests, generation and timestamps from the written content.
    pub fn fill_content(&mut self, content: &[u8]) {
        let now = Utc::now();
        self.size = content.len() as u64;
        self.md5_hash = compute_md5_base64(content);
        self.crc32c = compute_crc32c_base64(content);
        self.generation = now.timestamp().to_string();
        self.metageneration = 1;
        self.time_created = now;
        self.updated = now;
    }
}

/// Everything persisted to the `.meta` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSnapshot {
    /// Bucket name to record.
    pub buckets: BTreeMap<String, BucketRecord>,
    /// Bucket name to (object name to record).
    pub objects: BTreeMap<String, BTreeMap<String, ObjectRecord>>,
    /// Resumable session id to pending object record.
    pub resumable: BTreeMap<String, ObjectRecord>,
}

impl MetadataSnapshot {
    /// Number of objects recorded in `bucket`.
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.objects.get(bucket).map_or(0, BTreeMap::len)
    }

    /// Look up one object record.
    #[must_use]
    pub fn object(&self, bucket: &str, name: &str) -> Option<&ObjectRecord> {
        self.objects.get(bucket).and_then(|objects| objects.get(name))
    }

    /// Drop all state.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.objects.clear();
        self.resumable.clear();
    }
}
