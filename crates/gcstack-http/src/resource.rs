//! Shape storage records into JSON API resources.

use chrono::{DateTime, SecondsFormat, Utc};
use gcstack_core::GcsConfig;
use gcstack_core::checksums::{compute_etag, compute_md5_base64};
use gcstack_core::state::{BucketRecord, ObjectRecord};
use gcstack_model::{BucketResource, ObjectResource};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped when an object name is embedded in a URL path segment.
const OBJECT_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Percent-encode an object name as a single path segment.
#[must_use]
pub fn encode_object_name(name: &str) -> String {
    utf8_percent_encode(name, OBJECT_NAME).to_string()
}

/// Build the `storage#bucket` resource for `record`.
#[must_use]
pub fn bucket_resource(record: &BucketRecord, base_url: &str, config: &GcsConfig) -> BucketResource {
    BucketResource {
        kind: "storage#bucket".to_owned(),
        id: record.name.clone(),
        self_link: format!("{base_url}{}/b/{}", config.api_endpoint, record.name),
        project_number: config.project_number.clone(),
        name: record.name.clone(),
        time_created: timestamp(&record.time_created),
        updated: timestamp(&record.updated),
        metageneration: record.metageneration.to_string(),
        location: record.location.clone(),
        storage_class: record.storage_class.clone(),
        etag: compute_etag(
            &compute_md5_base64(record.name.as_bytes()),
            record.metageneration,
        ),
    }
}

/// Build the `storage#object` resource for `record`.
#[must_use]
pub fn object_resource(record: &ObjectRecord, base_url: &str, config: &GcsConfig) -> ObjectResource {
    let encoded = encode_object_name(&record.name);
    ObjectResource {
        kind: "storage#object".to_owned(),
        id: format!("{}/{}/{}", record.bucket, record.name, record.generation),
        self_link: format!(
            "{base_url}{}/b/{}/o/{encoded}",
            config.api_endpoint, record.bucket
        ),
        media_link: format!(
            "{base_url}{}/b/{}/o/{encoded}?generation={}&alt=media",
            config.download_endpoint, record.bucket, record.generation
        ),
        name: record.name.clone(),
        bucket: record.bucket.clone(),
        generation: record.generation.clone(),
        metageneration: record.metageneration.to_string(),
        content_type: record.content_type.clone(),
        storage_class: record.storage_class.clone(),
        size: record.size.to_string(),
        md5_hash: record.md5_hash.clone(),
        crc32c: record.crc32c.clone(),
        etag: compute_etag(&record.md5_hash, record.metageneration),
        time_created: timestamp(&record.time_created),
        updated: timestamp(&record.updated),
    }
}
