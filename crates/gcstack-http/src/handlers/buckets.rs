//! Bucket handlers: list, insert, get, delete.

use gcstack_core::error::GcsServiceError;
use gcstack_core::state::{BucketRecord, DEFAULT_STORAGE_CLASS};
use gcstack_model::{BucketList, GcsError};
use http::StatusCode;

use super::{GcsState, str_field};
use crate::request::RequestContext;
use crate::resource::bucket_resource;
use crate::response::ResponseContext;

/// `GET {api}/b`
pub fn list_buckets(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let items = state
        .storage
        .list_buckets()
        .iter()
        .map(|record| bucket_resource(record, req.base_url(), &state.config))
        .collect();
    resp.json(&BucketList::new(items))
}

/// `POST {api}/b` with `{"name": ..}`.
///
/// `location` and `storageClass` default to the configured location and
/// `STANDARD`.
pub fn insert_bucket(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let body = req.json_object()?;
    let name = str_field(body, "name")
        .ok_or_else(|| GcsError::required("name"))?
        .to_owned();
    let location = str_field(body, "location")
        .unwrap_or(state.config.default_location.as_str())
        .to_owned();
    let storage_class = str_field(body, "storageClass")
        .unwrap_or(DEFAULT_STORAGE_CLASS)
        .to_owned();

    let record = state
        .storage
        .create_bucket(BucketRecord::new(name, location, storage_class))?;
    resp.json(&bucket_resource(&record, req.base_url(), &state.config))
}

/// `GET {api}/b/{bucket}`
pub fn get_bucket(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let name = req.param("bucket")?;
    let record = state
        .storage
        .get_bucket(name)
        .ok_or_else(|| GcsServiceError::NoSuchBucket {
            bucket: name.to_owned(),
        })?;
    resp.json(&bucket_resource(&record, req.base_url(), &state.config))
}

/// `DELETE {api}/b/{bucket}`
pub fn delete_bucket(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let name = req.param("bucket")?;
    state.storage.delete_bucket(name)?;
    resp.empty(StatusCode::NO_CONTENT);
    Ok(())
}
