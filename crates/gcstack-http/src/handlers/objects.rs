//! Object handlers: list, get, download, delete and the three upload types.

use gcstack_core::state::DEFAULT_CONTENT_TYPE;
use gcstack_model::{GcsError, ObjectList};
use http::StatusCode;
use http::header::LOCATION;
use serde_json::Value;

use super::{GcsState, required_query, str_field};
use crate::request::{RequestBody, RequestContext};
use crate::resource::object_resource;
use crate::response::ResponseContext;

/// Header carrying the content type of a resumable upload's eventual data.
const UPLOAD_CONTENT_TYPE: &str = "x-upload-content-type";

/// `GET {api}/b/{bucket}/o`, filtered by the `prefix` query parameter.
pub fn list_objects(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let bucket = req.param("bucket")?;
    let records = state.storage.list_files(bucket, req.query("prefix"))?;
    let items = records
        .iter()
        .map(|record| object_resource(record, req.base_url(), &state.config))
        .collect();
    resp.json(&ObjectList::new(items))
}

/// `GET {api}/b/{bucket}/o/{object}`: metadata, or content with `alt=media`.
pub fn get_object(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    if req.query("alt") == Some("media") {
        return download_object(req, resp, state);
    }
    let record = state
        .storage
        .get_file_obj(req.param("bucket")?, req.param("object")?)?;
    resp.json(&object_resource(&record, req.base_url(), &state.config))
}

/// `GET {download}/b/{bucket}/o/{object}`
pub fn download_object(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let bucket = req.param("bucket")?;
    let name = req.param("object")?;
    let (record, content) = state.storage.read_object(bucket, name)?;
    resp.bytes(content, record.content_type);
    Ok(())
}

/// `DELETE {api}/b/{bucket}/o/{object}`
pub fn delete_object(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let bucket = req.param("bucket")?;
    let name = req.param("object")?;
    state.storage.delete_file(bucket, name)?;
    resp.empty(StatusCode::NO_CONTENT);
    Ok(())
}

/// `POST {upload}/b/{bucket}/o?uploadType=..`
pub fn insert_object(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let upload_type = required_query(req, "uploadType")?.to_owned();
    match upload_type.as_str() {
        "media" => insert_media(req, resp, state),
        "multipart" => insert_multipart(req, resp, state),
        "resumable" => initiate_resumable(req, resp, state),
        other => Err(GcsError::invalid(format!("Invalid upload type: {other}"))),
    }
}

/// Single request upload: the body is the content, `name` is a query parameter.
fn insert_media(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let name = required_query(req, "name")?;
    let content_type = req
        .header(http::header::CONTENT_TYPE.as_str())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let record =
        state
            .storage
            .create_file(req.param("bucket")?, name, req.raw_body(), content_type)?;
    resp.json(&object_resource(&record, req.base_url(), &state.config))
}

/// Metadata part plus content part.
fn insert_multipart(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let upload = match req.body()? {
        RequestBody::Multipart(upload) => upload.clone(),
        _ => {
            return Err(GcsError::bad_request(
                "uploadType=multipart requires a multipart/related body",
            ));
        }
    };

    let meta = upload.meta.as_object();
    let name = str_field(meta, "name")
        .or_else(|| req.query("name").filter(|n| !n.is_empty()))
        .ok_or_else(|| GcsError::required("name"))?;
    let content_type = str_field(meta, "contentType").unwrap_or(upload.content_type.as_str());

    let record = state.storage.create_file(
        req.param("bucket")?,
        name,
        &upload.content,
        content_type,
    )?;
    resp.json(&object_resource(&record, req.base_url(), &state.config))
}

/// Open a resumable session and point the client at it via `Location`.
fn initiate_resumable(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let meta = match req.body()? {
        RequestBody::Json(Value::Object(map)) => Some(map.clone()),
        RequestBody::Absent => None,
        RequestBody::Raw(raw) if raw.is_empty() => None,
        _ => {
            return Err(GcsError::bad_request(
                "Resumable upload metadata must be a JSON object",
            ));
        }
    };

    let name = str_field(meta.as_ref(), "name")
        .or_else(|| req.query("name").filter(|n| !n.is_empty()))
        .ok_or_else(|| GcsError::required("name"))?;
    let content_type = str_field(meta.as_ref(), "contentType")
        .or_else(|| req.header(UPLOAD_CONTENT_TYPE).filter(|ct| !ct.is_empty()))
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let bucket = req.param("bucket")?;

    let upload_id = state
        .storage
        .create_resumable_upload(bucket, name, content_type)?;
    let location = format!(
        "{}{}/b/{bucket}/o?uploadType=resumable&upload_id={upload_id}",
        req.base_url(),
        state.config.upload_endpoint,
    );

    resp.insert_header(LOCATION, &location)?;
    resp.empty(StatusCode::OK);
    Ok(())
}

/// `PUT {upload}/b/{bucket}/o?upload_id=..`: supply the whole content.
pub fn finalize_resumable_upload(
    req: &mut RequestContext,
    resp: &mut ResponseContext,
    state: &GcsState,
) -> Result<(), GcsError> {
    let upload_id = required_query(req, "upload_id")?;

    if let Some(range) = req.header(http::header::CONTENT_RANGE.as_str()) {
        check_content_range(range, req.raw_body().len())?;
    }

    let record = state
        .storage
        .create_file_for_resumable_upload(upload_id, req.raw_body())?;
    resp.json(&object_resource(&record, req.base_url(), &state.config))
}

/// Accept only a `Content-Range` that covers the whole object in one request:
/// `bytes 0-{n-1}/{n}`, or `bytes */0` for empty content.
fn check_content_range(range: &str, body_len: usize) -> Result<(), GcsError> {
    let chunked = || {
        GcsError::not_implemented(format!(
            "Chunked resumable uploads are not supported (Content-Range: {range}); \
             send the whole content in one request"
        ))
    };

    let spec = range.trim().strip_prefix("bytes ").ok_or_else(chunked)?;
    let (span, total) = spec.split_once('/').ok_or_else(chunked)?;
    let total: u64 = total.trim().parse().map_err(|_| chunked())?;

    let covered = match span.trim() {
        "*" if total == 0 => 0,
        "*" => return Err(chunked()),
        span => {
            let (first, last) = span.split_once('-').ok_or_else(chunked)?;
            let first: u64 = first.trim().parse().map_err(|_| chunked())?;
            let last: u64 = last.trim().parse().map_err(|_| chunked())?;
            if first != 0 || last.checked_add(1) != Some(total) {
                return Err(chunked());
            }
            total
        }
    };

    if u64::try_from(body_len).ok() != Some(covered) {
        return Err(GcsError::bad_request(format!(
            "Content-Range {range} does not match a body of {body_len} bytes"
        )));
    }
    Ok(())
}
