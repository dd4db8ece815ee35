//! Request handlers for the JSON API, upload and download surfaces.
//!
//! Handlers are plain functions over [`GcsState`]. They run on a blocking
//! thread because [`Storage`] does synchronous file I/O.

pub mod buckets;
pub mod objects;

use std::sync::Arc;

use gcstack_core::{GcsConfig, Storage};
use gcstack_model::{GcsError, GcsOperation};
use http::Method;
use serde_json::{Map, Value};

use crate::router::Router;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct GcsState {
    /// The one storage instance of this server.
    pub storage: Arc<Storage>,
    /// Endpoint prefixes and resource defaults.
    pub config: GcsConfig,
}

impl GcsState {
    /// Bundle a storage instance with its configuration.
    #[must_use]
    pub fn new(storage: Arc<Storage>, config: GcsConfig) -> Self {
        Self { storage, config }
    }
}

/// Build the route table for the configured endpoint prefixes.
///
/// Routes are declared most specific first; see [`Router`] for the
/// matching rules.
///
/// # Errors
///
/// Returns the regex error if a configured prefix yields an invalid pattern.
pub fn build_router(config: &GcsConfig) -> Result<Router<GcsState>, regex::Error> {
    let api = &config.api_endpoint;
    let upload = &config.upload_endpoint;
    let download = &config.download_endpoint;

    let mut router = Router::new();

    let buckets = format!("{api}/b");
    router.add(&buckets, Method::GET, GcsOperation::ListBuckets, buckets::list_buckets)?;
    router.add(&buckets, Method::POST, GcsOperation::InsertBucket, buckets::insert_bucket)?;

    let bucket = format!("{api}/b/{{bucket}}");
    router.add(&bucket, Method::GET, GcsOperation::GetBucket, buckets::get_bucket)?;
    router.add(&bucket, Method::DELETE, GcsOperation::DeleteBucket, buckets::delete_bucket)?;

    let objects = format!("{api}/b/{{bucket}}/o");
    router.add(&objects, Method::GET, GcsOperation::ListObjects, objects::list_objects)?;

    let object = format!("{api}/b/{{bucket}}/o/{{object*}}");
    router.add(&object, Method::GET, GcsOperation::GetObject, objects::get_object)?;
    router.add(&object, Method::DELETE, GcsOperation::DeleteObject, objects::delete_object)?;

    let uploads = format!("{upload}/b/{{bucket}}/o");
    router.add(&uploads, Method::POST, GcsOperation::InsertObject, objects::insert_object)?;
    router.add(
        &uploads,
        Method::PUT,
        GcsOperation::FinalizeResumableUpload,
        objects::finalize_resumable_upload,
    )?;

    let download_object = format!("{download}/b/{{bucket}}/o/{{object*}}");
    router.add(
        &download_object,
        Method::GET,
        GcsOperation::DownloadObject,
        objects::download_object,
    )?;

    Ok(router)
}

/// A non-empty string field of a JSON object.
fn str_field<'a>(map: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    map?.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// A required, non-empty query parameter.
fn required_query<'a>(
    req: &'a crate::request::RequestContext,
    key: &str,
) -> Result<&'a str, GcsError> {
    req.query(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GcsError::required(key))
}
