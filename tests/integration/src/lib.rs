//! End-to-end tests for the gcstack storage emulator.
//!
//! Every test starts its own in-process [`Server`] on `127.0.0.1:0` and talks
//! to it over HTTP with `reqwest`, so the suite needs no external process:
//!
//! ```text
//! cargo test -p gcstack-integration
//! ```

use std::sync::Once;

use gcstack_core::GcsConfig;
use gcstack_http::Server;
use serde_json::{Value, json};

static INIT: Once = Once::new();

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "gcstack_boundary";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Configuration for an in-memory server on an ephemeral port.
#[must_use]
pub fn memory_config() -> GcsConfig {
    GcsConfig::builder()
        .gateway_listen("127.0.0.1:0".to_owned())
        .in_memory(true)
        .build()
}

/// Bind and start a server for `config`.
pub async fn start_server_with(config: GcsConfig) -> Server {
    init_tracing();
    let mut server = Server::bind(config).await.expect("bind server");
    server.start().expect("start server");
    tracing::debug!(base_url = server.base_url(), "test server started");
    server
}

/// Bind and start an in-memory server.
pub async fn start_server() -> Server {
    start_server_with(memory_config()).await
}

/// HTTP client that never goes through a proxy.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build http client")
}

/// URL of a metadata API path, e.g. `/b/bucket1`.
#[must_use]
pub fn api_url(server: &Server, path: &str) -> String {
    format!("{}/storage/v1{path}", server.base_url())
}

/// URL of an upload API path.
#[must_use]
pub fn upload_url(server: &Server, path: &str) -> String {
    format!("{}/upload/storage/v1{path}", server.base_url())
}

/// URL of a download API path.
#[must_use]
pub fn download_url(server: &Server, path: &str) -> String {
    format!("{}/download/storage/v1{path}", server.base_url())
}

/// Create a bucket through the API and return the response status and body.
pub async fn insert_bucket(
    client: &reqwest::Client,
    server: &Server,
    name: &str,
) -> (reqwest::StatusCode, Value) {
    let resp = client
        .post(api_url(server, "/b"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("insert bucket");
    let status = resp.status();
    (status, resp.json().await.expect("bucket json"))
}

/// A two-part `multipart/related` upload body.
#[must_use]
pub fn multipart_body(meta: &Value, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
         --{BOUNDARY}\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Upload `content` as `name` with a multipart request.
pub async fn upload_multipart(
    client: &reqwest::Client,
    server: &Server,
    bucket: &str,
    name: &str,
    content: &[u8],
) -> reqwest::Response {
    client
        .post(upload_url(server, &format!("/b/{bucket}/o?uploadType=multipart")))
        .header(
            "content-type",
            format!("multipart/related; boundary={BOUNDARY}"),
        )
        .body(multipart_body(&json!({ "name": name }), "text/plain", content))
        .send()
        .await
        .expect("multipart upload")
}

/// The `reason` of a GCS error document.
#[must_use]
pub fn error_reason(doc: &Value) -> &str {
    doc["error"]["errors"][0]["reason"].as_str().unwrap_or_default()
}

mod test_bucket;
mod test_object;
mod test_persistence;
mod test_resumable;
mod test_routing;
