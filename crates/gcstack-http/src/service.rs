//! The hyper `Service` of the emulator.
//!
//! [`GcsHttpService`] runs every request through the same pipeline:
//!
//! 1. Health check interception (`GET /_health`, `GET /health`)
//! 2. Request body collection
//! 3. Routing and handler dispatch on a blocking thread
//! 4. Error responses for routing, decode and handler failures
//! 5. Exactly one [`ResponseContext::finalize`] per request
//! 6. Common response headers (`x-request-id`, `Server`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use gcstack_model::GcsError;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::body::GcsResponseBody;
use crate::handlers::GcsState;
use crate::request::RequestContext;
use crate::response::ResponseContext;
use crate::router::Router;

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "gcstack";

/// The emulator's hyper service. Cheap to clone; one clone per connection.
#[derive(Debug)]
pub struct GcsHttpService {
    router: Arc<Router<GcsState>>,
    state: Arc<GcsState>,
    base_url: Arc<str>,
}

impl Clone for GcsHttpService {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            state: Arc::clone(&self.state),
            base_url: Arc::clone(&self.base_url),
        }
    }
}

impl GcsHttpService {
    /// Create a service over `state`, building links against `base_url`.
    #[must_use]
    pub fn new(router: Router<GcsState>, state: GcsState, base_url: impl Into<String>) -> Self {
        Self {
            router: Arc::new(router),
            state: Arc::new(state),
            base_url: Arc::from(base_url.into()),
        }
    }

    /// Run one request through routing and dispatch.
    ///
    /// Decoupled from hyper's `Incoming` so that it can be driven with an
    /// already collected body.
    pub async fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
    ) -> http::Response<GcsResponseBody> {
        let request_id = Uuid::new_v4().to_string();
        debug!(method = %parts.method, uri = %parts.uri, request_id = %request_id, "processing request");

        let response = if is_health_check(&parts.method, parts.uri.path()) {
            health_check_response()
        } else {
            let req = RequestContext::new(
                parts.method,
                &parts.uri,
                parts.headers,
                body,
                &*self.base_url,
            );
            self.dispatch(req, &request_id).await.finalize()
        };

        add_common_headers(response, &request_id)
    }

    async fn dispatch(&self, mut req: RequestContext, request_id: &str) -> ResponseContext {
        let router = Arc::clone(&self.router);
        let state = Arc::clone(&self.state);

        let outcome = tokio::task::spawn_blocking(move || {
            let mut resp = ResponseContext::new();
            router
                .dispatch(&mut req, &mut resp, &state)
                .map(|operation| (operation, resp))
        })
        .await;

        match outcome {
            Ok(Ok((operation, resp))) => {
                info!(%operation, status = resp.status().as_u16(), request_id, "request handled");
                resp
            }
            Ok(Err(err)) => {
                debug!(error = %err, request_id, "request returned error");
                ResponseContext::from_error(&err)
            }
            Err(join_err) => {
                error!(error = %join_err, request_id, "request handler panicked");
                ResponseContext::from_error(&GcsError::internal_error("Internal server error"))
            }
        }
    }
}

impl Service<http::Request<Incoming>> for GcsHttpService {
    type Response = http::Response<GcsResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let body = match incoming.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    error!(error = %err, "failed to collect request body");
                    let err = GcsError::internal_error("Failed to read request body");
                    let response = ResponseContext::from_error(&err).finalize();
                    return Ok(add_common_headers(response, &Uuid::new_v4().to_string()));
                }
            };
            Ok(service.handle(parts, body).await)
        })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/_health" || path == "/health")
}

/// Produce a health check response.
fn health_check_response() -> http::Response<GcsResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(GcsResponseBody::from_string(
            r#"{"status":"running","service":"storage"}"#,
        ))
        .expect("static health response should be valid")
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<GcsResponseBody>,
    request_id: &str,
) -> http::Response<GcsResponseBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static(SERVER_NAME),
    );
    response
}
