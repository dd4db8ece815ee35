//! HTTP surface of the gcstack storage emulator.
//!
//! - **Router** ([`router`]): ordered path patterns with named segments, first
//!   structural match wins.
//! - **Request** ([`request`]): decoded path, multi-valued query, path
//!   parameters and a lazily decoded body ([`multipart`] for uploads).
//! - **Response** ([`response`]): status, headers and one payload, finalized
//!   exactly once.
//! - **Handlers** ([`handlers`]): bucket, object and upload operations over a
//!   shared [`Storage`](gcstack_core::Storage).
//! - **Service** ([`service`]): the hyper `Service`.
//! - **Server** ([`server`]): bind, start, stop.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> GcsHttpService (hyper Service)
//!     -> Health check interception
//!     -> Body collection
//!     -> spawn_blocking:
//!          Router (pattern match, path params)
//!            -> handler(RequestContext, ResponseContext, GcsState)
//!              -> Storage
//!     -> ResponseContext::finalize (or the error document)
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response
//! ```

// GcsError is the error type of every handler and router call.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod handlers;
pub mod multipart;
pub mod request;
pub mod resource;
pub mod response;
pub mod router;
pub mod server;
pub mod service;

pub use handlers::{GcsState, build_router};
pub use server::{Server, ServerError};
pub use service::GcsHttpService;
