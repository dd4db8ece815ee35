//! Storage engine for the gcstack emulator.
//!
//! # Architecture
//!
//! ```text
//! HTTP handlers (gcstack-http)
//!        |
//!        v
//!     Storage  ── buckets, objects, resumable sessions (one RwLock)
//!        |
//!        v
//!  dyn Filesystem (on-disk or in-memory)
//! ```

pub mod checksums;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod state;
pub mod storage;
pub mod validation;

pub use config::GcsConfig;
pub use error::{GcsServiceError, GcsServiceResult};
pub use filesystem::{Filesystem, FsError, MemoryFilesystem, OsFilesystem};
pub use state::{BucketRecord, MetadataSnapshot, ObjectRecord};
pub use storage::Storage;
