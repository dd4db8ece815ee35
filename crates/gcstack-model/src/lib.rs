//! Wire-level types for the gcstack storage emulator.
//!
//! This crate has no I/O. It defines the error taxonomy returned to clients,
//! the set of supported operations, and the JSON resource shapes.

pub mod error;
pub mod operations;
pub mod types;

pub use error::{GcsError, GcsErrorCode};
pub use operations::GcsOperation;
pub use types::{BucketList, BucketResource, ObjectList, ObjectResource};
