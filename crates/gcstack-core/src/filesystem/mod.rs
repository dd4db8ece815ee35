//! Filesystem capability used by [`Storage`](crate::storage::Storage).
//!
//! Paths are `/`-separated and relative to the adapter root. Every path is
//! checked by [`split_path`] before it touches the backing store, so an object
//! name can never climb out of its bucket directory.
//!
//! ```text
//! Storage
//!    |
//!    v
//! dyn Filesystem ──> OsFilesystem     (std::fs under a root directory)
//!               └──> MemoryFilesystem (BTreeMap of nodes)
//! ```

mod memory;
mod os;

use std::fmt::Debug;

use bytes::Bytes;

pub use memory::MemoryFilesystem;
pub use os::OsFilesystem;

/// Errors returned by a [`Filesystem`].
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Nothing exists at the path.
    #[error("no such file or directory: {0}")]
    NotFound(String),
    /// A directory was expected but a file was found.
    #[error("not a directory: {0}")]
    NotADirectory(String),
    /// A file was expected but a directory was found.
    #[error("is a directory: {0}")]
    IsADirectory(String),
    /// The path is absolute, empty, or escapes the root.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Directory and file operations over a rooted tree.
pub trait Filesystem: Send + Sync + Debug {
    /// Create a directory and any missing parents. Existing directories are fine.
    fn create_dir_all(&self, path: &str) -> Result<(), FsError>;

    /// Remove a directory and everything under it.
    fn remove_dir_all(&self, path: &str) -> Result<(), FsError>;

    /// Write a file, creating parent directories and truncating any existing content.
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    /// Read a whole file.
    fn read(&self, path: &str) -> Result<Bytes, FsError>;

    /// Remove a single file.
    fn remove_file(&self, path: &str) -> Result<(), FsError>;

    /// Whether anything exists at `path`. The empty path is the root.
    fn exists(&self, path: &str) -> bool;

    /// Whether `path` is a directory. The empty path is the root.
    fn is_dir(&self, path: &str) -> bool;

    /// Names of the direct children of a directory, sorted.
    fn list_dir(&self, path: &str) -> Result<Vec<String>, FsError>;
}

/// Split a relative path into its segments.
///
/// The empty string is the root and yields no segments. Absolute paths, empty
/// segments, `.`/`..` segments, backslashes and NUL bytes are rejected.
pub fn split_path(path: &str) -> Result<Vec<&str>, FsError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    if path.starts_with('/') || path.contains('\\') || path.contains('\0') {
        return Err(FsError::InvalidPath(path.to_owned()));
    }
    let segments: Vec<&str> = path.split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return Err(FsError::InvalidPath(path.to_owned()));
    }
    Ok(segments)
}

/// Parent of a relative path, or `None` for a top-level entry.
#[must_use]
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}
