//! On-disk filesystem rooted at a directory.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, trace};

use super::{Filesystem, FsError, split_path};

/// [`Filesystem`] backed by `std::fs` under a root directory.
#[derive(Debug, Clone)]
pub struct OsFilesystem {
    root: PathBuf,
}

impl OsFilesystem {
    /// Open (creating if needed) the root directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened on-disk storage root");
        Ok(Self { root })
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let mut resolved = self.root.clone();
        for segment in split_path(path)? {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

/// Map an `io::Error` onto the adapter's error kinds.
fn map_io(path: &str, err: io::Error) -> FsError {
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path.to_owned()),
        io::ErrorKind::NotADirectory => FsError::NotADirectory(path.to_owned()),
        io::ErrorKind::IsADirectory => FsError::IsADirectory(path.to_owned()),
        _ => FsError::Io(err),
    }
}

impl Filesystem for OsFilesystem {
    fn create_dir_all(&self, path: &str) -> Result<(), FsError> {
        let target = self.resolve(path)?;
        if target.is_file() {
            return Err(FsError::NotADirectory(path.to_owned()));
        }
        std::fs::create_dir_all(&target).map_err(|e| map_io(path, e))
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        if split_path(path)?.is_empty() {
            return Err(FsError::InvalidPath(path.to_owned()));
        }
        let target = self.resolve(path)?;
        let meta = std::fs::symlink_metadata(&target).map_err(|e| map_io(path, e))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(path.to_owned()));
        }
        std::fs::remove_dir_all(&target).map_err(|e| map_io(path, e))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let target = self.resolve(path)?;
        if split_path(path)?.is_empty() || target.is_dir() {
            return Err(FsError::IsADirectory(path.to_owned()));
        }
        if let Some(parent) = target.parent() {
            if parent.is_file() {
                return Err(FsError::NotADirectory(path.to_owned()));
            }
            std::fs::create_dir_all(parent).map_err(|e| map_io(path, e))?;
        }
        std::fs::write(&target, data).map_err(|e| map_io(path, e))?;
        trace!(path, size = data.len(), "wrote file");
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Bytes, FsError> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(FsError::IsADirectory(path.to_owned()));
        }
        let data = std::fs::read(&target).map_err(|e| map_io(path, e))?;
        Ok(Bytes::from(data))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(FsError::IsADirectory(path.to_owned()));
        }
        std::fs::remove_file(&target).map_err(|e| map_io(path, e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|p| p.exists())
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|p| p.is_dir())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let target = self.resolve(path)?;
        if target.is_file() {
            return Err(FsError::NotADirectory(path.to_owned()));
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&target).map_err(|e| map_io(path, e))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
