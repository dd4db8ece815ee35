//! In-memory filesystem.

use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::RwLock;

use super::{Filesystem, FsError, split_path};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Bytes),
}

/// [`Filesystem`] that keeps every node in a sorted map keyed by full path.
///
/// The root is implicit. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryFilesystem {
    /// Create an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Insert directory nodes for every prefix of `segments`.
fn ensure_dirs(
    nodes: &mut BTreeMap<String, Node>,
    segments: &[&str],
    path: &str,
) -> Result<(), FsError> {
    let mut current = String::new();
    for segment in segments {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        match nodes.get(&current) {
            Some(Node::File(_)) => return Err(FsError::NotADirectory(path.to_owned())),
            Some(Node::Dir) => {}
            None => {
                nodes.insert(current.clone(), Node::Dir);
            }
        }
    }
    Ok(())
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &str) -> Result<(), FsError> {
        let segments = split_path(path)?;
        ensure_dirs(&mut self.nodes.write(), &segments, path)
    }

    fn remove_dir_all(&self, path: &str) -> Result<(), FsError> {
        if split_path(path)?.is_empty() {
            return Err(FsError::InvalidPath(path.to_owned()));
        }
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            None => Err(FsError::NotFound(path.to_owned())),
            Some(Node::File(_)) => Err(FsError::NotADirectory(path.to_owned())),
            Some(Node::Dir) => {
                let prefix = format!("{path}/");
                nodes.retain(|key, _| key != path && !key.starts_with(&prefix));
                Ok(())
            }
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let segments = split_path(path)?;
        let Some((_, parents)) = segments.split_last() else {
            return Err(FsError::IsADirectory(path.to_owned()));
        };
        let mut nodes = self.nodes.write();
        if matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(FsError::IsADirectory(path.to_owned()));
        }
        ensure_dirs(&mut nodes, parents, path)?;
        nodes.insert(path.to_owned(), Node::File(Bytes::copy_from_slice(data)));
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Bytes, FsError> {
        if split_path(path)?.is_empty() {
            return Err(FsError::IsADirectory(path.to_owned()));
        }
        match self.nodes.read().get(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(FsError::IsADirectory(path.to_owned())),
            None => Err(FsError::NotFound(path.to_owned())),
        }
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        split_path(path)?;
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(FsError::IsADirectory(path.to_owned())),
            None => Err(FsError::NotFound(path.to_owned())),
        }
    }

    fn exists(&self, path: &str) -> bool {
        match split_path(path) {
            Ok(segments) if segments.is_empty() => true,
            Ok(_) => self.nodes.read().contains_key(path),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        match split_path(path) {
            Ok(segments) if segments.is_empty() => true,
            Ok(_) => matches!(self.nodes.read().get(path), Some(Node::Dir)),
            Err(_) => false,
        }
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let is_root = split_path(path)?.is_empty();
        let nodes = self.nodes.read();
        if !is_root {
            match nodes.get(path) {
                None => return Err(FsError::NotFound(path.to_owned())),
                Some(Node::File(_)) => return Err(FsError::NotADirectory(path.to_owned())),
                Some(Node::Dir) => {}
            }
        }
        let prefix = if is_root {
            String::new()
        } else {
            format!("{path}/")
        };
        let names = nodes
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&prefix))
            .filter_map(|key| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_owned())
            })
            .collect();
        Ok(names)
    }
}
