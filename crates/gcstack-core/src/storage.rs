//! Bucket/object storage over a [`Filesystem`].
//!
//! [`Storage`] pairs a filesystem adapter with the in-memory
//! [`MetadataSnapshot`]. Every mutation takes the write guard for the whole
//! check, write, map update and snapshot rewrite sequence, so concurrent
//! requests are serialized. Reads take the read guard and return clones.
//!
//! On-disk layout below the storage root:
//!
//! ```text
//! .meta                 pretty JSON snapshot {buckets, objects, resumable}
//! <bucket>/             one directory per bucket
//! <bucket>/<object>     one file per object; `/` in names nests directories
//! ```
//!
//! The content write and the snapshot rewrite are two separate filesystem
//! writes. A crash between them leaves the two out of step.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::GcsConfig;
use crate::error::{GcsServiceError, GcsServiceResult};
use crate::filesystem::{Filesystem, FsError, MemoryFilesystem, OsFilesystem, parent_path};
use crate::state::{BucketRecord, MetadataSnapshot, ObjectRecord};
use crate::validation::{validate_bucket_name, validate_object_name};

/// Name of the metadata snapshot file at the storage root.
pub const SNAPSHOT_FILE: &str = ".meta";

/// Bucket and object store shared by every request handler.
pub struct Storage {
    fs: Arc<dyn Filesystem>,
    state: RwLock<MetadataSnapshot>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Storage")
            .field("fs", &self.fs)
            .field("bucket_count", &state.buckets.len())
            .field("resumable_count", &state.resumable.len())
            .finish_non_exhaustive()
    }
}

impl Storage {
    /// Open storage over `fs`, loading the snapshot if one exists.
    pub fn new(fs: Arc<dyn Filesystem>) -> GcsServiceResult<Self> {
        let state = if fs.exists(SNAPSHOT_FILE) {
            let data = fs.read(SNAPSHOT_FILE)?;
            serde_json::from_slice::<MetadataSnapshot>(&data)?
        } else {
            MetadataSnapshot::default()
        };

        for bucket in state.buckets.keys() {
            fs.create_dir_all(bucket)?;
        }

        info!(
            buckets = state.buckets.len(),
            resumable = state.resumable.len(),
            "storage opened"
        );
        Ok(Self {
            fs,
            state: RwLock::new(state),
        })
    }

    /// Open storage with the adapter selected by `config.in_memory`.
    pub fn from_config(config: &GcsConfig) -> GcsServiceResult<Self> {
        let fs: Arc<dyn Filesystem> = if config.in_memory {
            Arc::new(MemoryFilesystem::new())
        } else {
            Arc::new(OsFilesystem::new(config.storage_root())?)
        };
        Self::new(fs)
    }

    /// The underlying filesystem adapter.
    #[must_use]
    pub fn filesystem(&self) -> &Arc<dyn Filesystem> {
        &self.fs
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Look up a bucket.
    #[must_use]
    pub fn get_bucket(&self, name: &str) -> Option<BucketRecord> {
        self.state.read().buckets.get(name).cloned()
    }

    /// All buckets, ordered by name.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<BucketRecord> {
        self.state.read().buckets.values().cloned().collect()
    }

    /// Create a bucket from `record`.
    ///
    /// The directory is created before the record is stored.
    ///
    /// # Errors
    ///
    /// - [`GcsServiceError::InvalidBucketName`] if the name is not valid.
    /// - [`GcsServiceError::BucketAlreadyExists`] if the name is taken.
    pub fn create_bucket(&self, record: BucketRecord) -> GcsServiceResult<BucketRecord> {
        validate_bucket_name(&record.name)?;

        let mut state = self.state.write();
        if state.buckets.contains_key(&record.name) {
            return Err(GcsServiceError::BucketAlreadyExists {
                bucket: record.name,
            });
        }

        self.fs.create_dir_all(&record.name)?;
        state.buckets.insert(record.name.clone(), record.clone());
        self.persist(&state)?;

        info!(bucket = %record.name, location = %record.location, "bucket created");
        Ok(record)
    }

    /// Delete an empty bucket and any resumable sessions targeting it.
    ///
    /// The record is removed before the directory. If the directory cannot be
    /// removed the record and sessions are put back and nothing is persisted.
    ///
    /// # Errors
    ///
    /// - [`GcsServiceError::NoSuchBucket`] if the bucket does not exist.
    /// - [`GcsServiceError::BucketNotEmpty`] if it still holds objects.
    pub fn delete_bucket(&self, name: &str) -> GcsServiceResult<()> {
        let mut state = self.state.write();
        if !state.buckets.contains_key(name) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: name.to_owned(),
            });
        }
        if state.object_count(name) > 0 {
            return Err(GcsServiceError::BucketNotEmpty {
                bucket: name.to_owned(),
            });
        }

        let record = state.buckets.remove(name);
        let objects = state.objects.remove(name);
        let orphaned: Vec<String> = state
            .resumable
            .iter()
            .filter(|(_, pending)| pending.bucket == name)
            .map(|(id, _)| id.clone())
            .collect();
        let sessions: Vec<(String, ObjectRecord)> = orphaned
            .iter()
            .filter_map(|id| state.resumable.remove_entry(id))
            .collect();

        match self.fs.remove_dir_all(name) {
            Ok(()) | Err(FsError::NotFound(_)) => {}
            Err(e) => {
                if let Some(record) = record {
                    state.buckets.insert(name.to_owned(), record);
                }
                if let Some(objects) = objects {
                    state.objects.insert(name.to_owned(), objects);
                }
                state.resumable.extend(sessions);
                warn!(bucket = %name, error = %e, "bucket directory removal failed");
                return Err(e.into());
            }
        }
        self.persist(&state)?;

        info!(bucket = %name, sessions = sessions.len(), "bucket deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Write an object, replacing any existing content and record.
    ///
    /// # Errors
    ///
    /// - [`GcsServiceError::InvalidObjectName`] if the name is not valid.
    /// - [`GcsServiceError::NoSuchBucket`] if the bucket does not exist.
    /// - [`GcsServiceError::ObjectPathConflict`] if the name collides with an
    ///   object that is used as a folder, or the other way round.
    pub fn create_file(
        &self,
        bucket: &str,
        name: &str,
        content: &[u8],
        content_type: &str,
    ) -> GcsServiceResult<ObjectRecord> {
        validate_object_name(name)?;

        let mut state = self.state.write();
        let mut record = ObjectRecord::pending(bucket, name, content_type);
        self.write_content(&state, &mut record, content)?;
        state
            .objects
            .entry(bucket.to_owned())
            .or_default()
            .insert(name.to_owned(), record.clone());
        self.persist(&state)?;

        info!(bucket = %bucket, object = %name, size = record.size, "object written");
        Ok(record)
    }

    /// Object metadata.
    ///
    /// # Errors
    ///
    /// [`GcsServiceError::NoSuchBucket`] or [`GcsServiceError::NoSuchObject`].
    pub fn get_file_obj(&self, bucket: &str, name: &str) -> GcsServiceResult<ObjectRecord> {
        let state = self.state.read();
        if !state.buckets.contains_key(bucket) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }
        state
            .object(bucket, name)
            .cloned()
            .ok_or_else(|| no_such_object(bucket, name))
    }

    /// Object content.
    ///
    /// # Errors
    ///
    /// [`GcsServiceError::NoSuchBucket`] if the bucket directory is absent,
    /// [`GcsServiceError::NoSuchObject`] if the file is.
    pub fn get_file(&self, bucket: &str, name: &str) -> GcsServiceResult<Bytes> {
        let _state = self.state.read();
        self.read_content(bucket, name)
    }

    /// Object metadata and content, read under one guard so a concurrent
    /// overwrite cannot pair one version's record with another's bytes.
    ///
    /// # Errors
    ///
    /// [`GcsServiceError::NoSuchBucket`] or [`GcsServiceError::NoSuchObject`].
    pub fn read_object(
        &self,
        bucket: &str,
        name: &str,
    ) -> GcsServiceResult<(ObjectRecord, Bytes)> {
        let state = self.state.read();
        if !state.buckets.contains_key(bucket) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }
        let record = state
            .object(bucket, name)
            .cloned()
            .ok_or_else(|| no_such_object(bucket, name))?;
        let content = self.read_content(bucket, name)?;
        Ok((record, content))
    }

    /// Remove an object's content and record.
    ///
    /// Directories left empty by a nested name are removed too.
    ///
    /// # Errors
    ///
    /// [`GcsServiceError::NoSuchObject`] if either the record or the content
    /// is already gone.
    pub fn delete_file(&self, bucket: &str, name: &str) -> GcsServiceResult<()> {
        let mut state = self.state.write();
        let path = object_path(bucket, name);
        if state.object(bucket, name).is_none() || !self.fs.exists(&path) {
            return Err(no_such_object(bucket, name));
        }

        match self.fs.remove_file(&path) {
            Ok(()) => {}
            Err(FsError::Io(e)) => return Err(FsError::Io(e).into()),
            Err(_) => return Err(no_such_object(bucket, name)),
        }
        self.prune_empty_dirs(bucket, &path)?;

        if let Some(objects) = state.objects.get_mut(bucket) {
            objects.remove(name);
            if objects.is_empty() {
                state.objects.remove(bucket);
            }
        }
        self.persist(&state)?;

        info!(bucket = %bucket, object = %name, "object deleted");
        Ok(())
    }

    /// Objects in `bucket` whose names start with `prefix`, ordered by name.
    ///
    /// # Errors
    ///
    /// [`GcsServiceError::NoSuchBucket`] if the bucket does not exist.
    pub fn list_files(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> GcsServiceResult<Vec<ObjectRecord>> {
        let state = self.state.read();
        if !state.buckets.contains_key(bucket) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }
        let prefix = prefix.unwrap_or_default();
        Ok(state
            .objects
            .get(bucket)
            .into_iter()
            .flat_map(|objects| objects.values())
            .filter(|record| record.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    // -----------------------------------------------------------------------
    // Resumable uploads
    // -----------------------------------------------------------------------

    /// Open a resumable upload session and return its id.
    ///
    /// No object becomes visible until the session is finalized.
    ///
    /// # Errors
    ///
    /// - [`GcsServiceError::InvalidObjectName`] if the name is not valid.
    /// - [`GcsServiceError::NoSuchBucket`] if the bucket does not exist.
    pub fn create_resumable_upload(
        &self,
        bucket: &str,
        name: &str,
        content_type: &str,
    ) -> GcsServiceResult<String> {
        validate_object_name(name)?;

        let mut state = self.state.write();
        if !state.buckets.contains_key(bucket) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }

        let upload_id = new_session_id(bucket, name);
        state.resumable.insert(
            upload_id.clone(),
            ObjectRecord::pending(bucket, name, content_type),
        );
        self.persist(&state)?;

        info!(bucket = %bucket, object = %name, upload_id = %upload_id, "resumable upload created");
        Ok(upload_id)
    }

    /// Write the content for a session and promote its record.
    ///
    /// The session is consumed: a second call with the same id fails.
    ///
    /// # Errors
    ///
    /// - [`GcsServiceError::NoSuchUpload`] if the session id is unknown.
    /// - [`GcsServiceError::NoSuchBucket`] if the target bucket was deleted.
    pub fn create_file_for_resumable_upload(
        &self,
        upload_id: &str,
        content: &[u8],
    ) -> GcsServiceResult<ObjectRecord> {
        let mut state = self.state.write();
        let Some(mut record) = state.resumable.get(upload_id).cloned() else {
            warn!(upload_id = %upload_id, "unknown resumable upload");
            return Err(GcsServiceError::NoSuchUpload {
                upload_id: upload_id.to_owned(),
            });
        };

        self.write_content(&state, &mut record, content)?;
        state
            .objects
            .entry(record.bucket.clone())
            .or_default()
            .insert(record.name.clone(), record.clone());
        state.resumable.remove(upload_id);
        self.persist(&state)?;

        info!(
            bucket = %record.bucket,
            object = %record.name,
            upload_id = %upload_id,
            size = record.size,
            "resumable upload finalized"
        );
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Drop all state and remove everything under the storage root.
    pub fn wipe(&self) -> GcsServiceResult<()> {
        let mut state = self.state.write();
        state.clear();
        for entry in self.fs.list_dir("")? {
            if self.fs.is_dir(&entry) {
                self.fs.remove_dir_all(&entry)?;
            } else {
                self.fs.remove_file(&entry)?;
            }
        }
        info!("storage wiped");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Write `content` for `record` and stamp the record from it.
    ///
    /// The caller holds the write guard.
    fn write_content(
        &self,
        state: &MetadataSnapshot,
        record: &mut ObjectRecord,
        content: &[u8],
    ) -> GcsServiceResult<()> {
        if !state.buckets.contains_key(&record.bucket) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: record.bucket.clone(),
            });
        }
        let path = object_path(&record.bucket, &record.name);
        match self.fs.write(&path, content) {
            Ok(()) => {}
            Err(FsError::NotADirectory(_) | FsError::IsADirectory(_)) => {
                return Err(GcsServiceError::ObjectPathConflict {
                    bucket: record.bucket.clone(),
                    object: record.name.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }
        record.fill_content(content);
        Ok(())
    }

    /// Read an object's bytes. The caller holds a guard.
    fn read_content(&self, bucket: &str, name: &str) -> GcsServiceResult<Bytes> {
        if !self.fs.is_dir(bucket) {
            return Err(GcsServiceError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }
        match self.fs.read(&object_path(bucket, name)) {
            Ok(data) => Ok(data),
            Err(FsError::Io(e)) => Err(FsError::Io(e).into()),
            Err(e) => {
                debug!(bucket = %bucket, object = %name, error = %e, "object content missing");
                Err(no_such_object(bucket, name))
            }
        }
    }

    /// Remove directories between the object and its bucket that are now empty.
    fn prune_empty_dirs(&self, bucket: &str, object_path: &str) -> GcsServiceResult<()> {
        let mut current = object_path;
        while let Some(parent) = parent_path(current) {
            if parent == bucket || !self.fs.list_dir(parent)?.is_empty() {
                break;
            }
            self.fs.remove_dir_all(parent)?;
            current = parent;
        }
        Ok(())
    }

    fn persist(&self, state: &MetadataSnapshot) -> GcsServiceResult<()> {
        let data = serde_json::to_vec_pretty(state)?;
        self.fs.write(SNAPSHOT_FILE, &data)?;
        debug!(size = data.len(), "metadata snapshot written");
        Ok(())
    }
}

fn object_path(bucket: &str, name: &str) -> String {
    format!("{bucket}/{name}")
}

fn no_such_object(bucket: &str, name: &str) -> GcsServiceError {
    GcsServiceError::NoSuchObject {
        bucket: bucket.to_owned(),
        object: name.to_owned(),
    }
}

/// Opaque resumable session id.
///
/// URL-safe base64 of the target, the issue time and a random uuid, so ids do
/// not repeat within a process even for the same object in the same instant.
fn new_session_id(bucket: &str, name: &str) -> String {
    let issued = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    let raw = format!("{bucket}:{name}:{issued}:{}", uuid::Uuid::new_v4());
    URL_SAFE_NO_PAD.encode(raw)
}
