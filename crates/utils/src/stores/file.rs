//! Filesystem-backed object store.
//!
//! Objects live under `{root}/{bucket}/{key}`, which matches the layout of
//! a bucket synced or mounted onto local disk.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::{ObjectStore, StoreError, StoreFuture};

/// Object store reading archived messages from a directory tree.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Creates a new [`FileObjectStore`] rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        info!(root = %root.display(), "File object store initialized");
        Self { root }
    }

    /// Returns the path of an object, refusing bucket names or keys that
    /// would escape the store root.
    fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let is_safe = !bucket.is_empty()
            && !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        is_safe.then(|| self.root.join(relative))
    }
}

impl ObjectStore for FileObjectStore {
    fn fetch<'a>(&'a self, bucket: &'a str, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            let path = self
                .object_path(bucket, key)
                .ok_or_else(|| StoreError::AccessDenied(format!("{bucket}/{key}")))?;
            debug!(path = %path.display(), "Reading object from filesystem");
            let bytes = fs::read(&path).await.map_err(|e| {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read object from filesystem"
                );
                StoreError::from_io(&format!("{bucket}/{key}"), e)
            })?;
            debug!(bucket = %bucket, key = %key, size = bytes.len(), "Read object");
            Ok(bytes)
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}
