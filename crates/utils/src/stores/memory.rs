use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use crate::{ObjectStore, StoreError, StoreFuture};

/// Object store keeping objects in memory, keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    denied: RwLock<Vec<(String, String)>>,
    fetches: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object, replacing any previous content.
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert((bucket.to_string(), key.to_string()), data.into());
        }
    }

    /// Marks an object as unreadable, fetching it fails with
    /// [`StoreError::AccessDenied`].
    pub fn deny(&self, bucket: &str, key: &str) {
        if let Ok(mut denied) = self.denied.write() {
            denied.push((bucket.to_string(), key.to_string()));
        }
    }

    /// Returns how many fetches were attempted.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn fetch<'a>(&'a self, bucket: &'a str, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let id = (bucket.to_string(), key.to_string());
            let path = format!("{bucket}/{key}");
            let denied = self
                .denied
                .read()
                .map(|d| d.contains(&id))
                .unwrap_or_default();
            if denied {
                return Err(StoreError::AccessDenied(path));
            }
            self.objects
                .read()
                .ok()
                .and_then(|objects| objects.get(&id).cloned())
                .ok_or(StoreError::NotFound(path))
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryObjectStore::new();
        store.insert("inbox", "m1", "raw");
        assert_eq!(store.fetch("inbox", "m1").await.unwrap(), b"raw");
        assert!(matches!(
            store.fetch("inbox", "m2").await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_denied() {
        let store = MemoryObjectStore::new();
        store.insert("inbox", "m1", "raw");
        store.deny("inbox", "m1");
        assert!(matches!(
            store.fetch("inbox", "m1").await,
            Err(StoreError::AccessDenied(path)) if path == "inbox/m1"
        ));
    }
}
