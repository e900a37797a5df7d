use std::{error::Error, fmt::Display, future::Future, io, pin::Pin};

/// Result type for object store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future type for object store operations, enabling object safety.
pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = StoreResult<Vec<u8>>> + Send + 'a>>;

/// Errors that can occur while fetching an archived message.
#[derive(Debug)]
pub enum StoreError {
    /// The object does not exist.
    NotFound(String),
    /// The object exists but may not be read.
    AccessDenied(String),
    /// An I/O error occurred.
    Io(io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(key) => write!(f, "Object not found: {key}"),
            StoreError::AccessDenied(key) => write!(f, "Access denied: {key}"),
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for StoreError {}

impl StoreError {
    /// Maps an I/O error raised while reading `key` into a store error.
    pub fn from_io(key: &str, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            io::ErrorKind::PermissionDenied => StoreError::AccessDenied(key.to_string()),
            _ => StoreError::Io(e),
        }
    }
}

/// Trait for object stores holding the archived raw emails.
///
/// Implementations are stateless from the relay's point of view, a fetch
/// either returns the full object or fails, and is never retried.
pub trait ObjectStore: Send + Sync {
    /// Fetches the object stored under `key` in `bucket`.
    fn fetch<'a>(&'a self, bucket: &'a str, key: &'a str) -> StoreFuture<'a>;

    /// Returns the name of this store.
    fn name(&self) -> &str;
}
