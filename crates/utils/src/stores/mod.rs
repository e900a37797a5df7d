//! Concrete [`ObjectStore`](crate::ObjectStore) implementations.
//!
//! Contains [`FileObjectStore`] for archives mirrored on a filesystem and
//! [`MemoryObjectStore`] for in-process archives.

pub mod file;
pub mod memory;

pub use file::*;
pub use memory::*;
