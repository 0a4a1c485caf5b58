//! Photoshare Storage Library
//!
//! Blob store abstraction for uploaded media bytes. The catalog only ever keeps the key
//! returned by [`BlobStore::upload`]; bytes are fetched back through the same trait.
//!
//! # Storage key format
//!
//! `media/{creator_id}/{uuid}-{filename}`. Keys must not contain `..` or a leading `/`.
//! Key generation is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_blob_store;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use photoshare_core::StorageBackend;
pub use traits::{BlobStore, StorageError, StorageResult};
