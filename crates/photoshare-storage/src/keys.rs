//! Shared key generation for blob store backends.

use uuid::Uuid;

/// Generate a unique storage key for a creator's upload.
///
/// The random prefix keeps two uploads of the same filename apart.
pub fn generate_storage_key(creator_id: i64, filename: &str) -> String {
    format!("media/{}/{}-{}", creator_id, Uuid::new_v4(), filename)
}

/// Reject keys that could escape the storage root.
pub fn is_safe_key(storage_key: &str) -> bool {
    !storage_key.is_empty() && !storage_key.contains("..") && !storage_key.starts_with('/')
}
