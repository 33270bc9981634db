//! Content addressing and deterministic node identity.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Namespace for node identities derived by [`node_id`].
const NODE_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6d, 0x65, 0x64, 0x69, 0x61, 0x67, 0x72, 0x61, 0x70, 0x68, 0x2d, 0x6e, 0x6f, 0x64, 0x65, 0x73,
]);

/// Digest of a node's semantic content (full SHA256, hex encoded).
pub fn content_digest(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    hex::encode(hasher.finalize())
}

/// Short digest (first 16 hex chars of SHA256), used for cache directories.
pub fn short_digest(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// Deterministic node identity for a seed string (UUID v5).
pub fn node_id(seed: &str) -> String {
    Uuid::new_v5(&NODE_ID_NAMESPACE, seed.as_bytes()).to_string()
}
