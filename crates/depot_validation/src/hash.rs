//! Content hashing.

use sha2::{Digest, Sha256};

/// SHA-256 of `data` as 64 lower-case hex characters.
///
/// Used for deduplication and cache-key material only; record ids are
/// generated independently.
///
/// # Examples
///
/// ```
/// use depot_validation::content_hash;
///
/// assert_eq!(
///     content_hash(b"abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
