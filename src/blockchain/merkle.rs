//! Merkle root over hex transaction hashes.
//!
//! - An empty list yields `sha256("")`.
//! - A single hash is its own root.
//! - Each level hashes the concatenated hex text of adjacent pairs; an odd
//!   trailing hash is paired with itself.

use sha2::{Digest, Sha256};

fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of the empty byte string.
pub fn empty_root() -> String {
    hex::encode(Sha256::digest(b""))
}

/// Order-sensitive root of `hashes`.
pub fn compute_merkle_root<S: AsRef<str>>(hashes: &[S]) -> String {
    if hashes.is_empty() {
        return empty_root();
    }

    let mut level: Vec<String> = hashes.iter().map(|h| h.as_ref().to_string()).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[pair.len() - 1]))
            .collect();
    }

    level.swap_remove(0)
}
