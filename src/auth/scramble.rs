//! Challenge-response scramble computation.
//!
//! Implements:
//! - mysql_native_password (SHA1-based, legacy)
//! - caching_sha2_password (SHA256-based, MySQL 8+)

use sha1::{Digest as Sha1Digest, Sha1};
use sha2::{Digest as Sha256Digest, Sha256};

/// Compute the mysql_native_password response for a server nonce.
///
/// Formula: SHA1(password) XOR SHA1(nonce + SHA1(SHA1(password)))
///
/// An empty password scrambles to an empty response.
pub fn scramble_native(password: &[u8], nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let hash1 = Sha1::digest(password);
    let hash2 = Sha1::digest(hash1);

    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(hash2);
    let hash3 = hasher.finalize();

    xor(&hash1, &hash3)
}

/// Compute the caching_sha2_password response for a server nonce.
///
/// Formula: SHA256(password) XOR SHA256(SHA256(SHA256(password)) + nonce)
pub fn scramble_sha256(password: &[u8], nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let hash1 = Sha256::digest(password);
    let hash2 = Sha256::digest(hash1);

    let mut hasher = Sha256::new();
    hasher.update(hash2);
    hasher.update(nonce);
    let hash3 = hasher.finalize();

    xor(&hash1, &hash3)
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}
