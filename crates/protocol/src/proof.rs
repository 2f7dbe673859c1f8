//! Session-proof digest
//!
//! Both peers compute `SHA-1(username || 0u32 || client_seed ||
//! server_seed || session_key)` and compare byte-exactly. The integer
//! fields are hashed little-endian; the session key is hashed in the
//! big-endian big-integer encoding delivered by the account service.

use sha1::{Digest, Sha1};

/// Computes the session proof for the given handshake parameters
pub fn session_proof(username: &str, client_seed: u32, server_seed: u32, key: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(username.as_bytes());
    hasher.update(0u32.to_le_bytes());
    hasher.update(client_seed.to_le_bytes());
    hasher.update(server_seed.to_le_bytes());
    hasher.update(key);
    hasher.finalize().into()
}
