//! Session token generation and hashing.
//!
//! Tokens are never stored in plain text - only their SHA256 hashes.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Prefix carried by every session token
pub const SESSION_TOKEN_PREFIX: &str = "sess_";

/// Full length of a session token: prefix + 32 hex characters
pub const SESSION_TOKEN_LEN: usize = 37;

/// Generate a new session token
pub fn generate_session_token() -> String {
    format!(
        "{}{}",
        SESSION_TOKEN_PREFIX,
        Uuid::new_v4().to_string().replace("-", "")
    )
}

/// Hash a session token for storage
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
