//! Infrastructure layer for testgenie
//!
//! Parsing, remote services and the run lock.

pub mod ast;
pub mod lock;
pub mod remote;

use sha2::{Digest, Sha256};

/// Stable key for per-project state, identical across builds and platforms
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_content_is_fixed() {
        assert_eq!(
            hash_content("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_content("/proj/a"), hash_content("/proj/b"));
    }
}
