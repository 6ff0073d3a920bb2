//! SHA-256 card identifiers.
//!
//! Accepts only [`CanonicalBytes`], so every card id is computed from
//! canonical content.

use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// Lowercase hex SHA-256 of canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    Sha256::digest(data.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_64_lowercase_chars() {
        let cb = CanonicalBytes::new(&serde_json::json!({"key": "value"})).unwrap();
        let hex = sha256_hex(&cb);
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn different_content_different_hex() {
        let cb1 = CanonicalBytes::new(&serde_json::json!({"identity": "alice"})).unwrap();
        let cb2 = CanonicalBytes::new(&serde_json::json!({"identity": "bob"})).unwrap();
        assert_ne!(sha256_hex(&cb1), sha256_hex(&cb2));
    }

    #[test]
    fn known_vector_for_empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_hex(&cb),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }
}
