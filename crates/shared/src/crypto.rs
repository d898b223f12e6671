//! Cryptographic utilities for API key generation and hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Prefix carried by every machine API key.
pub const API_KEY_PREFIX: &str = "sk_";

/// Number of random bytes backing a generated API key.
const API_KEY_RANDOM_BYTES: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a new raw API key (`sk_` + url-safe base64 random bytes).
///
/// Only the SHA-256 hash of the result is ever stored; the raw key is
/// shown to the caller once at creation time.
pub fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..API_KEY_RANDOM_BYTES).map(|_| rng.gen()).collect();
    format!("{}{}", API_KEY_PREFIX, URL_SAFE_NO_PAD.encode(random_bytes))
}

/// Extracts the display prefix from an API key (first 8 characters after "sk_").
pub fn extract_key_prefix(key: &str) -> Option<&str> {
    if key.starts_with(API_KEY_PREFIX) && key.len() >= 11 {
        Some(&key[3..11])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        let hash = sha256_hex("");
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same_input"), sha256_hex("same_input"));
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        assert_ne!(sha256_hex("input1"), sha256_hex("input2"));
    }

    #[test]
    fn test_generate_api_key_shape() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert!(key.len() > 20);
    }

    #[test]
    fn test_generate_api_key_uniqueness() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_extract_key_prefix() {
        assert_eq!(extract_key_prefix("sk_abcdefgh12345"), Some("abcdefgh"));
        assert_eq!(extract_key_prefix("sk_short"), None);
        assert_eq!(extract_key_prefix("invalid_key"), None);
    }

    #[test]
    fn test_extract_key_prefix_exact_length() {
        // sk_ (3) + 8 characters = 11 minimum
        assert_eq!(extract_key_prefix("sk_12345678"), Some("12345678"));
    }

    #[test]
    fn test_extract_key_prefix_wrong_prefix() {
        assert_eq!(extract_key_prefix("pk_abcdefgh12345"), None);
        assert_eq!(extract_key_prefix("SK_abcdefgh12345"), None);
        assert_eq!(extract_key_prefix(""), None);
    }

    #[test]
    fn test_extract_key_prefix_from_generated() {
        let key = generate_api_key();
        assert_eq!(extract_key_prefix(&key).unwrap().len(), 8);
    }
}
