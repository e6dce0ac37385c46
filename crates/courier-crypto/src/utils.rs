//! Common utility functions for courier cryptographic operations.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// Generate cryptographically secure random bytes.
///
/// Uses the system's CSPRNG to fill a fixed-size array with random bytes.
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Base64url encode data without padding.
pub fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Base64url decode data without padding.
pub fn base64_url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_bytes_different() {
        let bytes1: [u8; 32] = generate_random_bytes();
        let bytes2: [u8; 32] = generate_random_bytes();
        assert_ne!(bytes1, bytes2);
    }

    #[test]
    fn test_base64_url_roundtrip() {
        let original = b"hello world!";
        let encoded = base64_url_encode(original);
        let decoded = base64_url_decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_base64_url_no_padding() {
        let encoded = base64_url_encode(b"a");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_base64_url_decode_invalid() {
        assert!(base64_url_decode("!!invalid!!").is_err());
    }
}
