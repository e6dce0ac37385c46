//! Authentication verifiers.
//!
//! A verifier is a one-way value derived from a key: it proves knowledge
//! of the key to the server without revealing it, and lets the server
//! validate a later password change. Verifiers are never decoded back.

use sha2::{Digest, Sha256};

use crate::constants::VERIFIER_SIZE;
use crate::keys::SymmetricKey;
use crate::utils::base64_url_encode;

/// Compute the authentication verifier of a key (SHA-256, one-way).
#[must_use]
pub fn auth_verifier(key: &SymmetricKey) -> [u8; VERIFIER_SIZE] {
    Sha256::digest(key.as_bytes()).into()
}

/// The URL-safe base64 form of [`auth_verifier`], as sent on the wire.
#[must_use]
pub fn auth_verifier_b64(key: &SymmetricKey) -> String {
    base64_url_encode(&auth_verifier(key))
}

/// Authentication token for external sessions: the hash of the shared
/// salt, proving the caller received the invitation material.
#[must_use]
pub fn external_auth_token(salt: &[u8]) -> String {
    base64_url_encode(&Sha256::digest(salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_is_deterministic() {
        let key = SymmetricKey::from_bytes(&[42u8; 32]).unwrap();
        assert_eq!(auth_verifier(&key), auth_verifier(&key));
    }

    #[test]
    fn test_verifier_differs_per_key() {
        let key1 = SymmetricKey::from_bytes(&[1u8; 32]).unwrap();
        let key2 = SymmetricKey::from_bytes(&[2u8; 32]).unwrap();
        assert_ne!(auth_verifier(&key1), auth_verifier(&key2));
    }

    #[test]
    fn test_verifier_is_not_the_key() {
        let key = SymmetricKey::from_bytes(&[42u8; 32]).unwrap();
        assert_ne!(auth_verifier(&key).as_slice(), key.as_bytes());
    }

    #[test]
    fn test_verifier_b64_is_url_safe() {
        let key = SymmetricKey::from_bytes(&[0xFBu8; 32]).unwrap();
        let encoded = auth_verifier_b64(&key);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_external_auth_token_matches_salt_hash() {
        let salt = [9u8; 16];
        assert_eq!(external_auth_token(&salt), external_auth_token(&salt));
        assert_ne!(external_auth_token(&salt), external_auth_token(&[8u8; 16]));
    }
}
