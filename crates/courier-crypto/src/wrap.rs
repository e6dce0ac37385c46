//! Key and payload wrapping with XChaCha20-Poly1305.
//!
//! A wrapped key is a key encrypted under another key, the building block
//! of the hierarchical key model (group keys wrapped by the user-group
//! key, the user-group key wrapped by the passphrase key). The same
//! construction encrypts opaque payloads: the stored password blob and
//! the persisted entropy blob.
//!
//! The AEAD cipher key is normalized from the wrapping key through HKDF
//! with a domain label, so 128- and 256-bit wrapping keys drive the same
//! cipher. A random 24-byte nonce is prepended to each ciphertext.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroizing;

use crate::constants::{DOMAIN_KEY_WRAP, DOMAIN_PAYLOAD, NONCE_SIZE};
use crate::errors::{CryptoError, Result};
use crate::kdf::hkdf_derive_32;
use crate::keys::SymmetricKey;
use crate::utils::generate_random_bytes;

fn cipher_for(wrapping_key: &SymmetricKey, domain: &[u8]) -> Result<XChaCha20Poly1305> {
    let cipher_key = Zeroizing::new(hkdf_derive_32(wrapping_key.as_bytes(), domain)?);
    Ok(XChaCha20Poly1305::new(Key::from_slice(&*cipher_key)))
}

fn encrypt_with(wrapping_key: &SymmetricKey, domain: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(wrapping_key, domain)?;
    let nonce = generate_random_bytes::<NONCE_SIZE>();
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt_with(wrapping_key: &SymmetricKey, domain: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::Decryption);
    }
    let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = cipher_for(wrapping_key, domain)?;
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

/// Wrap `key` under `wrapping_key`.
pub fn encrypt_key(wrapping_key: &SymmetricKey, key: &SymmetricKey) -> Result<Vec<u8>> {
    encrypt_with(wrapping_key, DOMAIN_KEY_WRAP, key.as_bytes())
}

/// Unwrap a key wrapped with [`encrypt_key`].
pub fn decrypt_key(wrapping_key: &SymmetricKey, wrapped: &[u8]) -> Result<SymmetricKey> {
    let plaintext = Zeroizing::new(decrypt_with(wrapping_key, DOMAIN_KEY_WRAP, wrapped)?);
    SymmetricKey::from_bytes(&plaintext)
}

/// Encrypt an opaque payload under `key`.
pub fn encrypt_bytes(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with(key, DOMAIN_PAYLOAD, plaintext)
}

/// Decrypt a payload encrypted with [`encrypt_bytes`].
pub fn decrypt_bytes(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    decrypt_with(key, DOMAIN_PAYLOAD, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyLength;

    #[test]
    fn test_key_wrap_roundtrip() {
        let wrapping_key = SymmetricKey::generate(KeyLength::Bits256);
        let key = SymmetricKey::generate(KeyLength::Bits256);

        let wrapped = encrypt_key(&wrapping_key, &key).unwrap();
        let unwrapped = decrypt_key(&wrapping_key, &wrapped).unwrap();
        assert_eq!(unwrapped.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_key_wrap_with_128_bit_wrapping_key() {
        let wrapping_key = SymmetricKey::generate(KeyLength::Bits128);
        let key = SymmetricKey::generate(KeyLength::Bits256);

        let wrapped = encrypt_key(&wrapping_key, &key).unwrap();
        let unwrapped = decrypt_key(&wrapping_key, &wrapped).unwrap();
        assert_eq!(unwrapped.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_unwrap_with_wrong_key_fails() {
        let wrapping_key = SymmetricKey::generate(KeyLength::Bits256);
        let other_key = SymmetricKey::generate(KeyLength::Bits256);
        let key = SymmetricKey::generate(KeyLength::Bits256);

        let wrapped = encrypt_key(&wrapping_key, &key).unwrap();
        assert!(matches!(
            decrypt_key(&other_key, &wrapped),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = SymmetricKey::generate(KeyLength::Bits256);
        let mut blob = encrypt_bytes(&key, b"payload").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(
            decrypt_bytes(&key, &blob),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_payload_roundtrip() {
        let key = SymmetricKey::generate(KeyLength::Bits256);
        let blob = encrypt_bytes(&key, b"the stored passphrase").unwrap();
        assert_eq!(decrypt_bytes(&key, &blob).unwrap(), b"the stored passphrase");
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = SymmetricKey::generate(KeyLength::Bits256);
        assert!(matches!(
            decrypt_bytes(&key, &[0u8; 7]),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_key_wrap_and_payload_domains_are_separated() {
        let key = SymmetricKey::generate(KeyLength::Bits256);
        let inner = SymmetricKey::generate(KeyLength::Bits256);

        let wrapped = encrypt_key(&key, &inner).unwrap();
        assert!(decrypt_bytes(&key, &wrapped).is_err());
    }

    #[test]
    fn test_nonces_are_fresh() {
        let key = SymmetricKey::generate(KeyLength::Bits256);
        let a = encrypt_bytes(&key, b"same plaintext").unwrap();
        let b = encrypt_bytes(&key, b"same plaintext").unwrap();
        assert_ne!(a, b);
    }
}
