//! Passphrase key derivation (Argon2id) and HKDF-SHA256 helpers.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::constants::{ARGON2_M_COST, ARGON2_P_COST, ARGON2_T_COST};
use crate::errors::{CryptoError, Result};
use crate::keys::{KeyLength, SymmetricKey};

/// Derive a symmetric key from a passphrase and salt using Argon2id.
///
/// Deterministic for identical inputs. The salt must be non-empty; the
/// parameters match the server-side verifier derivation.
pub fn derive_passphrase_key(
    passphrase: &str,
    salt: &[u8],
    length: KeyLength,
) -> Result<SymmetricKey> {
    if salt.is_empty() {
        return Err(CryptoError::EmptySalt);
    }

    let params = Params::new(
        ARGON2_M_COST,
        ARGON2_T_COST,
        ARGON2_P_COST,
        Some(length.byte_length()),
    )
    .map_err(|_| CryptoError::KeyDerivation)?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new(vec![0u8; length.byte_length()]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|_| CryptoError::KeyDerivation)?;

    SymmetricKey::from_bytes(&key)
}

/// Derive a key using HKDF-SHA256.
pub fn hkdf_derive(ikm: &[u8], info: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut output = vec![0u8; output_len];
    hkdf.expand(info, &mut output)
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(output)
}

/// Derive a 32-byte key using HKDF-SHA256.
pub fn hkdf_derive_32(ikm: &[u8], info: &[u8]) -> Result<[u8; 32]> {
    let output = hkdf_derive(ikm, info, 32)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&output);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; 16] = [7u8; 16];

    #[test]
    fn test_derive_is_deterministic() {
        let key1 = derive_passphrase_key("passphrase", &SALT, KeyLength::Bits256).unwrap();
        let key2 = derive_passphrase_key("passphrase", &SALT, KeyLength::Bits256).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_different_passphrases() {
        let key1 = derive_passphrase_key("passphrase-a", &SALT, KeyLength::Bits256).unwrap();
        let key2 = derive_passphrase_key("passphrase-b", &SALT, KeyLength::Bits256).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_different_salts() {
        let key1 = derive_passphrase_key("passphrase", &[1u8; 16], KeyLength::Bits256).unwrap();
        let key2 = derive_passphrase_key("passphrase", &[2u8; 16], KeyLength::Bits256).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_rejects_empty_salt() {
        let result = derive_passphrase_key("passphrase", &[], KeyLength::Bits256);
        assert!(matches!(result, Err(CryptoError::EmptySalt)));
    }

    #[test]
    fn test_derive_honors_key_length() {
        let key = derive_passphrase_key("passphrase", &SALT, KeyLength::Bits128).unwrap();
        assert_eq!(key.as_bytes().len(), 16);
    }

    #[test]
    fn test_hkdf_derive_is_deterministic() {
        let output1 = hkdf_derive(b"input key material", b"domain:context:v1", 32).unwrap();
        let output2 = hkdf_derive(b"input key material", b"domain:context:v1", 32).unwrap();
        assert_eq!(output1, output2);
    }

    #[test]
    fn test_hkdf_derive_different_info() {
        let output1 = hkdf_derive_32(b"ikm", b"domain:context1:v1").unwrap();
        let output2 = hkdf_derive_32(b"ikm", b"domain:context2:v1").unwrap();
        assert_ne!(output1, output2);
    }
}
