//! Symmetric key material.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{CryptoError, Result};
use crate::utils::generate_random_bytes;

/// Supported symmetric key lengths.
///
/// Legacy keys are 128 bits; newly generated keys are 256 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLength {
    /// 128-bit key (legacy).
    Bits128,
    /// 256-bit key.
    Bits256,
}

impl KeyLength {
    /// Key length in bytes.
    #[must_use]
    pub fn byte_length(self) -> usize {
        match self {
            KeyLength::Bits128 => 16,
            KeyLength::Bits256 => 32,
        }
    }
}

/// A symmetric key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    /// Build a key from raw bytes. The length must match a supported
    /// [`KeyLength`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            16 | 32 => Ok(Self(bytes.to_vec())),
            other => Err(CryptoError::InvalidKeyLength(other)),
        }
    }

    /// Generate a fresh random key of the given length.
    #[must_use]
    pub fn generate(length: KeyLength) -> Self {
        match length {
            KeyLength::Bits128 => Self(generate_random_bytes::<16>().to_vec()),
            KeyLength::Bits256 => Self(generate_random_bytes::<32>().to_vec()),
        }
    }

    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The length class of this key.
    #[must_use]
    pub fn length(&self) -> KeyLength {
        if self.0.len() == 16 {
            KeyLength::Bits128
        } else {
            KeyLength::Bits256
        }
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_accepts_supported_lengths() {
        assert!(SymmetricKey::from_bytes(&[0u8; 16]).is_ok());
        assert!(SymmetricKey::from_bytes(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_from_bytes_rejects_other_lengths() {
        for len in [0usize, 1, 15, 17, 31, 33, 64] {
            let result = SymmetricKey::from_bytes(&vec![0u8; len]);
            assert!(matches!(result, Err(CryptoError::InvalidKeyLength(l)) if l == len));
        }
    }

    #[test]
    fn test_generate_matches_requested_length() {
        assert_eq!(SymmetricKey::generate(KeyLength::Bits128).as_bytes().len(), 16);
        assert_eq!(SymmetricKey::generate(KeyLength::Bits256).as_bytes().len(), 32);
    }

    #[test]
    fn test_generate_is_random() {
        let a = SymmetricKey::generate(KeyLength::Bits256);
        let b = SymmetricKey::generate(KeyLength::Bits256);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_debug_does_not_leak_key_material() {
        let key = SymmetricKey::from_bytes(&[0xAB; 32]).unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("AB"));
        assert!(!rendered.contains("171"));
    }
}
