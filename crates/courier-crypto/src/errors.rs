//! Error types for cryptographic operations.

/// Error type for all operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Key derivation requires a non-empty salt.
    #[error("salt must not be empty")]
    EmptySalt,
    /// The key derivation primitive rejected its inputs.
    #[error("key derivation failed")]
    KeyDerivation,
    /// Encryption failed.
    #[error("encryption failed")]
    Encryption,
    /// Decryption or tag verification failed.
    #[error("decryption failed")]
    Decryption,
    /// A key had a length other than 16 or 32 bytes.
    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, CryptoError>;
