//! # courier-crypto
//!
//! Cryptographic primitives for the Courier mail client's session and key
//! hierarchy: Argon2id passphrase key derivation, SHA-256 authentication
//! verifiers, XChaCha20-Poly1305 key wrapping, and the persisted entropy
//! pool that seeds random generation across sessions.
//!
//! This crate is a leaf: it performs no I/O and holds no session state.
//! Key material is zeroized on drop throughout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod entropy;
pub mod errors;
pub mod kdf;
pub mod keys;
pub mod utils;
pub mod verifier;
pub mod wrap;

pub use constants::*;
pub use entropy::EntropyPool;
pub use errors::CryptoError;
pub use kdf::{derive_passphrase_key, hkdf_derive, hkdf_derive_32};
pub use keys::{KeyLength, SymmetricKey};
pub use utils::{base64_url_decode, base64_url_encode, generate_random_bytes};
pub use verifier::{auth_verifier, auth_verifier_b64, external_auth_token};
pub use wrap::{decrypt_bytes, decrypt_key, encrypt_bytes, encrypt_key};
