//! Cryptographic constants and domain separation strings.
//!
//! All constants are normative: the session-record addressing scheme and
//! the wrapped-key formats depend on them staying fixed.

/// Byte length of a generated identifier. Access tokens embed a list id
/// as a prefix of exactly this many raw bytes.
pub const GENERATED_ID_BYTES_LENGTH: usize = 9;

/// Size of the salt used for passphrase key derivation, in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of XChaCha20-Poly1305 nonces in bytes (192 bits).
pub const NONCE_SIZE: usize = 24;

/// Size of XChaCha20-Poly1305 authentication tags in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// Size of an authentication verifier in bytes (SHA-256 output).
pub const VERIFIER_SIZE: usize = 32;

/// Size of the persisted entropy snapshot in bytes.
pub const ENTROPY_SIZE: usize = 32;

/// Argon2id memory cost (64 MiB).
pub const ARGON2_M_COST: u32 = 65536;

/// Argon2id iteration count.
pub const ARGON2_T_COST: u32 = 3;

/// Argon2id parallelism.
pub const ARGON2_P_COST: u32 = 4;

/// Domain separation for deriving the AEAD cipher key used to wrap one
/// symmetric key under another.
pub const DOMAIN_KEY_WRAP: &[u8] = b"courier:crypto:key-wrap:v1";

/// Domain separation for deriving the AEAD cipher key used to encrypt
/// opaque payloads (stored password blob, entropy blob).
pub const DOMAIN_PAYLOAD: &[u8] = b"courier:crypto:payload:v1";

/// Domain separation for folding the entropy pool state into an
/// exportable snapshot.
pub const DOMAIN_ENTROPY_EXPORT: &[u8] = b"courier:crypto:entropy-export:v1";
