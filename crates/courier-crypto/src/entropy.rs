//! Entropy pool persisted across sessions.
//!
//! The pool is a SHA-256 sponge over OS randomness. Persisted entropy
//! from a previous session is mixed in after login; a snapshot is taken
//! and stored (encrypted) at logout. Losing the blob only costs the
//! carried-over entropy, never correctness.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{DOMAIN_ENTROPY_EXPORT, ENTROPY_SIZE};
use crate::utils::generate_random_bytes;

/// Accumulator for random seed material.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EntropyPool {
    state: [u8; ENTROPY_SIZE],
}

impl EntropyPool {
    /// Create a pool seeded from the OS random generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: generate_random_bytes(),
        }
    }

    /// Mix external entropy into the pool.
    pub fn feed(&mut self, entropy: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.state);
        hasher.update(entropy);
        self.state = hasher.finalize().into();
    }

    /// Produce a snapshot for persistence.
    ///
    /// Fresh OS randomness is folded in first, and the exported value is
    /// domain-separated from the internal state, so a leaked snapshot
    /// does not reveal the pool.
    pub fn snapshot(&mut self) -> [u8; ENTROPY_SIZE] {
        self.feed(&generate_random_bytes::<ENTROPY_SIZE>());
        let mut hasher = Sha256::new();
        hasher.update(self.state);
        hasher.update(DOMAIN_ENTROPY_EXPORT);
        hasher.finalize().into()
    }
}

impl Default for EntropyPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_changes_state() {
        let mut pool = EntropyPool::new();
        let before = pool.state;
        pool.feed(b"persisted entropy");
        assert_ne!(pool.state, before);
    }

    #[test]
    fn test_snapshot_differs_from_state() {
        let mut pool = EntropyPool::new();
        let snapshot = pool.snapshot();
        assert_ne!(snapshot, pool.state);
    }

    #[test]
    fn test_snapshots_are_unique() {
        let mut pool = EntropyPool::new();
        assert_ne!(pool.snapshot(), pool.snapshot());
    }
}
