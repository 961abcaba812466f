// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical BLAKE3 Hashing
//!
//! **BLAKE3 = the chain's only hash primitive.** Record digests, link
//! digests and proofs all go through this module.
//!
//! # Guarantee
//! Same bytes → same digest (x86 = ARM = RISC-V = WASM). No state is shared
//! between calls, so any number of threads may hash concurrently.

use crate::types::digest::Digest;

/// Compute the BLAKE3 digest of a byte slice.
pub fn hash(data: &[u8]) -> Digest {
    Digest(*blake3::hash(data).as_bytes())
}

/// Streaming hasher over length-prefixed fields.
///
/// Every field is absorbed as `u64 LE length ‖ bytes`, after a one-off
/// domain tag. Moving bytes from one field into its neighbour changes the
/// prefixes and therefore the digest.
pub struct FieldHasher {
    inner: blake3::Hasher,
}

impl FieldHasher {
    pub fn new(domain: &[u8]) -> Self {
        let mut inner = blake3::Hasher::new();
        inner.update(&(domain.len() as u64).to_le_bytes());
        inner.update(domain);
        Self { inner }
    }

    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(&(bytes.len() as u64).to_le_bytes());
        self.inner.update(bytes);
        self
    }

    pub fn finish(&self) -> Digest {
        Digest(*self.inner.finalize().as_bytes())
    }
}
