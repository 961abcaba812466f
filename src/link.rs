// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain links.
//!
//! A link binds one canonical record to its position in the chain and to
//! everything before it:
//!
//! ```text
//! self_digest = BLAKE3( domain
//!                     ‖ len ‖ sequence      (u64 LE)
//!                     ‖ len ‖ timestamp_ms  (u64 LE)
//!                     ‖ len ‖ previous_digest
//!                     ‖ len ‖ record_bytes )
//! ```
//!
//! # Invariants
//! - Links are immutable once sealed
//! - Building is pure: sequence and previous digest come from the caller

use serde::{Deserialize, Serialize};

use crate::canonical::{canonicalize, decode, CanonicalBytes};
use crate::config::LINK_DOMAIN;
use crate::error::KernelResult;
use crate::hash::FieldHasher;
use crate::types::digest::Digest;
use crate::types::record::PredictionRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub sequence: u64,
    /// Commit time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub previous_digest: Digest,
    pub record_bytes: CanonicalBytes,
    pub self_digest: Digest,
}

/// Digest of a link's stated fields.
pub fn link_digest(
    sequence: u64,
    timestamp_ms: u64,
    previous_digest: &Digest,
    record_bytes: &[u8],
) -> Digest {
    FieldHasher::new(LINK_DOMAIN)
        .field(&sequence.to_le_bytes())
        .field(&timestamp_ms.to_le_bytes())
        .field(previous_digest.as_bytes())
        .field(record_bytes)
        .finish()
}

impl ChainLink {
    /// Canonicalize `record` and seal it into a link.
    pub fn build(
        sequence: u64,
        timestamp_ms: u64,
        previous_digest: Digest,
        record: &PredictionRecord,
    ) -> KernelResult<Self> {
        let record_bytes = canonicalize(record)?;
        Ok(Self::seal(sequence, timestamp_ms, previous_digest, record_bytes))
    }

    /// Seal already-canonical bytes into a link.
    pub fn seal(
        sequence: u64,
        timestamp_ms: u64,
        previous_digest: Digest,
        record_bytes: CanonicalBytes,
    ) -> Self {
        let self_digest = link_digest(sequence, timestamp_ms, &previous_digest, record_bytes.as_bytes());
        Self {
            sequence,
            timestamp_ms,
            previous_digest,
            record_bytes,
            self_digest,
        }
    }

    /// Digest recomputed from the stated fields, ignoring `self_digest`.
    pub fn recompute_digest(&self) -> Digest {
        link_digest(
            self.sequence,
            self.timestamp_ms,
            &self.previous_digest,
            self.record_bytes.as_bytes(),
        )
    }

    /// Decode the record carried by this link.
    pub fn record(&self) -> KernelResult<PredictionRecord> {
        decode(self.record_bytes.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::PredictionOutput;

    fn record() -> PredictionRecord {
        PredictionRecord::new("m", "v1", "r1", 10, PredictionOutput::Class(0)).with_group("A")
    }

    #[test]
    fn test_build_seals_digest() {
        let link = ChainLink::build(0, 1000, Digest::GENESIS, &record()).unwrap();
        assert_eq!(link.self_digest, link.recompute_digest());
        assert_eq!(link.record().unwrap(), record());
    }

    #[test]
    fn test_digest_binds_every_field() {
        let base = ChainLink::build(3, 1000, Digest([7u8; 32]), &record()).unwrap();
        let seq = ChainLink::build(4, 1000, Digest([7u8; 32]), &record()).unwrap();
        let ts = ChainLink::build(3, 1001, Digest([7u8; 32]), &record()).unwrap();
        let prev = ChainLink::build(3, 1000, Digest([8u8; 32]), &record()).unwrap();
        let body = ChainLink::build(3, 1000, Digest([7u8; 32]), &record().with_group("B")).unwrap();

        for other in [&seq, &ts, &prev, &body] {
            assert_ne!(base.self_digest, other.self_digest);
        }
    }

    #[test]
    fn test_build_rejects_malformed_record() {
        let mut r = record();
        r.model_id.clear();
        assert!(ChainLink::build(0, 0, Digest::GENESIS, &r).is_err());
    }
}
