// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain proofs.
//!
//! Link-by-link verification cannot notice links missing from the end of a
//! chain: a truncated chain is still a valid chain. A proof records the
//! length and head digest at some point in time; checking a later chain
//! against it detects truncation and rewritten history.

use serde::{Deserialize, Serialize};

use crate::config::CHAIN_VERSION;
use crate::link::ChainLink;
use crate::types::digest::Digest;
use crate::verify::{verify, VerificationReport};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainProof {
    /// Link digest scheme version.
    pub chain_version: u32,
    /// Number of links covered.
    pub length: u64,
    /// Sequence of the last covered link (None for an empty chain).
    pub head_sequence: Option<u64>,
    /// Digest of the last covered link (genesis for an empty chain).
    pub head_digest: Digest,
}

/// Outcome of checking a chain against an earlier proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofCheck {
    /// The chain is valid and extends (or equals) the proven prefix.
    Consistent,
    /// The chain is valid but shorter than the proof.
    Truncated { expected: u64, found: u64 },
    /// The chain is valid but the link at the proof's head differs.
    HeadMismatch { sequence: u64 },
    /// The chain itself fails verification.
    Invalid(VerificationReport),
}

impl ChainProof {
    /// Proof of the empty chain.
    pub fn genesis() -> Self {
        Self {
            chain_version: CHAIN_VERSION,
            length: 0,
            head_sequence: None,
            head_digest: Digest::GENESIS,
        }
    }

    /// Proof of `links` as stored. Does not verify them.
    pub fn from_links(links: &[ChainLink]) -> Self {
        match links.last() {
            Some(head) => Self {
                chain_version: CHAIN_VERSION,
                length: links.len() as u64,
                head_sequence: Some(head.sequence),
                head_digest: head.self_digest,
            },
            None => Self::genesis(),
        }
    }

    /// Two proofs describe the same chain.
    pub fn matches(&self, other: &ChainProof) -> bool {
        self.chain_version == other.chain_version
            && self.length == other.length
            && self.head_digest == other.head_digest
    }
}

/// Verify `links` and check they extend the chain described by `proof`.
pub fn verify_against_proof(links: &[ChainLink], proof: &ChainProof) -> ProofCheck {
    let report = verify(links);
    if !report.valid() {
        return ProofCheck::Invalid(report);
    }

    let found = links.len() as u64;
    if found < proof.length {
        return ProofCheck::Truncated {
            expected: proof.length,
            found,
        };
    }

    if proof.length == 0 {
        return ProofCheck::Consistent;
    }

    // proof.length <= links.len(), so the index is in range.
    let anchored = &links[(proof.length - 1) as usize];
    if anchored.self_digest != proof.head_digest {
        return ProofCheck::HeadMismatch {
            sequence: anchored.sequence,
        };
    }

    ProofCheck::Consistent
}
