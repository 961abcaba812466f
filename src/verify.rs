// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain verification.
//!
//! Walks links in order and checks, for each one:
//! 1. the stored digest matches the digest recomputed from its fields
//! 2. the sequence is genesis (first link) or previous + 1
//! 3. the previous digest is genesis (first link) or the previous link's
//!    recomputed digest
//!
//! The first violation ends the walk. Violations are returned in the
//! report, never as errors.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::config::GENESIS_SEQUENCE;
use crate::link::ChainLink;
use crate::types::digest::Digest;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Stored `self_digest` does not match the link's contents.
    DigestMismatch,
    /// Sequence number does not follow the previous link.
    SequenceGap,
    /// `previous_digest` does not match the previous link.
    LinkageBroken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// Position in the verified slice (not the link's sequence number).
    pub index: usize,
    pub kind: FailureKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Links that passed every check.
    pub links_checked: usize,
    /// Digest of the last link, when the chain is valid and non-empty.
    pub head: Option<Digest>,
    pub failure: Option<VerificationFailure>,
}

impl VerificationReport {
    pub fn valid(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure_index(&self) -> Option<usize> {
        self.failure.map(|f| f.index)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.map(|f| f.kind)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::DigestMismatch => "digest mismatch",
            FailureKind::SequenceGap => "sequence gap",
            FailureKind::LinkageBroken => "linkage broken",
        };
        f.write_str(s)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure {
            None => write!(f, "valid ({} links)", self.links_checked),
            Some(failure) => write!(f, "{} at index {}", failure.kind, failure.index),
        }
    }
}

/// Verify an ordered sequence of links.
pub fn verify(links: &[ChainLink]) -> VerificationReport {
    let mut expected_sequence = Some(GENESIS_SEQUENCE);
    let mut expected_previous = Digest::GENESIS;

    for (index, link) in links.iter().enumerate() {
        let recomputed = link.recompute_digest();

        let kind = if recomputed != link.self_digest {
            Some(FailureKind::DigestMismatch)
        } else if Some(link.sequence) != expected_sequence {
            Some(FailureKind::SequenceGap)
        } else if link.previous_digest != expected_previous {
            Some(FailureKind::LinkageBroken)
        } else {
            None
        };

        if let Some(kind) = kind {
            return VerificationReport {
                links_checked: index,
                head: None,
                failure: Some(VerificationFailure { index, kind }),
            };
        }

        // Nothing may follow u64::MAX.
        expected_sequence = link.sequence.checked_add(1);
        expected_previous = recomputed;
    }

    VerificationReport {
        links_checked: links.len(),
        head: links.last().map(|l| l.self_digest),
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_is_valid() {
        let report = verify(&[]);
        assert!(report.valid());
        assert_eq!(report.links_checked, 0);
        assert_eq!(report.head, None);
        assert_eq!(report.failure_index(), None);
    }

    #[test]
    fn test_report_display() {
        let report = VerificationReport {
            links_checked: 2,
            head: None,
            failure: Some(VerificationFailure { index: 2, kind: FailureKind::LinkageBroken }),
        };
        assert_eq!(format!("{}", report), "linkage broken at index 2");
    }
}
