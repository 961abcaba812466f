// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Sequencer - The Commit Wall
//!
//! Serializes concurrent appends into one total order:
//! 1. Canonicalize the record (outside the lock)
//! 2. Acquire the tip
//! 3. Seal the link against tip + sequence
//! 4. Persist through the store (fsync)
//! 5. Advance the tip
//!
//! If step 4 fails → roll back, tip unchanged
//!
//! # Invariants
//! - At most one commit critical section at a time
//! - Every committed link references the link committed just before it
//! - `append` returns only after the store confirms durability
//! - A failed append leaves no gap in the sequence

use ethos_chain::canonical::canonicalize;
use ethos_chain::link::ChainLink;
use ethos_chain::proof::{verify_against_proof, ChainProof, ProofCheck};
use ethos_chain::types::digest::Digest;
use ethos_chain::types::record::PredictionRecord;
use ethos_chain::verify::{verify, VerificationReport};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::clock::Clock;
use crate::config::ChainConfig;
use crate::errors::{NodeError, NodeResult};
use crate::store::ChainStore;
use crate::telemetry;

/// Cached head of the chain. The store holds the truth; this is rebuilt
/// from it on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainState {
    /// Digest of the last committed link, or genesis.
    pub tip: Digest,
    /// Sequence the next link will get.
    pub next_sequence: u64,
}

impl ChainState {
    pub fn genesis() -> Self {
        Self {
            tip: Digest::GENESIS,
            next_sequence: ethos_chain::config::GENESIS_SEQUENCE,
        }
    }

    pub fn from_tip(tip: Option<&ChainLink>) -> NodeResult<Self> {
        match tip {
            Some(link) => Ok(Self {
                tip: link.self_digest,
                next_sequence: link.sequence.checked_add(1).ok_or(NodeError::SequenceExhausted)?,
            }),
            None => Ok(Self::genesis()),
        }
    }

    /// Number of committed links.
    pub fn length(&self) -> u64 {
        self.next_sequence - ethos_chain::config::GENESIS_SEQUENCE
    }
}

/// Phases of a single append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPhase {
    Idle,
    AcquiredTip,
    Built,
    Persisting,
    Committed,
    RolledBack,
}

impl fmt::Display for AppendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppendPhase::Idle => "idle",
            AppendPhase::AcquiredTip => "acquired-tip",
            AppendPhase::Built => "built",
            AppendPhase::Persisting => "persisting",
            AppendPhase::Committed => "committed",
            AppendPhase::RolledBack => "rolled-back",
        };
        f.write_str(s)
    }
}

fn enter(phase: AppendPhase, sequence: u64) {
    tracing::debug!(%phase, sequence, "append phase");
}

pub struct Sequencer<S, C> {
    store: S,
    clock: C,
    state: Mutex<ChainState>,
}

impl<S: ChainStore, C: Clock> Sequencer<S, C> {
    /// Take ownership of a store and rebuild chain state from its tip.
    ///
    /// With `verify_on_open`, the whole stored chain is verified first and a
    /// broken chain is refused.
    pub fn open(store: S, clock: C, config: &ChainConfig) -> NodeResult<Self> {
        if config.verify_on_open {
            let links = store.read_all()?;
            let report = verify(&links);
            if !report.valid() {
                tracing::error!("Refusing to open broken chain: {}", report);
                metrics::counter!(telemetry::VERIFICATION_FAILURES, 1);
                return Err(NodeError::CorruptChain(report));
            }
            metrics::counter!(telemetry::VERIFICATIONS, 1);
        }

        let state = ChainState::from_tip(store.read_tip()?.as_ref())?;
        tracing::info!(
            "Chain opened: {} links, tip {}",
            state.length(),
            state.tip
        );
        metrics::gauge!(telemetry::CHAIN_LENGTH, state.length() as f64);

        Ok(Self {
            store,
            clock,
            state: Mutex::new(state),
        })
    }

    /// Append one record (the ONLY way to extend the chain)
    ///
    /// Returns the committed link once it is durable. On a storage failure
    /// returns `AppendFailed` and the chain is exactly as before. Never
    /// retries.
    pub fn append(&self, record: &PredictionRecord) -> NodeResult<ChainLink> {
        let start = Instant::now();
        tracing::debug!(phase = %AppendPhase::Idle, "append phase");

        // Pure; runs before taking the lock to keep the critical section short.
        let record_bytes = canonicalize(record)?;

        let mut state = self.lock_state();
        let sequence = state.next_sequence;
        enter(AppendPhase::AcquiredTip, sequence);
        let next_sequence = sequence.checked_add(1).ok_or(NodeError::SequenceExhausted)?;

        let link = ChainLink::seal(sequence, self.clock.now_ms(), state.tip, record_bytes);
        enter(AppendPhase::Built, sequence);

        enter(AppendPhase::Persisting, sequence);
        match self.store.append_link(&link) {
            Ok(()) => {
                *state = ChainState {
                    tip: link.self_digest,
                    next_sequence,
                };
                drop(state);
                enter(AppendPhase::Committed, sequence);

                tracing::debug!("Link committed: seq={} digest={}", sequence, link.self_digest);
                metrics::counter!(telemetry::LINKS_COMMITTED, 1);
                metrics::gauge!(telemetry::CHAIN_LENGTH, next_sequence as f64);
                metrics::histogram!(telemetry::APPEND_DURATION, start.elapsed().as_secs_f64());
                Ok(link)
            }
            Err(source) => {
                drop(state);
                enter(AppendPhase::RolledBack, sequence);

                tracing::warn!("Append of seq={} failed: {}. Rolling back.", sequence, source);
                metrics::counter!(telemetry::APPEND_FAILURES, 1);
                Err(NodeError::AppendFailed { sequence, source })
            }
        }
    }

    /// Current chain state.
    pub fn state(&self) -> ChainState {
        *self.lock_state()
    }

    /// Verify the links visible in the store right now.
    ///
    /// Runs without the commit lock; links appended after the read began are
    /// not covered.
    pub fn verify(&self) -> NodeResult<VerificationReport> {
        let links = self.store.read_all()?;
        let report = verify(&links);
        metrics::counter!(telemetry::VERIFICATIONS, 1);
        if !report.valid() {
            metrics::counter!(telemetry::VERIFICATION_FAILURES, 1);
            tracing::error!("Chain verification failed: {}", report);
        }
        Ok(report)
    }

    /// Proof of the links visible in the store right now.
    pub fn proof(&self) -> NodeResult<ChainProof> {
        Ok(ChainProof::from_links(&self.store.read_all()?))
    }

    /// Verify the stored chain and check it extends `proof`.
    pub fn verify_against(&self, proof: &ChainProof) -> NodeResult<ProofCheck> {
        let links = self.store.read_all()?;
        let check = verify_against_proof(&links, proof);
        metrics::counter!(telemetry::VERIFICATIONS, 1);
        if check != ProofCheck::Consistent {
            metrics::counter!(telemetry::VERIFICATION_FAILURES, 1);
            tracing::error!("Chain does not match proof: {:?}", check);
        }
        Ok(check)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock_state(&self) -> MutexGuard<'_, ChainState> {
        // State is written only after a successful persist, so a poisoned
        // lock still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
