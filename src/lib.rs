// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![no_std]

//! ethos-chain: a deterministic, no_std, hash-linked audit chain for ML prediction events.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

pub mod config;
pub mod error;
pub mod types;
pub mod canonical;
pub mod hash;
pub mod link;
pub mod verify;
pub mod proof;

pub use canonical::{canonicalize, CanonicalBytes};
pub use error::{KernelError, KernelResult, Malformed};
pub use hash::hash;
pub use link::ChainLink;
pub use types::digest::Digest;
pub use types::record::{FeatureValue, MetricSet, PredictionOutput, PredictionRecord};
pub use verify::{verify, FailureKind, VerificationFailure, VerificationReport};

#[cfg(test)]
pub mod tests;
