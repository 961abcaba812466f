// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use ethos_chain::error::KernelError;
use ethos_chain::verify::VerificationReport;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum NodeError {
    /// The record cannot be canonicalized. Fix the record; never retried.
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] KernelError),

    /// The link was not durably written. Chain state is unchanged.
    #[error("Append of sequence {sequence} failed: {source}")]
    AppendFailed {
        sequence: u64,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The stored chain failed verification on open.
    #[error("Stored chain failed verification: {0}")]
    CorruptChain(VerificationReport),

    #[error("Sequence space exhausted")]
    SequenceExhausted,
}

pub type NodeResult<T> = std::result::Result<T, NodeError>;
