// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical record encoding.
//!
//! # Format
//! ```text
//! magic "EGPR" | version u32
//! str model_id | str model_version | str request_id | u64 timestamp_ms
//! u32 feature_count | { str name | tag u8 | value }*   (caller order)
//! tag u8 | output value
//! u32 metric_count  | { str name | f64 }*              (sorted by key bytes)
//! u8 group_present  | [str sensitive_group]
//! ```
//! All integers are little-endian and fixed width. `str` is a u32 byte length
//! followed by UTF-8. `f64` is the IEEE-754 bit pattern as u64, with `-0.0`
//! written as `+0.0`.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

pub mod encode;
pub mod decode;

pub use decode::decode;
pub use encode::canonicalize;

pub(crate) const FEATURE_INT: u8 = 1;
pub(crate) const FEATURE_FLOAT: u8 = 2;
pub(crate) const FEATURE_BOOL: u8 = 3;
pub(crate) const FEATURE_TEXT: u8 = 4;

pub(crate) const OUTPUT_CLASS: u8 = 1;
pub(crate) const OUTPUT_LABEL: u8 = 2;
pub(crate) const OUTPUT_SCORE: u8 = 3;

/// Deterministic byte form of a [`PredictionRecord`](crate::PredictionRecord).
///
/// Only [`canonicalize`] produces guaranteed-canonical values. Bytes read
/// back from storage are wrapped as-is; the verifier hashes whatever is there.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct CanonicalBytes(pub Vec<u8>);

impl CanonicalBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
