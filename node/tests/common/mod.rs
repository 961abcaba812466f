// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![allow(dead_code)]

use ethos_chain::link::ChainLink;
use ethos_chain::types::record::{FeatureValue, PredictionOutput, PredictionRecord};
use ethos_node::store::{ChainStore, MemoryStore, Result, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn credit_record(i: u64) -> PredictionRecord {
    PredictionRecord::new(
        "CreditScoreV1",
        "1.0.0",
        format!("req-{}", i),
        1_700_000_000_000 + i,
        PredictionOutput::Class((i % 2) as i64),
    )
    .with_feature("age", FeatureValue::Int(25 + (i % 40) as i64))
    .with_feature("income", FeatureValue::Int(40_000 + i as i64 * 100))
    .with_metric("demographic_parity", 0.91)
    .with_group(if i % 3 == 0 { "B" } else { "A" })
}

/// How the next injected failure looks.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    Timeout,
    Unavailable,
}

/// Memory store that fails a configurable number of upcoming appends.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_next: AtomicUsize,
    attempts: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn fault(&self) -> Option<Fault> {
        let armed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()?;
        Some(if armed % 2 == 0 { Fault::Unavailable } else { Fault::Timeout })
    }
}

impl ChainStore for FaultyStore {
    fn read_tip(&self) -> Result<Option<ChainLink>> {
        self.inner.read_tip()
    }

    fn append_link(&self, link: &ChainLink) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.fault() {
            Some(Fault::Timeout) => Err(StoreError::Timeout),
            Some(Fault::Unavailable) => Err(StoreError::Unavailable("injected".to_string())),
            None => self.inner.append_link(link),
        }
    }

    fn read_all(&self) -> Result<Vec<ChainLink>> {
        self.inner.read_all()
    }
}
