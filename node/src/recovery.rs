// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Startup Recovery
//!
//! **The stored chain ALWAYS wins.** The in-memory tip is rebuilt from the
//! store on every start.
//!
//! # Protocol
//! 1. Open the store (file store drops a torn tail frame)
//! 2. Verify every stored link (unless disabled)
//! 3. Rebuild chain state from the tip
//!
//! # Fail-closed
//! - Corrupt frame in the middle of the log → refuse
//! - Verification failure → refuse
//! - Header mismatch → refuse

use std::time::Instant;

use crate::clock::SystemClock;
use crate::config::ChainConfig;
use crate::errors::NodeResult;
use crate::sequencer::Sequencer;
use crate::store::ChainStore;
use crate::telemetry;

pub type ConfiguredSequencer = Sequencer<Box<dyn ChainStore>, SystemClock>;

/// Open the chain described by `config`, ready for appends.
pub fn open_chain(config: &ChainConfig) -> NodeResult<ConfiguredSequencer> {
    let start = Instant::now();
    match &config.log_path {
        Some(path) => tracing::info!("Recovering chain from {:?}", path),
        None => tracing::info!("Starting in-memory chain"),
    }

    let store = config.open_store()?;
    let sequencer = Sequencer::open(store, SystemClock, config)?;

    metrics::histogram!(telemetry::RECOVERY_DURATION, start.elapsed().as_secs_f64());
    Ok(sequencer)
}
