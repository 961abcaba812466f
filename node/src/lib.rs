// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod clock;
pub mod store;
pub mod sequencer;
pub mod recovery;
pub mod proof;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ChainConfig;
pub use errors::{NodeError, NodeResult};
pub use sequencer::{ChainState, Sequencer};
pub use store::{ChainStore, FileStore, MemoryStore, StoreError};
