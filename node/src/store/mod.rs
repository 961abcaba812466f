// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Store Adapter
//!
//! The narrow interface the sequencer and verifier use to reach durable
//! storage. Implementations own their own synchronization: every method
//! takes `&self`, so reads never wait on the sequencer's commit lock.
//!
//! # Contract
//! - `append_link` is atomic: a link is fully visible to later reads or not at all
//! - `append_link` returns `Ok` only once the link is durable
//! - `read_all` returns links in append order

use ethos_chain::link::ChainLink;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod file;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid header")]
    InvalidHeader,

    #[error("Chain log corrupted at offset {offset}")]
    Corrupted { offset: u64 },

    #[error("Storage operation timed out")]
    Timeout,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait ChainStore: Send + Sync {
    /// Last persisted link, or `None` for an empty chain.
    fn read_tip(&self) -> Result<Option<ChainLink>>;

    /// Durably persist one link.
    fn append_link(&self, link: &ChainLink) -> Result<()>;

    /// Every persisted link, in order.
    fn read_all(&self) -> Result<Vec<ChainLink>>;
}

impl<T: ChainStore + ?Sized> ChainStore for Box<T> {
    fn read_tip(&self) -> Result<Option<ChainLink>> {
        (**self).read_tip()
    }

    fn append_link(&self, link: &ChainLink) -> Result<()> {
        (**self).append_link(link)
    }

    fn read_all(&self) -> Result<Vec<ChainLink>> {
        (**self).read_all()
    }
}

impl<T: ChainStore + ?Sized> ChainStore for Arc<T> {
    fn read_tip(&self) -> Result<Option<ChainLink>> {
        (**self).read_tip()
    }

    fn append_link(&self, link: &ChainLink) -> Result<()> {
        (**self).append_link(link)
    }

    fn read_all(&self) -> Result<Vec<ChainLink>> {
        (**self).read_all()
    }
}
