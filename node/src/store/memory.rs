// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory store, for tests and embedding.

use ethos_chain::link::ChainLink;
use std::sync::RwLock;

use super::{ChainStore, Result, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    links: RwLock<Vec<ChainLink>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-existing links as-is, without checking them.
    pub fn from_links(links: Vec<ChainLink>) -> Self {
        Self {
            links: RwLock::new(links),
        }
    }

    pub fn len(&self) -> usize {
        self.links.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

impl ChainStore for MemoryStore {
    fn read_tip(&self) -> Result<Option<ChainLink>> {
        let links = self.links.read().map_err(poisoned)?;
        Ok(links.last().cloned())
    }

    fn append_link(&self, link: &ChainLink) -> Result<()> {
        let mut links = self.links.write().map_err(poisoned)?;
        links.push(link.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ChainLink>> {
        let links = self.links.read().map_err(poisoned)?;
        Ok(links.clone())
    }
}
