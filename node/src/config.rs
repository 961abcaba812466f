// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::{ChainStore, FileStore, MemoryStore, StoreError};

pub const ENV_LOG_PATH: &str = "ETHOS_CHAIN_LOG";
pub const ENV_VERIFY_ON_OPEN: &str = "ETHOS_VERIFY_ON_OPEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain log file. `None` keeps the chain in memory only.
    pub log_path: Option<PathBuf>,
    /// Verify every stored link before accepting appends.
    pub verify_on_open: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            verify_on_open: true,
        }
    }
}

impl ChainConfig {
    /// Defaults overridden by `ETHOS_CHAIN_LOG` and `ETHOS_VERIFY_ON_OPEN`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(path) = lookup(ENV_LOG_PATH).filter(|p| !p.is_empty()) {
            cfg.log_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup(ENV_VERIFY_ON_OPEN) {
            cfg.verify_on_open = !matches!(flag.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        cfg
    }

    /// Open the store this config describes.
    pub fn open_store(&self) -> Result<Box<dyn ChainStore>, StoreError> {
        match &self.log_path {
            Some(path) => Ok(Box::new(FileStore::open(path)?)),
            None => Ok(Box::new(MemoryStore::new())),
        }
    }
}
