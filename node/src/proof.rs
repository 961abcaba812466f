// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof Export
//!
//! Proofs are written as JSON so an auditor can keep them outside the
//! system and check a later chain against them.

use ethos_chain::proof::ChainProof;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::store::StoreError;

/// Write a proof atomically (temp file + rename).
pub fn write_proof(path: impl AsRef<Path>, proof: &ChainProof) -> Result<(), StoreError> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");

    let json = serde_json::to_vec_pretty(proof).map_err(|e| StoreError::Serialization(e.to_string()))?;
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    tracing::info!("Proof written to {:?}: {} links, head {}", path, proof.length, proof.head_digest);
    Ok(())
}

pub fn read_proof(path: impl AsRef<Path>) -> Result<ChainProof, StoreError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethos_chain::types::digest::Digest;
    use tempfile::tempdir;

    #[test]
    fn test_proof_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("head.proof.json");
        let proof = ChainProof {
            chain_version: 1,
            length: 12,
            head_sequence: Some(11),
            head_digest: Digest([4u8; 32]),
        };

        write_proof(&path, &proof).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(read_proof(&path).unwrap(), proof);
    }

    #[test]
    fn test_garbage_proof_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(read_proof(&path), Err(StoreError::Serialization(_))));
    }
}
