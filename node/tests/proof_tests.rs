// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
mod common;

use common::credit_record;
use ethos_chain::proof::{ChainProof, ProofCheck};
use ethos_node::proof::{read_proof, write_proof};
use ethos_node::{ChainConfig, ChainStore, FileStore, ManualClock, MemoryStore, Sequencer};
use tempfile::tempdir;

#[test]
fn test_proof_survives_extension() {
    let seq = Sequencer::open(MemoryStore::new(), ManualClock::new(0), &ChainConfig::default()).unwrap();
    for i in 0..4 {
        seq.append(&credit_record(i)).unwrap();
    }
    let proof = seq.proof().unwrap();
    assert_eq!(proof.length, 4);
    assert_eq!(proof.head_sequence, Some(3));
    assert_eq!(proof.head_digest, seq.state().tip);

    seq.append(&credit_record(4)).unwrap();
    assert_eq!(seq.verify_against(&proof).unwrap(), ProofCheck::Consistent);
    assert_eq!(seq.verify_against(&ChainProof::genesis()).unwrap(), ProofCheck::Consistent);
}

#[test]
fn test_truncation_detected_against_saved_proof() {
    let dir = tempdir().unwrap();
    let proof_path = dir.path().join("head.proof.json");

    let seq = Sequencer::open(MemoryStore::new(), ManualClock::new(0), &ChainConfig::default()).unwrap();
    for i in 0..6 {
        seq.append(&credit_record(i)).unwrap();
    }
    write_proof(&proof_path, &seq.proof().unwrap()).unwrap();

    // Someone drops the last two links. What remains still verifies.
    let mut links = seq.store().read_all().unwrap();
    links.truncate(4);
    let truncated = Sequencer::open(MemoryStore::from_links(links), ManualClock::new(0), &ChainConfig::default()).unwrap();
    assert!(truncated.verify().unwrap().valid());

    let proof = read_proof(&proof_path).unwrap();
    assert_eq!(
        truncated.verify_against(&proof).unwrap(),
        ProofCheck::Truncated { expected: 6, found: 4 }
    );
}

#[test]
fn test_rewritten_history_detected() {
    let cfg = ChainConfig::default();
    let original = Sequencer::open(MemoryStore::new(), ManualClock::new(0), &cfg).unwrap();
    let forged = Sequencer::open(MemoryStore::new(), ManualClock::new(0), &cfg).unwrap();
    for i in 0..3 {
        original.append(&credit_record(i)).unwrap();
        forged.append(&credit_record(i + 100)).unwrap();
    }

    let proof = original.proof().unwrap();
    assert_eq!(
        forged.verify_against(&proof).unwrap(),
        ProofCheck::HeadMismatch { sequence: 2 }
    );
}

#[test]
fn test_proof_matches_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chain.log");
    let cfg = ChainConfig::default();

    let proof = {
        let seq = Sequencer::open(FileStore::open(&path).unwrap(), ManualClock::new(0), &cfg).unwrap();
        for i in 0..3 {
            seq.append(&credit_record(i)).unwrap();
        }
        seq.proof().unwrap()
    };

    let seq = Sequencer::open(FileStore::open(&path).unwrap(), ManualClock::new(0), &cfg).unwrap();
    assert!(seq.proof().unwrap().matches(&proof));
}
