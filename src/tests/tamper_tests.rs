// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::link::ChainLink;
use crate::tests::fixtures::{build_chain, credit_record};
use crate::canonical::canonicalize;
use crate::verify::{verify, FailureKind};

#[test]
fn test_valid_chain_verifies() {
    let links = build_chain(8);
    let report = verify(&links);
    assert!(report.valid());
    assert_eq!(report.links_checked, 8);
    assert_eq!(report.head, Some(links[7].self_digest));
}

#[test]
fn test_every_record_byte_flip_is_detected() {
    let links = build_chain(3);
    let len = links[1].record_bytes.len();
    for pos in 0..len {
        let mut tampered = links.clone();
        tampered[1].record_bytes.0[pos] ^= 0x01;
        let report = verify(&tampered);
        assert_eq!(report.failure_index(), Some(1), "byte {} not detected", pos);
        assert_eq!(report.failure_kind(), Some(FailureKind::DigestMismatch));
    }
}

#[test]
fn test_self_digest_flip_is_detected() {
    let links = build_chain(3);
    for pos in 0..32 {
        let mut tampered = links.clone();
        tampered[0].self_digest.0[pos] ^= 0x80;
        let report = verify(&tampered);
        assert!(!report.valid());
        assert_eq!(report.failure_index(), Some(0));
        assert_eq!(report.failure_kind(), Some(FailureKind::DigestMismatch));
    }
}

#[test]
fn test_timestamp_and_previous_are_bound() {
    let mut links = build_chain(3);
    links[1].timestamp_ms += 1;
    assert_eq!(verify(&links).failure_kind(), Some(FailureKind::DigestMismatch));

    let mut links = build_chain(3);
    links[2].previous_digest.0[0] ^= 1;
    let report = verify(&links);
    assert_eq!(report.failure_index(), Some(2));
    assert_eq!(report.failure_kind(), Some(FailureKind::DigestMismatch));
}

#[test]
fn test_resealed_forgery_breaks_linkage() {
    let mut links = build_chain(4);
    // Attacker rewrites record 1 and re-seals it with a correct digest.
    let forged = canonicalize(&credit_record(1, 99, 1, true, "B")).unwrap();
    links[1] = ChainLink::seal(links[1].sequence, links[1].timestamp_ms, links[1].previous_digest, forged);

    let report = verify(&links);
    assert_eq!(report.failure_index(), Some(2));
    assert_eq!(report.failure_kind(), Some(FailureKind::LinkageBroken));
    assert_eq!(report.links_checked, 2);
}

#[test]
fn test_deleted_link_is_a_gap() {
    let mut links = build_chain(4);
    links.remove(1);
    let report = verify(&links);
    assert_eq!(report.failure_index(), Some(1));
    assert_eq!(report.failure_kind(), Some(FailureKind::SequenceGap));
}

#[test]
fn test_reordered_links_are_detected() {
    let mut links = build_chain(4);
    links.swap(1, 2);
    let report = verify(&links);
    assert_eq!(report.failure_index(), Some(1));
    assert_eq!(report.failure_kind(), Some(FailureKind::SequenceGap));
}

#[test]
fn test_first_link_must_start_at_genesis() {
    let links = build_chain(4);
    let report = verify(&links[1..]);
    assert_eq!(report.failure_index(), Some(0));
    assert_eq!(report.failure_kind(), Some(FailureKind::SequenceGap));

    let mut links = build_chain(1);
    links[0] = ChainLink::seal(0, links[0].timestamp_ms, crate::Digest([1u8; 32]), links[0].record_bytes.clone());
    let report = verify(&links);
    assert_eq!(report.failure_index(), Some(0));
    assert_eq!(report.failure_kind(), Some(FailureKind::LinkageBroken));
}

#[test]
fn test_earliest_violation_wins() {
    let mut links = build_chain(6);
    links[4].record_bytes.0[10] ^= 1;
    links[2].self_digest.0[0] ^= 1;
    assert_eq!(verify(&links).failure_index(), Some(2));
}

#[test]
fn test_verify_does_not_mutate_input() {
    let links = build_chain(3);
    let before = links.clone();
    let _ = verify(&links);
    assert_eq!(links, before);
}
