// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Protocol constants.
//!
//! Every value here is part of the wire/hash format. Changing any of them
//! produces chains that older verifiers reject.

/// Magic prefix of a canonical prediction record.
pub const CANONICAL_MAGIC: &[u8; 4] = b"EGPR";

/// Version of the canonical record encoding.
pub const CANONICAL_VERSION: u32 = 1;

/// Version of the link digest scheme, reported in proofs.
pub const CHAIN_VERSION: u32 = 1;

/// Domain separator absorbed before every link digest.
pub const LINK_DOMAIN: &[u8] = b"ethos-chain/link/v1";

/// Sequence number of the first link.
pub const GENESIS_SEQUENCE: u64 = 0;

/// `previous_digest` of the first link.
pub const GENESIS_DIGEST: [u8; 32] = [0u8; 32];

/// Maximum byte length of any single string field.
pub const MAX_FIELD_LEN: usize = 4096;

/// Maximum number of features or metrics in one record.
pub const MAX_ENTRIES: usize = 65536;
