// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use core::fmt;

/// Why a record could not be canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// A required identifier is empty.
    MissingField(&'static str),
    /// A feature or metric has an empty name.
    EmptyName(&'static str),
    /// A feature name or metric key appears twice.
    DuplicateName(&'static str),
    /// NaN or infinity in a numeric field.
    NonFinite(&'static str),
    /// A string or collection exceeds the protocol limits.
    TooLarge(&'static str),
}

/// Why canonical bytes could not be decoded back into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    BadMagic,
    UnsupportedVersion(u32),
    Truncated { offset: usize },
    UnknownTag { offset: usize, tag: u8 },
    InvalidUtf8 { offset: usize },
    /// Input parses but is not the canonical encoding of what it contains.
    NonCanonical { offset: usize },
    TrailingBytes { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    MalformedRecord(Malformed),
    Decode(DecodeError),
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::MissingField(field) => write!(f, "required field `{}` is empty", field),
            Malformed::EmptyName(field) => write!(f, "entry in `{}` has an empty name", field),
            Malformed::DuplicateName(field) => write!(f, "duplicate name in `{}`", field),
            Malformed::NonFinite(field) => write!(f, "non-finite number in `{}`", field),
            Malformed::TooLarge(field) => write!(f, "`{}` exceeds protocol limits", field),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::BadMagic => write!(f, "bad magic bytes"),
            DecodeError::UnsupportedVersion(v) => write!(f, "unsupported canonical version {}", v),
            DecodeError::Truncated { offset } => write!(f, "truncated at offset {}", offset),
            DecodeError::UnknownTag { offset, tag } => write!(f, "unknown tag {} at offset {}", tag, offset),
            DecodeError::InvalidUtf8 { offset } => write!(f, "invalid utf-8 at offset {}", offset),
            DecodeError::NonCanonical { offset } => write!(f, "non-canonical encoding at offset {}", offset),
            DecodeError::TrailingBytes { offset } => write!(f, "trailing bytes after offset {}", offset),
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::MalformedRecord(m) => write!(f, "malformed record: {}", m),
            KernelError::Decode(d) => write!(f, "decode error: {}", d),
        }
    }
}

impl From<Malformed> for KernelError {
    fn from(m: Malformed) -> Self {
        KernelError::MalformedRecord(m)
    }
}

impl From<DecodeError> for KernelError {
    fn from(d: DecodeError) -> Self {
        KernelError::Decode(d)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelError {}
