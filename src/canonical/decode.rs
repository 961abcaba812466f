// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical record decoding.
//!
//! Strict: the only accepted input is the exact output of
//! [`canonicalize`](super::canonicalize) for some record. Anything that would
//! re-encode differently (unsorted metrics, negative zero, stray bytes) is
//! rejected, so `canonicalize(decode(b)) == b` whenever decode succeeds.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

use super::{
    FEATURE_BOOL, FEATURE_FLOAT, FEATURE_INT, FEATURE_TEXT, OUTPUT_CLASS, OUTPUT_LABEL,
    OUTPUT_SCORE,
};
use crate::config::{CANONICAL_MAGIC, CANONICAL_VERSION, MAX_ENTRIES, MAX_FIELD_LEN};
use crate::error::{DecodeError, KernelResult};
use crate::types::record::{Feature, FeatureValue, MetricSet, PredictionOutput, PredictionRecord};

fn take<'a>(buf: &'a [u8], offset: &mut usize, n: usize) -> Result<&'a [u8], DecodeError> {
    let end = offset
        .checked_add(n)
        .filter(|end| *end <= buf.len())
        .ok_or(DecodeError::Truncated { offset: *offset })?;
    let out = &buf[*offset..end];
    *offset = end;
    Ok(out)
}

fn read_u8(buf: &[u8], offset: &mut usize) -> Result<u8, DecodeError> {
    Ok(take(buf, offset, 1)?[0])
}

fn read_u32(buf: &[u8], offset: &mut usize) -> Result<u32, DecodeError> {
    Ok(LittleEndian::read_u32(take(buf, offset, 4)?))
}

fn read_u64(buf: &[u8], offset: &mut usize) -> Result<u64, DecodeError> {
    Ok(LittleEndian::read_u64(take(buf, offset, 8)?))
}

fn read_i64(buf: &[u8], offset: &mut usize) -> Result<i64, DecodeError> {
    Ok(LittleEndian::read_i64(take(buf, offset, 8)?))
}

fn read_f64(buf: &[u8], offset: &mut usize) -> Result<f64, DecodeError> {
    let start = *offset;
    let val = f64::from_bits(read_u64(buf, offset)?);
    if !val.is_finite() || (val == 0.0 && val.is_sign_negative()) {
        return Err(DecodeError::NonCanonical { offset: start });
    }
    Ok(val)
}

fn read_str(buf: &[u8], offset: &mut usize) -> Result<String, DecodeError> {
    let start = *offset;
    let len = read_u32(buf, offset)? as usize;
    if len > MAX_FIELD_LEN {
        return Err(DecodeError::NonCanonical { offset: start });
    }
    let bytes = take(buf, offset, len)?;
    core::str::from_utf8(bytes)
        .map(String::from)
        .map_err(|_| DecodeError::InvalidUtf8 { offset: start })
}

fn read_name(buf: &[u8], offset: &mut usize) -> Result<String, DecodeError> {
    let start = *offset;
    let name = read_str(buf, offset)?;
    if name.is_empty() {
        return Err(DecodeError::NonCanonical { offset: start });
    }
    Ok(name)
}

fn read_count(buf: &[u8], offset: &mut usize) -> Result<usize, DecodeError> {
    let start = *offset;
    let n = read_u32(buf, offset)? as usize;
    if n > MAX_ENTRIES {
        return Err(DecodeError::NonCanonical { offset: start });
    }
    Ok(n)
}

fn read_feature(buf: &[u8], offset: &mut usize) -> Result<FeatureValue, DecodeError> {
    let tag_offset = *offset;
    match read_u8(buf, offset)? {
        FEATURE_INT => Ok(FeatureValue::Int(read_i64(buf, offset)?)),
        FEATURE_FLOAT => Ok(FeatureValue::Float(read_f64(buf, offset)?)),
        FEATURE_BOOL => match read_u8(buf, offset)? {
            0 => Ok(FeatureValue::Bool(false)),
            1 => Ok(FeatureValue::Bool(true)),
            _ => Err(DecodeError::NonCanonical { offset: *offset - 1 }),
        },
        FEATURE_TEXT => Ok(FeatureValue::Text(read_str(buf, offset)?)),
        tag => Err(DecodeError::UnknownTag { offset: tag_offset, tag }),
    }
}

fn read_output(buf: &[u8], offset: &mut usize) -> Result<PredictionOutput, DecodeError> {
    let tag_offset = *offset;
    match read_u8(buf, offset)? {
        OUTPUT_CLASS => Ok(PredictionOutput::Class(read_i64(buf, offset)?)),
        OUTPUT_LABEL => {
            let start = *offset;
            let label = read_str(buf, offset)?;
            if label.is_empty() {
                return Err(DecodeError::NonCanonical { offset: start });
            }
            Ok(PredictionOutput::Label(label))
        }
        OUTPUT_SCORE => Ok(PredictionOutput::Score(read_f64(buf, offset)?)),
        tag => Err(DecodeError::UnknownTag { offset: tag_offset, tag }),
    }
}

/// Decode canonical bytes back into the record they were produced from.
pub fn decode(buf: &[u8]) -> KernelResult<PredictionRecord> {
    let mut offset = 0;

    if take(buf, &mut offset, 4).map_err(|_| DecodeError::BadMagic)? != CANONICAL_MAGIC {
        return Err(DecodeError::BadMagic.into());
    }
    let version = read_u32(buf, &mut offset)?;
    if version != CANONICAL_VERSION {
        return Err(DecodeError::UnsupportedVersion(version).into());
    }

    let mut ids = [String::new(), String::new(), String::new()];
    for id in ids.iter_mut() {
        let start = offset;
        *id = read_str(buf, &mut offset)?;
        if id.is_empty() {
            return Err(DecodeError::NonCanonical { offset: start }.into());
        }
    }
    let [model_id, model_version, request_id] = ids;
    let timestamp_ms = read_u64(buf, &mut offset)?;

    let feature_count = read_count(buf, &mut offset)?;
    let mut features: Vec<Feature> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for _ in 0..feature_count {
        let start = offset;
        let name = read_name(buf, &mut offset)?;
        if !seen.insert(name.clone()) {
            return Err(DecodeError::NonCanonical { offset: start }.into());
        }
        let value = read_feature(buf, &mut offset)?;
        features.push(Feature { name, value });
    }

    let output = read_output(buf, &mut offset)?;

    let metric_count = read_count(buf, &mut offset)?;
    let mut metrics = MetricSet::new();
    let mut last: Option<String> = None;
    for _ in 0..metric_count {
        let start = offset;
        let name = read_name(buf, &mut offset)?;
        // Strictly increasing keys: sorted and unique.
        if let Some(prev) = &last {
            if prev.as_bytes() >= name.as_bytes() {
                return Err(DecodeError::NonCanonical { offset: start }.into());
            }
        }
        let value = read_f64(buf, &mut offset)?;
        metrics.push_raw(name.clone(), value);
        last = Some(name);
    }

    let group_offset = offset;
    let sensitive_group = match read_u8(buf, &mut offset)? {
        0 => None,
        1 => Some(read_str(buf, &mut offset)?),
        _ => return Err(DecodeError::NonCanonical { offset: group_offset }.into()),
    };

    if offset != buf.len() {
        return Err(DecodeError::TrailingBytes { offset }.into());
    }

    Ok(PredictionRecord {
        model_id,
        model_version,
        request_id,
        timestamp_ms,
        features,
        output,
        metrics,
        sensitive_group,
    })
}
