// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Record canonicalization.

use alloc::vec::Vec;

use super::{
    CanonicalBytes, FEATURE_BOOL, FEATURE_FLOAT, FEATURE_INT, FEATURE_TEXT, OUTPUT_CLASS,
    OUTPUT_LABEL, OUTPUT_SCORE,
};
use crate::config::{CANONICAL_MAGIC, CANONICAL_VERSION, MAX_ENTRIES, MAX_FIELD_LEN};
use crate::error::{KernelResult, Malformed};
use crate::types::record::{FeatureValue, PredictionOutput, PredictionRecord};

fn write_u8(buf: &mut Vec<u8>, val: u8) {
    buf.push(val);
}

fn write_u32(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

fn write_u64(buf: &mut Vec<u8>, val: u64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

fn write_i64(buf: &mut Vec<u8>, val: i64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

fn write_str(buf: &mut Vec<u8>, field: &'static str, s: &str) -> KernelResult<()> {
    if s.len() > MAX_FIELD_LEN {
        return Err(Malformed::TooLarge(field).into());
    }
    write_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_f64(buf: &mut Vec<u8>, field: &'static str, val: f64) -> KernelResult<()> {
    if !val.is_finite() {
        return Err(Malformed::NonFinite(field).into());
    }
    // -0.0 == 0.0 for record equality, so both must encode the same.
    let val = if val == 0.0 { 0.0 } else { val };
    write_u64(buf, val.to_bits());
    Ok(())
}

fn write_required(buf: &mut Vec<u8>, field: &'static str, s: &str) -> KernelResult<()> {
    if s.is_empty() {
        return Err(Malformed::MissingField(field).into());
    }
    write_str(buf, field, s)
}

fn write_count(buf: &mut Vec<u8>, field: &'static str, n: usize) -> KernelResult<()> {
    if n > MAX_ENTRIES {
        return Err(Malformed::TooLarge(field).into());
    }
    write_u32(buf, n as u32);
    Ok(())
}

fn write_feature(buf: &mut Vec<u8>, value: &FeatureValue) -> KernelResult<()> {
    match value {
        FeatureValue::Int(v) => {
            write_u8(buf, FEATURE_INT);
            write_i64(buf, *v);
        }
        FeatureValue::Float(v) => {
            write_u8(buf, FEATURE_FLOAT);
            write_f64(buf, "features", *v)?;
        }
        FeatureValue::Bool(v) => {
            write_u8(buf, FEATURE_BOOL);
            write_u8(buf, *v as u8);
        }
        FeatureValue::Text(v) => {
            write_u8(buf, FEATURE_TEXT);
            write_str(buf, "features", v)?;
        }
    }
    Ok(())
}

fn write_output(buf: &mut Vec<u8>, output: &PredictionOutput) -> KernelResult<()> {
    match output {
        PredictionOutput::Class(v) => {
            write_u8(buf, OUTPUT_CLASS);
            write_i64(buf, *v);
        }
        PredictionOutput::Label(v) => {
            if v.is_empty() {
                return Err(Malformed::MissingField("output").into());
            }
            write_u8(buf, OUTPUT_LABEL);
            write_str(buf, "output", v)?;
        }
        PredictionOutput::Score(v) => {
            write_u8(buf, OUTPUT_SCORE);
            write_f64(buf, "output", *v)?;
        }
    }
    Ok(())
}

fn check_feature_names(record: &PredictionRecord) -> KernelResult<()> {
    if record.features.iter().any(|f| f.name.is_empty()) {
        return Err(Malformed::EmptyName("features").into());
    }
    let mut names: Vec<&str> = record.features.iter().map(|f| f.name.as_str()).collect();
    names.sort_unstable();
    if names.windows(2).any(|w| w[0] == w[1]) {
        return Err(Malformed::DuplicateName("features").into());
    }
    Ok(())
}

/// Serialize a record into its canonical byte form.
///
/// Features are written in caller order (the feature vector is ordered).
/// Metrics are written sorted by key bytes, so insertion order never shows.
/// Fails with `MalformedRecord` on empty identifiers, empty or repeated
/// names, non-finite numbers, or oversized fields; in that case nothing
/// about the record has been committed anywhere.
pub fn canonicalize(record: &PredictionRecord) -> KernelResult<CanonicalBytes> {
    let mut buf = Vec::with_capacity(128);

    buf.extend_from_slice(CANONICAL_MAGIC);
    write_u32(&mut buf, CANONICAL_VERSION);

    write_required(&mut buf, "model_id", &record.model_id)?;
    write_required(&mut buf, "model_version", &record.model_version)?;
    write_required(&mut buf, "request_id", &record.request_id)?;
    write_u64(&mut buf, record.timestamp_ms);

    write_count(&mut buf, "features", record.features.len())?;
    check_feature_names(record)?;
    for feature in record.features.iter() {
        write_str(&mut buf, "features", &feature.name)?;
        write_feature(&mut buf, &feature.value)?;
    }

    write_output(&mut buf, &record.output)?;

    let metrics = record.metrics.sorted();
    write_count(&mut buf, "metrics", metrics.len())?;
    for (i, (name, value)) in metrics.iter().enumerate() {
        if name.is_empty() {
            return Err(Malformed::EmptyName("metrics").into());
        }
        // Sorted, so duplicates are adjacent.
        if i > 0 && metrics[i - 1].0 == *name {
            return Err(Malformed::DuplicateName("metrics").into());
        }
        write_str(&mut buf, "metrics", name)?;
        write_f64(&mut buf, "metrics", *value)?;
    }

    match &record.sensitive_group {
        Some(group) => {
            write_u8(&mut buf, 1);
            write_str(&mut buf, "sensitive_group", group)?;
        }
        None => write_u8(&mut buf, 0),
    }

    Ok(CanonicalBytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KernelError;
    use crate::types::record::MetricSet;

    fn base() -> PredictionRecord {
        PredictionRecord::new("credit-score", "v1", "req-1", 1_700_000_000_000, PredictionOutput::Class(1))
    }

    #[test]
    fn test_header_layout() {
        let bytes = canonicalize(&base()).unwrap();
        assert_eq!(&bytes.as_bytes()[0..4], b"EGPR");
        assert_eq!(&bytes.as_bytes()[4..8], &1u32.to_le_bytes());
        // model_id length prefix
        assert_eq!(&bytes.as_bytes()[8..12], &12u32.to_le_bytes());
        assert_eq!(&bytes.as_bytes()[12..24], b"credit-score");
    }

    #[test]
    fn test_missing_identifier_rejected() {
        let mut r = base();
        r.request_id.clear();
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::MissingField("request_id")))
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let r = base().with_metric("psi", f64::NAN);
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::NonFinite("metrics")))
        );

        let r = base().with_feature("income", FeatureValue::Float(f64::INFINITY));
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::NonFinite("features")))
        );

        let mut r = base();
        r.output = PredictionOutput::Score(f64::NEG_INFINITY);
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::NonFinite("output")))
        );
    }

    #[test]
    fn test_duplicate_feature_rejected() {
        let r = base()
            .with_feature("age", FeatureValue::Int(30))
            .with_feature("age", FeatureValue::Int(31));
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::DuplicateName("features")))
        );
    }

    #[test]
    fn test_duplicate_among_many_features_rejected() {
        let mut r = base();
        for i in 0..10_000 {
            r = r.with_feature(format!("f{}", i), FeatureValue::Int(i as i64));
        }
        assert!(canonicalize(&r).is_ok());

        r = r.with_feature("f500", FeatureValue::Bool(true));
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::DuplicateName("features")))
        );
    }

    #[test]
    fn test_empty_feature_name_rejected() {
        let r = base()
            .with_feature("age", FeatureValue::Int(30))
            .with_feature("", FeatureValue::Int(1));
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::EmptyName("features")))
        );
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let mut metrics = MetricSet::new();
        metrics.push_raw("dp".into(), 0.1);
        metrics.push_raw("dp".into(), 0.2);
        let mut r = base();
        r.metrics = metrics;
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::DuplicateName("metrics")))
        );
    }

    #[test]
    fn test_negative_zero_normalized() {
        let a = canonicalize(&base().with_metric("dp", 0.0)).unwrap();
        let b = canonicalize(&base().with_metric("dp", -0.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_oversized_field_rejected() {
        let mut r = base();
        r.model_id = "x".repeat(MAX_FIELD_LEN + 1);
        assert_eq!(
            canonicalize(&r),
            Err(KernelError::MalformedRecord(Malformed::TooLarge("model_id")))
        );
    }
}
