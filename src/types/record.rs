// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Prediction records: the logical payload of every chain link.
//!
//! A record is assembled by the caller and handed to the chain by value.
//! Nothing here validates; validation happens once, in the canonicalizer,
//! so that a record read back from JSON and a record built in code are
//! rejected for exactly the same reasons.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use serde::de::{self, MapAccess, Unexpected, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single input feature value.
///
/// Serialized untagged. Integers must fit in `i64`; a larger integer is
/// rejected rather than widened to `Float`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

struct FeatureValueVisitor;

impl<'de> Visitor<'de> for FeatureValueVisitor {
    type Value = FeatureValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bool, an i64 integer, a float or a string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FeatureValue, E> {
        Ok(FeatureValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FeatureValue, E> {
        Ok(FeatureValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FeatureValue, E> {
        i64::try_from(v)
            .map(FeatureValue::Int)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FeatureValue, E> {
        Ok(FeatureValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FeatureValue, E> {
        Ok(FeatureValue::Text(String::from(v)))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FeatureValue, E> {
        Ok(FeatureValue::Text(v))
    }
}

impl<'de> Deserialize<'de> for FeatureValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FeatureValueVisitor)
    }
}

/// A named input feature. Features keep the order the caller gave them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
}

/// Model output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PredictionOutput {
    /// Discrete class index (e.g. 1 = approved, 0 = denied).
    Class(i64),
    Label(String),
    Score(f64),
}

/// Fairness/drift metrics keyed by name.
///
/// Keeps insertion order internally but behaves as a map: inserting an
/// existing key replaces its value, and equality ignores order.
#[derive(Clone, Debug, Default)]
pub struct MetricSet {
    entries: Vec<(String, f64)>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or replace a metric. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            let old = slot.1;
            slot.1 = value;
            return Some(old);
        }
        self.entries.push((name, value));
        None
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries ordered by key bytes.
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self.iter().collect();
        out.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        out
    }

    /// Push without the replace-on-insert check. Used by the decoder and by
    /// deserialization, where duplicates must survive to be rejected later.
    pub(crate) fn push_raw(&mut self, name: String, value: f64) {
        self.entries.push((name, value));
    }
}

impl PartialEq for MetricSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k) == Some(*v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut set = MetricSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in self.entries.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct MetricSetVisitor(PhantomData<MetricSet>);

impl<'de> Visitor<'de> for MetricSetVisitor {
    type Value = MetricSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of metric name to number")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MetricSet, A::Error> {
        let mut set = MetricSet::new();
        while let Some((k, v)) = access.next_entry::<String, f64>()? {
            set.push_raw(k, v);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for MetricSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MetricSetVisitor(PhantomData))
    }
}

/// One prediction event as handed to the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub model_id: String,
    pub model_version: String,
    pub request_id: String,
    /// Prediction time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    #[serde(default)]
    pub features: Vec<Feature>,
    pub output: PredictionOutput,
    #[serde(default)]
    pub metrics: MetricSet,
    /// Fairness cohort the subject belongs to.
    #[serde(default)]
    pub sensitive_group: Option<String>,
}

impl PredictionRecord {
    pub fn new(
        model_id: impl Into<String>,
        model_version: impl Into<String>,
        request_id: impl Into<String>,
        timestamp_ms: u64,
        output: PredictionOutput,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            model_version: model_version.into(),
            request_id: request_id.into(),
            timestamp_ms,
            features: Vec::new(),
            output,
            metrics: MetricSet::new(),
            sensitive_group: None,
        }
    }

    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.features.push(Feature {
            name: name.into(),
            value,
        });
        self
    }

    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.sensitive_group = Some(group.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_insert_replaces() {
        let mut m = MetricSet::new();
        assert_eq!(m.insert("dp", 0.1), None);
        assert_eq!(m.insert("dp", 0.2), Some(0.1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("dp"), Some(0.2));
    }

    #[test]
    fn test_metric_equality_ignores_order() {
        let a: MetricSet = [("psi", 0.3), ("dp", 0.1)].into_iter().collect();
        let b: MetricSet = [("dp", 0.1), ("psi", 0.3)].into_iter().collect();
        assert_eq!(a, b);

        let c: MetricSet = [("dp", 0.1), ("psi", 0.4)].into_iter().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_sorted_uses_byte_order() {
        let m: MetricSet = [("b", 1.0), ("B", 2.0), ("a", 3.0)].into_iter().collect();
        let keys: Vec<&str> = m.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B", "a", "b"]);
    }
}
