//! Step Records
//!
//! Flat field bags holding one wizard page worth of user input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// == Field Value ==
/// A single form value as sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Null, whitespace-only text and empty lists count as not filled in.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// Field name to value for one wizard step.
pub type StepRecord = BTreeMap<String, FieldValue>;

/// Builds a record from `(field, value)` pairs.
pub fn record_of<I, K, V>(pairs: I) -> StepRecord
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Shallow merge: every field in `partial` replaces the one in `record`.
pub fn merge(record: &mut StepRecord, partial: StepRecord) {
    record.extend(partial);
}

/// Trimmed text of a filled-in text field.
pub fn text<'a>(record: &'a StepRecord, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn is_filled(record: &StepRecord, field: &str) -> bool {
    record.get(field).is_some_and(|v| !v.is_blank())
}

/// True only for an explicit boolean `true`.
pub fn is_checked(record: &StepRecord, field: &str) -> bool {
    matches!(record.get(field), Some(FieldValue::Bool(true)))
}
