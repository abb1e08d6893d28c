use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoding::is_categorical;
use crate::error::ReconError;
use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Scalar value of a single input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret a raw cell. Empty cells are absent, numeric text becomes a number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Some(Self::Number(n)),
            Err(_) => Some(Self::Text(trimmed.to_string())),
        }
    }

    /// Like [`FieldValue::parse`], but categorical columns keep the cell text
    /// as written so `"01"` still matches an encoder class `"01"`.
    pub fn parse_cell(column: &str, raw: &str) -> Option<Self> {
        if is_categorical(column) {
            let trimmed = raw.trim();
            return (!trimmed.is_empty()).then(|| Self::Text(trimmed.to_string()));
        }
        Self::parse(raw)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Render as an encoder label. Integral numbers drop the fractional part.
    pub fn as_label(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Self::Number(n) => n.to_string(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// One raw record from the form or a CSV row. Any subset of the schema, extra keys ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for InputRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// A single fully-numeric row in schema order. Built per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: Schema,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema: Schema, values: Vec<f64>) -> Result<Self, ReconError> {
        if values.len() != schema.len() {
            return Err(ReconError::SchemaMismatch {
                expected: schema.len(),
                found: values.len(),
                missing: Vec::new(),
                extra: Vec::new(),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema.names().iter().map(String::as_str).zip(self.values.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorClass {
    NonTarget,
    Target,
}

impl BehaviorClass {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NonTarget),
            1 => Some(Self::Target),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::NonTarget => 0,
            Self::Target => 1,
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Self::Target)
    }
}

impl std::fmt::Display for BehaviorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonTarget => write!(f, "non_target"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Discrete label plus `[p(non_target), p(target)]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: BehaviorClass,
    pub probabilities: [f64; 2],
}

impl PredictionResult {
    pub fn new(label: BehaviorClass, probabilities: [f64; 2]) -> Self {
        Self { label, probabilities }
    }

    pub fn non_target_probability(&self) -> f64 {
        self.probabilities[0]
    }

    pub fn target_probability(&self) -> f64 {
        self.probabilities[1]
    }

    pub fn confidence(&self) -> f64 {
        self.probabilities[0].max(self.probabilities[1])
    }
}
