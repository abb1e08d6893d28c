use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::FieldValue;

/// Categorical columns the form and training pipeline know about.
pub const KNOWN_CATEGORICAL: [&str; 3] = ["sex", "handedness", "adult_child"];

pub fn is_categorical(column: &str) -> bool {
    KNOWN_CATEGORICAL.contains(&column)
}

/// Maps a fixed set of labels to numeric codes. Code = position in `classes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEncoder")]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
struct RawEncoder {
    classes: Vec<String>,
}

impl TryFrom<RawEncoder> for LabelEncoder {
    type Error = String;

    fn try_from(raw: RawEncoder) -> Result<Self, Self::Error> {
        LabelEncoder::new(raw.classes).map_err(|e| e.to_string())
    }
}

impl LabelEncoder {
    /// Use `classes` in the given order.
    pub fn new<I, S>(classes: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        if classes.is_empty() {
            return Err(ReconError::ModelLoad("label encoder has no classes".into()));
        }
        let mut seen = HashSet::new();
        for c in &classes {
            if !seen.insert(c.as_str()) {
                return Err(ReconError::ModelLoad(format!("label encoder has duplicate class '{c}'")));
            }
        }
        Ok(Self { classes })
    }

    /// Fit on observed labels: sorted, de-duplicated.
    pub fn fit<I, S>(labels: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self::new(classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, label: &str) -> Option<u32> {
        self.classes.iter().position(|c| c == label).map(|i| i as u32)
    }

    pub fn inverse(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }
}

/// Column name -> encoder. Read-only after load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoricalEncoding {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl CategoricalEncoding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, encoder: LabelEncoder) -> Self {
        self.insert(column, encoder);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, encoder: LabelEncoder) {
        self.encoders.insert(column.into(), encoder);
    }

    /// Parse `{"sex": {"classes": ["Female", "Male"]}, ...}`.
    pub fn from_json(json: &str) -> Result<Self, ReconError> {
        serde_json::from_str(json).map_err(|e| ReconError::ModelLoad(format!("encoders: {e}")))
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelEncoder)> {
        self.encoders.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Encode one value of `column`. Unseen labels are an error, never a default.
    pub fn encode(&self, column: &str, value: &FieldValue) -> Result<f64, ReconError> {
        let label = value.as_label();
        let encoder = self.encoders.get(column).ok_or_else(|| ReconError::Encoding {
            column: column.to_string(),
            value: label.clone(),
        })?;
        encoder
            .transform(&label)
            .map(f64::from)
            .ok_or(ReconError::Encoding { column: column.to_string(), value: label })
    }
}
