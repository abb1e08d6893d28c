use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::ReconError;

/// Ordered feature names a classifier was fit on.
///
/// Built once when the model artifact is loaded and shared by handle; cloning
/// is a reference-count bump. Column order is significant.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

#[derive(Debug)]
struct SchemaInner {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new<I, S>(names: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ReconError::InvalidSchema("no feature names".into()));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ReconError::InvalidSchema(format!("blank feature name at position {i}")));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(ReconError::InvalidSchema(format!("duplicate feature name '{name}'")));
            }
        }

        Ok(Self { inner: Arc::new(SchemaInner { names, index }) })
    }

    pub fn names(&self) -> &[String] {
        &self.inner.names
    }

    pub fn len(&self) -> usize {
        self.inner.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.inner.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.index.contains_key(name)
    }

    /// Order-sensitive digest of the feature names (16 hex chars).
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for name in &self.inner.names {
            hasher.update(name.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().as_str()[..16].to_string()
    }

    /// Place `(name, value)` pairs into schema order.
    ///
    /// The pairs must cover every schema column exactly once and nothing else.
    pub fn align<I>(&self, columns: I) -> Result<Vec<f64>, ReconError>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut slots: Vec<Option<f64>> = vec![None; self.len()];
        let mut extra = Vec::new();
        let mut found = 0usize;

        for (name, value) in columns {
            found += 1;
            match self.position(&name) {
                Some(i) if slots[i].is_none() => slots[i] = Some(value),
                // unknown name, or a second copy of a placed column
                _ => extra.push(name),
            }
        }

        let missing: Vec<String> = slots
            .iter()
            .zip(self.names())
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, name)| name.clone())
            .collect();

        if !missing.is_empty() || !extra.is_empty() || found != self.len() {
            return Err(ReconError::SchemaMismatch {
                expected: self.len(),
                found,
                missing,
                extra,
            });
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Names that appear in `other` but not here, and vice versa.
    pub fn diff(&self, other: &Schema) -> (Vec<String>, Vec<String>) {
        let mine: HashSet<&str> = self.names().iter().map(String::as_str).collect();
        let theirs: HashSet<&str> = other.names().iter().map(String::as_str).collect();
        let missing = self.names().iter().filter(|n| !theirs.contains(n.as_str())).cloned().collect();
        let extra = other.names().iter().filter(|n| !mine.contains(n.as_str())).cloned().collect();
        (missing, extra)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.names == other.inner.names
    }
}

impl Eq for Schema {}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.names.serialize(serializer)
    }
}
