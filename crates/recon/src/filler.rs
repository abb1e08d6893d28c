//! Values for schema columns the input record does not supply.
//!
//! The fill policy is injected into [`crate::reconcile`]; nothing here is
//! global. Production uses [`ImputedFill`]; random filling is opt-in and
//! seedable.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub trait FillPolicy {
    /// Value for a schema column missing from the record.
    fn fill(&mut self, column: &str) -> f64;

    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ReconError::ConfigValidation(format!(
                "range bounds must be finite, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(ReconError::ConfigValidation(format!(
                "range min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if !(self.max - self.min).is_finite() {
            return Err(ReconError::ConfigValidation(format!(
                "range [{}, {}] is too wide to sample",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        self.min / 2.0 + self.max / 2.0
    }
}

/// Range used for every column whose name starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixRange {
    pub prefix: String,
    #[serde(flatten)]
    pub range: ValueRange,
}

impl PrefixRange {
    pub fn new(prefix: impl Into<String>, min: f64, max: f64) -> Self {
        Self { prefix: prefix.into(), range: ValueRange::new(min, max) }
    }
}

/// Prefix families checked in order; the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRanges {
    pub families: Vec<PrefixRange>,
    pub default: ValueRange,
}

impl Default for FamilyRanges {
    fn default() -> Self {
        Self {
            families: default_families(),
            default: default_range(),
        }
    }
}

/// Thermopile (`thm_`) and time-of-flight (`tof_`) channel families.
pub fn default_families() -> Vec<PrefixRange> {
    vec![PrefixRange::new("thm_", 0.1, 2.0), PrefixRange::new("tof_", 0.01, 1.0)]
}

pub fn default_range() -> ValueRange {
    ValueRange::new(0.1, 1.0)
}

impl FamilyRanges {
    pub fn range_for(&self, column: &str) -> ValueRange {
        self.families
            .iter()
            .find(|f| column.starts_with(&f.prefix))
            .map(|f| f.range)
            .unwrap_or(self.default)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for family in &self.families {
            if family.prefix.is_empty() {
                return Err(ReconError::ConfigValidation("family prefix must not be empty".into()));
            }
            family.range.validate().map_err(|e| {
                ReconError::ConfigValidation(format!("family '{}': {e}", family.prefix))
            })?;
        }
        self.default.validate()
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Every missing column gets the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantFill(pub f64);

impl FillPolicy for ConstantFill {
    fn fill(&mut self, _column: &str) -> f64 {
        self.0
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

/// Per-column imputation values (training-set means), else the family midpoint.
#[derive(Debug, Clone, Default)]
pub struct ImputedFill {
    values: HashMap<String, f64>,
    ranges: FamilyRanges,
}

impl ImputedFill {
    pub fn new(values: HashMap<String, f64>, ranges: FamilyRanges) -> Self {
        Self { values, ranges }
    }
}

impl FillPolicy for ImputedFill {
    fn fill(&mut self, column: &str) -> f64 {
        match self.values.get(column) {
            Some(v) => *v,
            None => self.ranges.range_for(column).midpoint(),
        }
    }

    fn name(&self) -> &'static str {
        "imputed"
    }
}

/// Uniform draw inside the column's family range.
///
/// Ranges are expected to pass [`FamilyRanges::validate`]. A range that does
/// not is never sampled; its midpoint is used instead.
#[derive(Debug, Clone)]
pub struct SeededRangeFill {
    ranges: FamilyRanges,
    rng: StdRng,
}

impl SeededRangeFill {
    pub fn new(ranges: FamilyRanges, seed: u64) -> Self {
        Self { ranges, rng: StdRng::seed_from_u64(seed) }
    }

    /// Seeded from OS entropy. Predictions on incomplete records will not reproduce.
    pub fn from_entropy(ranges: FamilyRanges) -> Self {
        log::warn!("random filler without a seed: predictions for incomplete records are not reproducible");
        Self { ranges, rng: StdRng::from_entropy() }
    }
}

impl FillPolicy for SeededRangeFill {
    fn fill(&mut self, column: &str) -> f64 {
        let range = self.ranges.range_for(column);
        if !range.is_valid() {
            log::warn!("range [{}, {}] for '{column}' cannot be sampled", range.min, range.max);
            return range.midpoint();
        }
        self.rng.gen_range(range.min..=range.max)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
