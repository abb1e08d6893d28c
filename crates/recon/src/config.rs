use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::filler::{
    default_families, default_range, ConstantFill, FamilyRanges, FillPolicy, ImputedFill,
    PrefixRange, SeededRangeFill, ValueRange,
};

// ---------------------------------------------------------------------------
// Filler config
// ---------------------------------------------------------------------------

/// How missing schema columns are filled.
///
/// Loaded from a TOML profile or embedded in the user settings:
///
/// ```toml
/// strategy = "random"
/// seed = 42
///
/// [[families]]
/// prefix = "thm_"
/// min = 0.1
/// max = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    pub strategy: FillStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub constant: f64,
    pub families: Vec<PrefixRange>,
    pub default_range: ValueRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Artifact imputation values, else the family midpoint.
    #[default]
    Imputed,
    /// Uniform draw inside the family range.
    Random,
    /// One fixed value for every missing column.
    Constant,
}

impl std::fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imputed => write!(f, "imputed"),
            Self::Random => write!(f, "random"),
            Self::Constant => write!(f, "constant"),
        }
    }
}

impl std::str::FromStr for FillStrategy {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "imputed" => Ok(Self::Imputed),
            "random" => Ok(Self::Random),
            "constant" => Ok(Self::Constant),
            other => Err(ReconError::ConfigValidation(format!(
                "unknown fill strategy \"{other}\" (expected imputed, random or constant)"
            ))),
        }
    }
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            strategy: FillStrategy::Imputed,
            seed: None,
            constant: 0.0,
            families: default_families(),
            default_range: default_range(),
        }
    }
}

impl FillerConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: FillerConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.constant.is_finite() {
            return Err(ReconError::ConfigValidation("constant fill value must be finite".into()));
        }

        // Prefixes must be unique, otherwise the later family is dead
        let mut seen = HashSet::new();
        for family in &self.families {
            if !seen.insert(family.prefix.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate family prefix '{}'",
                    family.prefix
                )));
            }
        }

        self.ranges().validate()
    }

    pub fn ranges(&self) -> FamilyRanges {
        FamilyRanges {
            families: self.families.clone(),
            default: self.default_range,
        }
    }

    /// Instantiate the policy. `imputation` comes from the model artifact.
    pub fn build(&self, imputation: &HashMap<String, f64>) -> Box<dyn FillPolicy> {
        match self.strategy {
            FillStrategy::Imputed => Box::new(ImputedFill::new(imputation.clone(), self.ranges())),
            FillStrategy::Random => match self.seed {
                Some(seed) => Box::new(SeededRangeFill::new(self.ranges(), seed)),
                None => Box::new(SeededRangeFill::from_entropy(self.ranges())),
            },
            FillStrategy::Constant => Box::new(ConstantFill(self.constant)),
        }
    }
}
