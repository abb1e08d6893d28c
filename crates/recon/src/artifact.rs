//! JSON model artifact: the exported schema, imputation values and estimator.
//!
//! Tree arrays follow the scikit-learn `tree_` layout: node `i` is a leaf when
//! `children_left[i] == -1`, otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left. `value[i]` holds per-class sample
//! counts (or fractions) for the node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::{check_probabilities, check_schema, Classifier};
use crate::error::ReconError;
use crate::model::FeatureVector;
use crate::schema::Schema;

const TREE_LEAF: i64 = -1;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub imputation: HashMap<String, f64>,
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    RandomForest { trees: Vec<DecisionTree> },
    Logistic { coef: Vec<f64>, intercept: f64 },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree arrays differ in length (expected {n} nodes)"));
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(format!("node {i}: exactly one child is a leaf marker"));
                }
                let total = self.value[i][0] + self.value[i][1];
                if total.is_nan() || total <= 0.0 || self.value[i].iter().any(|v| *v < 0.0) {
                    return Err(format!("leaf {i}: class values must be non-negative with a positive sum"));
                }
                continue;
            }
            // Children always follow their parent, which rules out cycles
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i}: child index {child} out of range"));
                }
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {i}: feature index {f} out of range (0..{n_features})"));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!("node {i}: non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `x` lands in.
    fn leaf_proba(&self, x: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != TREE_LEAF {
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [a, b] = self.value[node];
        let total = a + b;
        [a / total, b / total]
    }
}

/// A loaded, validated artifact. Immutable.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    schema: Schema,
    estimator: Estimator,
    imputation: HashMap<String, f64>,
}

impl TrainedModel {
    pub fn from_json(json: &str) -> Result<Self, ReconError> {
        let artifact: ModelArtifact =
            serde_json::from_str(json).map_err(|e| ReconError::ModelLoad(format!("model: {e}")))?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ReconError> {
        let schema = Schema::new(artifact.feature_names)
            .map_err(|e| ReconError::ModelLoad(format!("model: {e}")))?;
        let n_features = schema.len();

        match &artifact.estimator {
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ReconError::ModelLoad("model: random forest has no trees".into()));
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|e| ReconError::ModelLoad(format!("model: tree {i}: {e}")))?;
                }
            }
            Estimator::Logistic { coef, intercept } => {
                if coef.len() != n_features {
                    return Err(ReconError::ModelLoad(format!(
                        "model: {} coefficients for {n_features} features",
                        coef.len()
                    )));
                }
                if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
                    return Err(ReconError::ModelLoad("model: non-finite coefficient".into()));
                }
            }
        }

        for (column, value) in &artifact.imputation {
            if !schema.contains(column) {
                return Err(ReconError::ModelLoad(format!(
                    "model: imputation value for unknown feature '{column}'"
                )));
            }
            if !value.is_finite() {
                return Err(ReconError::ModelLoad(format!(
                    "model: non-finite imputation value for '{column}'"
                )));
            }
        }

        Ok(Self {
            schema,
            estimator: artifact.estimator,
            imputation: artifact.imputation,
        })
    }

    /// Training-set fill values shipped with the model.
    pub fn imputation(&self) -> &HashMap<String, f64> {
        &self.imputation
    }
}

impl Classifier for TrainedModel {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn kind(&self) -> &'static str {
        match self.estimator {
            Estimator::RandomForest { .. } => "random_forest",
            Estimator::Logistic { .. } => "logistic",
        }
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ReconError> {
        check_schema(&self.schema, features)?;
        let x = features.values();
        if let Some((name, v)) = features.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ReconError::Prediction(format!("feature '{name}' is not finite ({v})")));
        }

        let proba = match &self.estimator {
            Estimator::RandomForest { trees } => {
                let mut sum = [0.0f64; 2];
                for tree in trees {
                    let p = tree.leaf_proba(x);
                    sum[0] += p[0];
                    sum[1] += p[1];
                }
                let n = trees.len() as f64;
                [sum[0] / n, sum[1] / n]
            }
            Estimator::Logistic { coef, intercept } => {
                let z: f64 = coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>() + intercept;
                let p1 = 1.0 / (1.0 + (-z).exp());
                [1.0 - p1, p1]
            }
        };
        check_probabilities(proba)
    }
}
