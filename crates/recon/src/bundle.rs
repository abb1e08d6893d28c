use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::artifact::TrainedModel;
use crate::classifier::Classifier;
use crate::encoding::{CategoricalEncoding, KNOWN_CATEGORICAL};
use crate::error::ReconError;
use crate::schema::Schema;

/// Load-once handle over the classifier and its encoders.
///
/// Built by an explicit load step and passed by reference to every
/// prediction; never mutated afterwards.
pub struct ModelBundle {
    classifier: Box<dyn Classifier>,
    encodings: CategoricalEncoding,
    imputation: HashMap<String, f64>,
    meta: BundleMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleMeta {
    pub model_kind: String,
    pub feature_count: usize,
    pub schema_fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoders_digest: Option<String>,
}

impl ModelBundle {
    /// Wrap an arbitrary classifier.
    pub fn new(classifier: Box<dyn Classifier>, encodings: CategoricalEncoding) -> Self {
        let meta = BundleMeta {
            model_kind: classifier.kind().to_string(),
            feature_count: classifier.schema().len(),
            schema_fingerprint: classifier.schema().fingerprint(),
            model_digest: None,
            encoders_digest: None,
        };
        let bundle = Self { classifier, encodings, imputation: HashMap::new(), meta };
        bundle.warn_unencoded();
        bundle
    }

    pub fn from_json(model_json: &str, encoders_json: &str) -> Result<Self, ReconError> {
        let model = TrainedModel::from_json(model_json)?;
        let encodings = CategoricalEncoding::from_json(encoders_json)?;
        let imputation = model.imputation().clone();

        let mut bundle = Self::new(Box::new(model), encodings);
        bundle.imputation = imputation;
        bundle.meta.model_digest = Some(digest(model_json.as_bytes()));
        bundle.meta.encoders_digest = Some(digest(encoders_json.as_bytes()));
        Ok(bundle)
    }

    /// Read both artifacts from disk. Any failure is a `ModelLoad` error.
    pub fn load(model_path: &Path, encoders_path: &Path) -> Result<Self, ReconError> {
        let model_json = read_artifact(model_path)?;
        let encoders_json = read_artifact(encoders_path)?;
        let bundle = Self::from_json(&model_json, &encoders_json)?;
        log::info!(
            "loaded {} model with {} features from {}",
            bundle.meta.model_kind,
            bundle.meta.feature_count,
            model_path.display()
        );
        Ok(bundle)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn schema(&self) -> &Schema {
        self.classifier.schema()
    }

    pub fn encodings(&self) -> &CategoricalEncoding {
        &self.encodings
    }

    /// Imputation values shipped with the model artifact (empty for injected classifiers).
    pub fn imputation(&self) -> &HashMap<String, f64> {
        &self.imputation
    }

    pub fn meta(&self) -> &BundleMeta {
        &self.meta
    }

    fn warn_unencoded(&self) {
        for column in KNOWN_CATEGORICAL {
            if self.schema().contains(column) && !self.encodings.contains(column) {
                log::warn!("categorical column '{column}' is in the model schema but has no encoder");
            }
        }
    }
}

fn read_artifact(path: &Path) -> Result<String, ReconError> {
    std::fs::read_to_string(path)
        .map_err(|e| ReconError::ModelLoad(format!("cannot read {}: {e}", path.display())))
}

fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
