//! `cmi-recon` — feature reconciliation and prediction engine.
//!
//! Pure engine crate: receives a loaded [`ModelBundle`] and raw input records,
//! returns ordered feature vectors and predictions. No CLI or file-format
//! dependencies beyond reading the two JSON artifacts.

pub mod artifact;
pub mod batch;
pub mod bundle;
pub mod classifier;
pub mod config;
pub mod encoding;
pub mod error;
pub mod filler;
pub mod model;
pub mod predict;
pub mod reconcile;
pub mod schema;

pub use batch::{run_batch, BatchOutcome};
pub use bundle::ModelBundle;
pub use classifier::Classifier;
pub use config::{FillStrategy, FillerConfig};
pub use encoding::{CategoricalEncoding, LabelEncoder};
pub use error::ReconError;
pub use filler::FillPolicy;
pub use model::{BehaviorClass, FeatureVector, FieldValue, InputRecord, PredictionResult};
pub use predict::predict_record;
pub use reconcile::reconcile;
pub use schema::Schema;
