use crate::bundle::ModelBundle;
use crate::error::ReconError;
use crate::filler::FillPolicy;
use crate::model::{InputRecord, PredictionResult};
use crate::reconcile::reconcile;

/// Reconcile one record and classify it.
pub fn predict_record(
    bundle: &ModelBundle,
    record: &InputRecord,
    filler: &mut dyn FillPolicy,
) -> Result<PredictionResult, ReconError> {
    let features = reconcile(record, bundle.schema(), bundle.encodings(), filler)?;
    let classifier = bundle.classifier();
    let label = classifier.predict(&features)?;
    let probabilities = classifier.predict_proba(&features)?;
    Ok(PredictionResult::new(label, probabilities))
}
