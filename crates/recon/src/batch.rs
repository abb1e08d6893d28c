use serde::Serialize;

use crate::bundle::ModelBundle;
use crate::filler::FillPolicy;
use crate::model::{InputRecord, PredictionResult};
use crate::predict::predict_record;

/// One successful row, by its zero-based position in the input.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub index: usize,
    pub prediction: PredictionResult,
}

/// One skipped row and why.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub target_count: usize,
    pub non_target_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    pub rows: Vec<BatchRow>,
    pub failures: Vec<BatchFailure>,
}

/// Predict every record in order. A failed row is recorded and skipped; the
/// batch always runs to the end.
pub fn run_batch<'a, I>(bundle: &ModelBundle, records: I, filler: &mut dyn FillPolicy) -> BatchOutcome
where
    I: IntoIterator<Item = &'a InputRecord>,
{
    let mut rows = Vec::new();
    let mut failures = Vec::new();
    let mut total_rows = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        total_rows += 1;
        match predict_record(bundle, record, filler) {
            Ok(prediction) => rows.push(BatchRow { index, prediction }),
            Err(e) => {
                log::warn!("row {}: {e}", index + 1);
                failures.push(BatchFailure {
                    index,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    let summary = summarize(total_rows, &rows, failures.len());
    log::info!(
        "batch: {} rows, {} predicted, {} failed",
        summary.total_rows,
        summary.succeeded,
        summary.failed
    );
    BatchOutcome { summary, rows, failures }
}

fn summarize(total_rows: usize, rows: &[BatchRow], failed: usize) -> BatchSummary {
    let target_count = rows.iter().filter(|r| r.prediction.label.is_target()).count();
    let avg_confidence = if rows.is_empty() {
        None
    } else {
        Some(rows.iter().map(|r| r.prediction.confidence()).sum::<f64>() / rows.len() as f64)
    };

    BatchSummary {
        total_rows,
        succeeded: rows.len(),
        failed,
        target_count,
        non_target_count: rows.len() - target_count,
        avg_confidence,
    }
}
