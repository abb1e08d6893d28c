//! `cmi predict` — one record from form fields, `--set` pairs, or a JSON file.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use cmi_recon::{predict_record, BehaviorClass, FieldValue, InputRecord, ModelBundle, ReconError};

use crate::context::Context;
use crate::CliError;

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, default_value_t = 0.856, allow_negative_numbers = true)]
    acc_x: f64,
    #[arg(long, default_value_t = -0.234, allow_negative_numbers = true)]
    acc_y: f64,
    #[arg(long, default_value_t = 9.123, allow_negative_numbers = true)]
    acc_z: f64,
    #[arg(long, default_value_t = 0.987, allow_negative_numbers = true)]
    rot_w: f64,
    #[arg(long, default_value_t = 0.123, allow_negative_numbers = true)]
    rot_x: f64,
    #[arg(long, default_value_t = -0.045, allow_negative_numbers = true)]
    rot_y: f64,
    #[arg(long, default_value_t = 0.067, allow_negative_numbers = true)]
    rot_z: f64,

    #[arg(long, default_value = "Male")]
    sex: String,
    #[arg(long, default_value = "Right")]
    handedness: String,
    #[arg(long, default_value = "Adult")]
    adult_child: String,

    #[arg(long, default_value_t = 28.0)]
    age: f64,
    #[arg(long, default_value_t = 175.0)]
    height_cm: f64,
    #[arg(long, default_value_t = 65.0)]
    shoulder_to_wrist_cm: f64,
    #[arg(long, default_value_t = 28.0)]
    elbow_to_wrist_cm: f64,

    /// Any other model column, e.g. `--set thm_1_mean=0.95`. Repeatable; wins over form fields
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Read the record from a JSON object instead of the form fields
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,

    /// Machine-readable output
    #[arg(long)]
    json: bool,
}

impl PredictArgs {
    fn form_record(&self) -> InputRecord {
        InputRecord::new()
            .with("acc_x", self.acc_x)
            .with("acc_y", self.acc_y)
            .with("acc_z", self.acc_z)
            .with("rot_w", self.rot_w)
            .with("rot_x", self.rot_x)
            .with("rot_y", self.rot_y)
            .with("rot_z", self.rot_z)
            .with("sex", self.sex.as_str())
            .with("handedness", self.handedness.as_str())
            .with("adult_child", self.adult_child.as_str())
            .with("age", self.age)
            .with("height_cm", self.height_cm)
            .with("shoulder_to_wrist_cm", self.shoulder_to_wrist_cm)
            .with("elbow_to_wrist_cm", self.elbow_to_wrist_cm)
    }

    fn build_record(&self) -> Result<InputRecord, CliError> {
        let mut record = match &self.record {
            Some(path) => cmi_io::json::read_record_json(path).map_err(CliError::recon)?,
            None => self.form_record(),
        };
        for pair in &self.set {
            let (name, value) = parse_set(pair)?;
            record.insert(name, value);
        }
        Ok(record)
    }
}

fn parse_set(pair: &str) -> Result<(String, FieldValue), CliError> {
    let (name, raw) = pair
        .split_once('=')
        .ok_or_else(|| CliError::args(format!("--set expects NAME=VALUE, got '{pair}'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::args(format!("--set '{pair}': column name is empty")));
    }
    let value = FieldValue::parse_cell(name, raw)
        .ok_or_else(|| CliError::args(format!("--set '{pair}': value is empty")))?;
    Ok((name.to_string(), value))
}

#[derive(Serialize)]
struct PredictOutput {
    prediction: BehaviorClass,
    label: usize,
    target_probability: f64,
    non_target_probability: f64,
    confidence: f64,
    fill_strategy: String,
    filled_columns: Vec<String>,
}

pub fn cmd_predict(ctx: &Context, args: PredictArgs) -> Result<(), CliError> {
    let record = args.build_record()?;
    let bundle = ctx.load_bundle()?;
    let mut filler = ctx.fill_policy(&bundle);

    let result = predict_record(&bundle, &record, filler.as_mut())
        .map_err(|e| explain(e, &bundle))?;

    let filled: Vec<String> = bundle
        .schema()
        .names()
        .iter()
        .filter(|name| !record.contains(name))
        .cloned()
        .collect();
    let ignored = record.iter().filter(|(name, _)| !bundle.schema().contains(name)).count();

    if args.json {
        let out = PredictOutput {
            prediction: result.label,
            label: result.label.index(),
            target_probability: result.target_probability(),
            non_target_probability: result.non_target_probability(),
            confidence: result.confidence(),
            fill_strategy: filler.name().to_string(),
            filled_columns: filled,
        };
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let headline = if result.label.is_target() { "TARGET BEHAVIOR" } else { "NON-TARGET BEHAVIOR" };
    println!("Prediction:  {}", headline);
    println!("Confidence:  {:.1}%", result.confidence() * 100.0);
    println!("  target:      {:.4}", result.target_probability());
    println!("  non-target:  {:.4}", result.non_target_probability());

    if !filled.is_empty() {
        ctx.note(format!(
            "{} of {} model features not supplied, filled ({})",
            filled.len(),
            bundle.schema().len(),
            filler.name()
        ));
    }
    if ignored > 0 {
        ctx.note(format!("{ignored} supplied field(s) are not model features and were ignored"));
    }
    Ok(())
}

/// Attach the known labels to an unseen-label error.
fn explain(err: ReconError, bundle: &ModelBundle) -> CliError {
    let hint = match &err {
        ReconError::Encoding { column, .. } => bundle
            .encodings()
            .get(column)
            .map(|enc| format!("known values for {column}: {}", enc.classes().join(", "))),
        _ => None,
    };
    let cli_err = CliError::recon(err);
    match hint {
        Some(h) => cli_err.with_hint(h),
        None => cli_err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pairs_parse_numbers_and_labels() {
        let (name, value) = parse_set("thm_1_mean=0.95").unwrap();
        assert_eq!(name, "thm_1_mean");
        assert_eq!(value, FieldValue::Number(0.95));

        let (_, value) = parse_set("sex=Female").unwrap();
        assert_eq!(value, FieldValue::Text("Female".into()));
    }

    #[test]
    fn malformed_set_pairs_are_usage_errors() {
        for bad in ["thm_1_mean", "=1.0", "age="] {
            let err = parse_set(bad).unwrap_err();
            assert_eq!(err.code, crate::exit_codes::EXIT_USAGE, "{bad}");
        }
    }
}
