// JSON record input and batch report export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::Value;

use cmi_recon::{BatchOutcome, FieldValue, InputRecord, ReconError};

/// Parse one flat JSON object into a record.
///
/// Numbers stay numbers, strings go through [`FieldValue::parse_cell`] so `"0.5"`
/// is numeric, a categorical `"01"` stays text and `""` is missing. `null` means missing. Arrays, objects and
/// booleans are rejected.
pub fn parse_record_json(input: &str) -> Result<InputRecord, ReconError> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| ReconError::InputFormat(format!("record: {e}")))?;
    let Value::Object(map) = value else {
        return Err(ReconError::InputFormat("record must be a JSON object".into()));
    };

    let mut record = InputRecord::new();
    for (name, value) in map {
        match value {
            Value::Null => {}
            Value::Number(n) => {
                let n = n.as_f64().ok_or_else(|| {
                    ReconError::InputFormat(format!("'{name}': number out of range"))
                })?;
                record.insert(name, n);
            }
            Value::String(s) => {
                if let Some(v) = FieldValue::parse_cell(&name, &s) {
                    record.insert(name, v);
                }
            }
            other => {
                return Err(ReconError::InputFormat(format!(
                    "'{name}': expected a number or string, got {}",
                    type_name(&other)
                )));
            }
        }
    }
    Ok(record)
}

pub fn read_record_json(path: &Path) -> Result<InputRecord, ReconError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ReconError::InputFormat(format!("cannot read {}: {e}", path.display())))?;
    parse_record_json(&content)
}

/// Write the full batch outcome (summary, rows, failures) as pretty JSON.
pub fn export_outcome(outcome: &BatchOutcome, path: &Path) -> Result<(), ReconError> {
    let file = File::create(path)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, outcome).map_err(|e| ReconError::Io(e.to_string()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
