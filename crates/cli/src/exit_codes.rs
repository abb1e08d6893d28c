//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, bad settings or filler file)  |
//! | 3    | Model or encoder artifacts missing or malformed      |
//! | 4    | Input cannot be parsed (CSV, JSON record, non-number)|
//! | 5    | Reconciled features do not match the model schema    |
//! | 6    | Categorical value the encoder was not fit on         |
//! | 7    | Batch ran but no row could be predicted              |
//! | 8    | Output could not be written                          |

use cmi_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid settings or filler profile.
pub const EXIT_USAGE: u8 = 2;

/// Model or encoder artifact missing, unreadable, or malformed.
pub const EXIT_MODEL_LOAD: u8 = 3;

/// Batch CSV or JSON record malformed, or text in a numeric column.
pub const EXIT_INPUT_FORMAT: u8 = 4;

/// Feature vector does not match the model schema.
pub const EXIT_SCHEMA_MISMATCH: u8 = 5;

/// Unseen categorical label, or a categorical column left empty.
pub const EXIT_ENCODING: u8 = 6;

/// Every row of a batch failed.
pub const EXIT_NO_PREDICTIONS: u8 = 7;

/// Result file or settings file could not be written.
pub const EXIT_IO: u8 = 8;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ModelLoad(_) | ReconError::InvalidSchema(_) => EXIT_MODEL_LOAD,
        ReconError::InputFormat(_) | ReconError::NonNumeric { .. } => EXIT_INPUT_FORMAT,
        ReconError::SchemaMismatch { .. } => EXIT_SCHEMA_MISMATCH,
        ReconError::Encoding { .. } => EXIT_ENCODING,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_USAGE,
        ReconError::Io(_) => EXIT_IO,
        ReconError::Prediction(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_MODEL_LOAD,
            EXIT_INPUT_FORMAT,
            EXIT_SCHEMA_MISMATCH,
            EXIT_ENCODING,
            EXIT_NO_PREDICTIONS,
            EXIT_IO,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_to_codes() {
        let unseen = ReconError::Encoding { column: "sex".into(), value: "X".into() };
        assert_eq!(recon_exit_code(&unseen), EXIT_ENCODING);
        assert_eq!(recon_exit_code(&ReconError::ModelLoad("gone".into())), EXIT_MODEL_LOAD);
        assert_eq!(recon_exit_code(&ReconError::Io("disk".into())), EXIT_IO);
        let text = ReconError::NonNumeric { column: "age".into(), value: "old".into() };
        assert_eq!(recon_exit_code(&text), EXIT_INPUT_FORMAT);
    }
}
