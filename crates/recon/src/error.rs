use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// Model or encoder artifact missing, unreadable, or malformed.
    ModelLoad(String),
    /// Reconciled columns do not exactly equal the schema.
    SchemaMismatch {
        expected: usize,
        found: usize,
        missing: Vec<String>,
        extra: Vec<String>,
    },
    /// Categorical value the column's encoder was not fit on.
    Encoding { column: String, value: String },
    /// Text value in a column that must be numeric.
    NonNumeric { column: String, value: String },
    /// Schema definition itself is unusable (empty, blank or duplicate names).
    InvalidSchema(String),
    /// Uploaded or supplied input cannot be parsed.
    InputFormat(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad range, missing seed, etc.).
    ConfigValidation(String),
    /// Classifier produced an unusable result.
    Prediction(String),
    /// IO error (file write, etc.).
    Io(String),
}

impl ReconError {
    /// Stable snake_case tag, used in batch failure reports and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) => "model_load",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::Encoding { .. } => "encoding_error",
            Self::NonNumeric { .. } => "non_numeric",
            Self::InvalidSchema(_) => "invalid_schema",
            Self::InputFormat(_) => "input_format",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
            Self::Prediction(_) => "prediction",
            Self::Io(_) => "io",
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoad(msg) => write!(f, "model load error: {msg}"),
            Self::SchemaMismatch { expected, found, missing, extra } => {
                write!(f, "feature mismatch: expected {expected} features, got {found}")?;
                if !missing.is_empty() {
                    write!(f, "; missing: {}", missing.join(", "))?;
                }
                if !extra.is_empty() {
                    write!(f, "; unexpected: {}", extra.join(", "))?;
                }
                Ok(())
            }
            Self::Encoding { column, value } => {
                write!(f, "error encoding '{column}': unseen label '{value}'")
            }
            Self::NonNumeric { column, value } => {
                write!(f, "column '{column}': expected a number, got '{value}'")
            }
            Self::InvalidSchema(msg) => write!(f, "invalid schema: {msg}"),
            Self::InputFormat(msg) => write!(f, "input format error: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Prediction(msg) => write!(f, "prediction error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
