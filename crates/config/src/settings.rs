// User settings
// Loaded from ~/.config/cmi/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cmi_recon::{FillerConfig, ReconError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Artifacts
    #[serde(rename = "artifacts.model")]
    pub model_path: PathBuf,
    #[serde(rename = "artifacts.encoders")]
    pub encoders_path: PathBuf,

    // Missing-column filling
    pub filler: FillerConfig,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: String,

    // Output
    #[serde(rename = "output.dir", skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.json"),
            encoders_path: PathBuf::from("models/encoders.json"),
            filler: FillerConfig::default(),
            log_level: "warn".to_string(),
            output_dir: None,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Model artifacts (relative paths resolve against the working directory)
    "artifacts.model": "models/model.json",
    "artifacts.encoders": "models/encoders.json",

    // How schema columns absent from the input are filled
    // strategy: "imputed" (artifact means), "random" (uniform in family range), "constant"
    "filler": {
        "strategy": "imputed",
        "constant": 0.0,
        "families": [
            { "prefix": "thm_", "min": 0.1, "max": 2.0 },
            { "prefix": "tof_", "min": 0.01, "max": 1.0 }
        ],
        "default_range": { "min": 0.1, "max": 1.0 }
    },

    // off, error, warn, info, debug, trace (RUST_LOG overrides)
    "log.level": "warn"

    // Directory for batch result files (default: current directory)
    // "output.dir": "results"
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cmi");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults.
    /// A missing file is normal; an unreadable or invalid one is logged.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Strict load: any read, parse or validation problem is an error.
    pub fn load_from(path: &Path) -> Result<Self, ReconError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ReconError> {
        // Strip comments (lines starting with //)
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings =
            serde_json::from_str(&cleaned).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.filler.validate()?;
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ReconError::ConfigValidation(format!(
                "unknown log level \"{}\"",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), ReconError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ReconError> {
        ensure_parent(path)?;
        let json = serde_json::to_string_pretty(self).map_err(|e| ReconError::Io(e.to_string()))?;
        fs::write(path, json).map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
    }

    /// Write the commented default file. Refuses to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ReconError> {
        if path.exists() && !force {
            return Err(ReconError::Io(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        ensure_parent(path)?;
        fs::write(path, DEFAULT_FILE)
            .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;
        log::info!("wrote default settings to {}", path.display());
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<(), ReconError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ReconError::Io(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmi_recon::FillStrategy;
    use tempfile::tempdir;

    #[test]
    fn default_file_parses_to_defaults() {
        let settings = Settings::parse(DEFAULT_FILE).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::parse(
            r#"{
    // only the model moved
    "artifacts.model": "/opt/cmi/model.json",
    "filler": { "strategy": "random", "seed": 7 }
}"#,
        )
        .unwrap();
        assert_eq!(settings.model_path, PathBuf::from("/opt/cmi/model.json"));
        assert_eq!(settings.encoders_path, PathBuf::from("models/encoders.json"));
        assert_eq!(settings.filler.strategy, FillStrategy::Random);
        assert_eq!(settings.filler.seed, Some(7));
        assert_eq!(settings.filler.families.len(), 2);
        assert_eq!(settings.log_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Settings::parse(r#"{ "log.level": "loud" }"#).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));

        let err = Settings::parse(r#"{ "filler": { "default_range": { "min": 3, "max": 1 } } }"#)
            .unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));

        let err = Settings::parse("{ not json").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn write_default_respects_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");

        Settings::write_default(&path, false).unwrap();
        assert!(Settings::write_default(&path, false).is_err());
        Settings::write_default(&path, true).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            output_dir: Some(PathBuf::from("results")),
            log_level: "debug".into(),
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }
}
