//! Effective configuration for one invocation: settings file, then flags.

use std::path::PathBuf;

use cmi_config::Settings;
use cmi_recon::{FillPolicy, FillerConfig, ModelBundle};

use crate::{CliError, GlobalArgs};

pub struct Context {
    pub settings: Settings,
    pub model_path: PathBuf,
    pub encoders_path: PathBuf,
    pub filler: FillerConfig,
    pub quiet: bool,
}

impl Context {
    pub fn resolve(global: &GlobalArgs, explicit_level: bool) -> Result<Self, CliError> {
        let settings = match &global.settings {
            Some(path) => Settings::load_from(path)
                .map_err(|e| CliError::recon(e).with_hint(format!("fix or remove {}", path.display())))?,
            None => Settings::load(),
        };
        if !explicit_level {
            log::set_max_level(settings.log_filter());
        }

        let mut filler = match &global.filler_config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    CliError::args(format!("cannot read filler profile {}: {e}", path.display()))
                })?;
                FillerConfig::from_toml(&text).map_err(|e| {
                    CliError::recon(e).with_hint("see `cmi config init` for the filler keys")
                })?
            }
            None => settings.filler.clone(),
        };
        if let Some(strategy) = global.filler {
            filler.strategy = strategy;
        }
        if global.seed.is_some() {
            filler.seed = global.seed;
        }

        let model_path = global.model.clone().unwrap_or_else(|| settings.model_path.clone());
        let encoders_path = global.encoders.clone().unwrap_or_else(|| settings.encoders_path.clone());
        log::debug!(
            "model {}, encoders {}, filler {}",
            model_path.display(),
            encoders_path.display(),
            filler.strategy
        );

        Ok(Self { settings, model_path, encoders_path, filler, quiet: global.quiet })
    }

    pub fn load_bundle(&self) -> Result<ModelBundle, CliError> {
        ModelBundle::load(&self.model_path, &self.encoders_path).map_err(CliError::recon)
    }

    /// One policy per command run; batch rows share it so a seeded run is reproducible.
    pub fn fill_policy(&self, bundle: &ModelBundle) -> Box<dyn FillPolicy> {
        self.filler.build(bundle.imputation())
    }

    /// Stderr note unless `--quiet`.
    pub fn note(&self, msg: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("note: {}", msg);
        }
    }
}
