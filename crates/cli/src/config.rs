//! `cmi config` — settings file location and defaults. Never loads the model.

use std::path::PathBuf;

use clap::Subcommand;

use cmi_config::Settings;

use crate::exit_codes::EXIT_ERROR;
use crate::{CliError, GlobalArgs};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the settings file path
    Path,

    /// Write a commented default settings file
    #[command(after_help = "\
Examples:
  cmi config init
  cmi config init --force
  cmi --settings ./cmi.json config init")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings as JSON
    Show,
}

pub fn cmd_config(cmd: ConfigCommands, global: &GlobalArgs) -> Result<(), CliError> {
    let path = settings_path(global);
    match cmd {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init { force } => {
            Settings::write_default(&path, force).map_err(CliError::recon)?;
            println!("wrote {}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let settings = if path.exists() {
                Settings::load_from(&path).map_err(CliError::recon)?
            } else {
                Settings::default()
            };
            let text = serde_json::to_string_pretty(&settings)
                .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
            println!("{}", text);
            Ok(())
        }
    }
}

fn settings_path(global: &GlobalArgs) -> PathBuf {
    global.settings.clone().unwrap_or_else(Settings::config_path)
}
