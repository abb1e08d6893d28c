// cmi - behavior classifier from the command line
// Single predictions, batch CSV scoring, artifact inspection

mod batch;
mod config;
mod context;
mod exit_codes;
mod inspect;
mod predict;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use cmi_recon::{FillStrategy, ReconError};
use exit_codes::{recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cmi")]
#[command(about = "Classify sensor readings as target or non-target behavior")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Model artifact (JSON). Overrides `artifacts.model` in settings
    #[arg(long, global = true, env = "CMI_MODEL", value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Encoder artifact (JSON). Overrides `artifacts.encoders` in settings
    #[arg(long, global = true, env = "CMI_ENCODERS", value_name = "FILE")]
    pub encoders: Option<PathBuf>,

    /// Settings file (default: the per-user config directory)
    #[arg(long, global = true, env = "CMI_SETTINGS", value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// How to fill model features missing from the input
    #[arg(long, global = true, value_name = "STRATEGY", value_parser = parse_strategy)]
    pub filler: Option<FillStrategy>,

    /// Seed for the random filler (makes `--filler random` reproducible)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Filler profile (TOML) with families, ranges and strategy
    #[arg(long, global = true, value_name = "FILE")]
    pub filler_config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only errors on stderr; suppress notes
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn parse_strategy(s: &str) -> Result<FillStrategy, String> {
    s.parse::<FillStrategy>().map_err(|e| e.to_string())
}

#[derive(Subcommand)]
enum Commands {
    /// Predict one record from form fields or a JSON file
    #[command(after_help = "\
Examples:
  cmi predict
  cmi predict --acc-z 8.7 --sex Female
  cmi predict --set thm_1_mean=0.95 --set tof_1_mean=0.4
  cmi predict --record reading.json --json
  cmi predict --filler random --seed 42")]
    Predict(predict::PredictArgs),

    /// Score every row of a CSV file
    #[command(after_help = "\
Examples:
  cmi batch readings.csv
  cmi batch readings.csv --output scored.csv
  cmi batch readings.csv --stdout > scored.csv
  cmi batch readings.csv --json")]
    Batch(batch::BatchArgs),

    /// Show the model's feature order and categorical encoders
    #[command(after_help = "\
Examples:
  cmi schema
  cmi schema --json | jq '.features | length'")]
    Schema {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Verify the model and encoder artifacts exist and load
    Check,

    /// Settings file location and defaults
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn long_version() -> &'static str {
    macro_rules! version_text {
        ($build:literal) => {
            concat!(
                env!("CARGO_PKG_VERSION"),
                " (", env!("CMI_GIT_COMMIT"), ")",
                "\nengine:  cmi-recon ", env!("CARGO_PKG_VERSION"),
                "\nbuild:   ", $build,
                "\ntarget:  ", env!("CMI_BUILD_TARGET"),
            )
        };
    }
    if cfg!(debug_assertions) {
        version_text!("debug")
    } else {
        version_text!("release")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let explicit_level = init_logging(&cli.global);

    let result = run(cli, explicit_level);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli, explicit_level: bool) -> Result<(), CliError> {
    // Artifacts load per command; `config` works even when they are broken
    let ctx = || context::Context::resolve(&cli.global, explicit_level);

    match cli.command {
        Commands::Predict(args) => predict::cmd_predict(&ctx()?, args),
        Commands::Batch(args) => batch::cmd_batch(&ctx()?, args),
        Commands::Schema { json } => inspect::cmd_schema(&ctx()?, json),
        Commands::Check => inspect::cmd_check(&ctx()?),
        Commands::Config(cmd) => config::cmd_config(cmd, &cli.global),
    }
}

/// Flags win over `RUST_LOG`, which wins over the settings file. Returns
/// whether the level was fixed by flags or environment.
fn init_logging(global: &GlobalArgs) -> bool {
    let flag_level = if global.quiet {
        Some(log::LevelFilter::Error)
    } else {
        match global.verbose {
            0 => None,
            1 => Some(log::LevelFilter::Info),
            2 => Some(log::LevelFilter::Debug),
            _ => Some(log::LevelFilter::Trace),
        }
    };

    let mut builder = env_logger::Builder::new();
    builder.format_timestamp(None);

    let explicit = match (flag_level, std::env::var("RUST_LOG")) {
        (Some(level), _) => {
            builder.filter_level(level);
            true
        }
        (None, Ok(filters)) => {
            builder.parse_filters(&filters);
            true
        }
        (None, Err(_)) => {
            // Settings decide later via log::set_max_level
            builder.filter_level(log::LevelFilter::Trace);
            false
        }
    };
    builder.init();

    if !explicit {
        log::set_max_level(log::LevelFilter::Warn);
    }
    explicit
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Create error from an engine error with its exit code.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::ModelLoad(_) => Some(
                "pass --model/--encoders, or set artifacts.model in settings (see `cmi config path`)"
                    .to_string(),
            ),
            ReconError::SchemaMismatch { .. } => {
                Some("run `cmi schema` to see the columns the model expects".to_string())
            }
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("`cmi config init --force` rewrites a valid default settings file".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::recon(err)
    }
}
