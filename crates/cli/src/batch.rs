//! `cmi batch` — score a CSV file and write the result file.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use cmi_io::csv::{default_output_name, export_results, read_table, write_results};
use cmi_io::json::export_outcome;
use cmi_recon::{run_batch, BatchOutcome};

use crate::context::Context;
use crate::exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_NO_PREDICTIONS};
use crate::CliError;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV with a header row; delimiter and encoding are detected
    input: PathBuf,

    /// Result file (default: prediction_results_<timestamp>.csv in `output.dir`)
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the result CSV to stdout; summary goes to stderr
    #[arg(long, conflicts_with_all = ["output", "json"])]
    stdout: bool,

    /// Print summary, rows and failures as JSON
    #[arg(long)]
    json: bool,

    /// Also save summary, rows and failures as JSON to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct BatchReport<'a> {
    #[serde(flatten)]
    outcome: &'a BatchOutcome,
    output: Option<String>,
}

pub fn cmd_batch(ctx: &Context, args: BatchArgs) -> Result<(), CliError> {
    let table = read_table(&args.input).map_err(CliError::recon)?;
    let bundle = ctx.load_bundle()?;

    let missing: Vec<&str> = bundle
        .schema()
        .names()
        .iter()
        .map(String::as_str)
        .filter(|name| !table.headers.iter().any(|h| h.as_str() == *name))
        .collect();
    if !missing.is_empty() {
        ctx.note(format!(
            "{} model feature(s) have no column in {} and will be filled ({})",
            missing.len(),
            args.input.display(),
            ctx.filler.strategy
        ));
    }

    let records = table.records();
    let mut filler = ctx.fill_policy(&bundle);
    let outcome = run_batch(&bundle, &records, filler.as_mut());

    if let Some(report) = &args.report {
        export_outcome(&outcome, report).map_err(CliError::recon)?;
    }

    if outcome.summary.succeeded == 0 {
        print_failures(&outcome, &mut std::io::stderr());
        return Err(CliError::new(
            EXIT_NO_PREDICTIONS,
            format!("none of the {} rows could be predicted", outcome.summary.total_rows),
        )
        .with_hint("run `cmi schema` to compare the model columns with the file header"));
    }

    if args.stdout {
        let stdout = std::io::stdout();
        write_results(stdout.lock(), &table, &outcome).map_err(CliError::recon)?;
        print_summary(&outcome, None, &mut std::io::stderr());
        return Ok(());
    }

    let output = match args.output {
        Some(path) => path,
        None => default_output_path(ctx.settings.output_dir.as_deref())?,
    };
    export_results(&output, &table, &outcome).map_err(CliError::recon)?;
    log::info!("wrote {} rows to {}", outcome.rows.len(), output.display());

    if args.json {
        let report = BatchReport { outcome: &outcome, output: Some(output.display().to_string()) };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        println!("{}", text);
    } else {
        print_summary(&outcome, Some(&output), &mut std::io::stdout());
    }
    Ok(())
}

fn default_output_path(dir: Option<&Path>) -> Result<PathBuf, CliError> {
    let name = default_output_name(&chrono::Local::now());
    match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                CliError::new(EXIT_IO, format!("cannot create {}: {e}", dir.display()))
            })?;
            Ok(dir.join(name))
        }
        None => Ok(PathBuf::from(name)),
    }
}

fn print_summary(outcome: &BatchOutcome, output: Option<&Path>, w: &mut dyn Write) {
    let s = &outcome.summary;
    let _ = writeln!(w, "Rows:            {}", s.total_rows);
    let _ = writeln!(w, "Predicted:       {}", s.succeeded);
    let _ = writeln!(w, "  target:        {}", s.target_count);
    let _ = writeln!(w, "  non-target:    {}", s.non_target_count);
    if let Some(avg) = s.avg_confidence {
        let _ = writeln!(w, "Avg confidence:  {:.1}%", avg * 100.0);
    }
    let _ = writeln!(w, "Failed:          {}", s.failed);
    print_failures(outcome, w);
    if let Some(path) = output {
        let _ = writeln!(w, "Results:         {}", path.display());
    }
}

fn print_failures(outcome: &BatchOutcome, w: &mut dyn Write) {
    for failure in &outcome.failures {
        let _ = writeln!(w, "  row {}: {}", failure.index + 1, failure.message);
    }
}
