//! `cmi schema` and `cmi check` — what the loaded artifacts contain.

use std::collections::BTreeMap;

use serde::Serialize;

use cmi_recon::bundle::BundleMeta;

use crate::context::Context;
use crate::exit_codes::{EXIT_ERROR, EXIT_MODEL_LOAD};
use crate::CliError;

#[derive(Serialize)]
struct SchemaOutput<'a> {
    #[serde(flatten)]
    meta: &'a BundleMeta,
    features: &'a [String],
    encoders: BTreeMap<&'a str, &'a [String]>,
    fill_strategy: String,
}

pub fn cmd_schema(ctx: &Context, json: bool) -> Result<(), CliError> {
    let bundle = ctx.load_bundle()?;
    let meta = bundle.meta();
    let encoders: BTreeMap<&str, &[String]> =
        bundle.encodings().iter().map(|(col, enc)| (col, enc.classes())).collect();

    if json {
        let out = SchemaOutput {
            meta,
            features: bundle.schema().names(),
            encoders,
            fill_strategy: ctx.filler.strategy.to_string(),
        };
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Model:     {} ({} features)", meta.model_kind, meta.feature_count);
    println!("Schema:    {}", meta.schema_fingerprint);
    if let Some(digest) = &meta.model_digest {
        println!("Artifact:  {} ({})", ctx.model_path.display(), &digest[..16]);
    }
    println!("Filler:    {}", ctx.filler.strategy);
    println!();

    let width = bundle.schema().names().iter().map(String::len).max().unwrap_or(0);
    for (i, name) in bundle.schema().names().iter().enumerate() {
        match encoders.get(name.as_str()) {
            Some(classes) => println!("{:>4}  {:<width$}  [{}]", i + 1, name, classes.join(", ")),
            None => println!("{:>4}  {}", i + 1, name),
        }
    }

    let unused: Vec<&str> = encoders
        .keys()
        .copied()
        .filter(|col| !bundle.schema().contains(col))
        .collect();
    if !unused.is_empty() {
        ctx.note(format!("encoders not used by the model: {}", unused.join(", ")));
    }
    Ok(())
}

/// Startup check: both artifact files exist, parse, and agree.
pub fn cmd_check(ctx: &Context) -> Result<(), CliError> {
    for (what, path) in [("model", &ctx.model_path), ("encoders", &ctx.encoders_path)] {
        if !path.is_file() {
            return Err(CliError::new(
                EXIT_MODEL_LOAD,
                format!("{what} file not found: {}", path.display()),
            )
            .with_hint("pass --model/--encoders, or set artifacts.* in settings (see `cmi config path`)"));
        }
    }

    let bundle = ctx.load_bundle()?;
    let meta = bundle.meta();
    println!(
        "ok: {} model, {} features, {} encoders",
        meta.model_kind,
        meta.feature_count,
        bundle.encodings().len()
    );
    Ok(())
}
