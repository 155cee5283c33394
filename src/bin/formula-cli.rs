//! Command-line driver for batch formula evaluation.
//!
//! Reads a JSON request (formulas, input variables, engine config) from a
//! file or stdin, runs it through [`formula_engine::Engine::evaluate_all`],
//! and writes the JSON [`formula_engine::BatchResult`] to stdout.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use formula_engine::{BatchOptions, EngineConfig, Engine, EvaluationContext, FormulaDefinition, Value};

#[derive(Parser, Debug)]
#[command(name = "formula-cli", about = "Evaluate a batch of formulas from a JSON request")]
struct Args {
    /// Path to the request JSON file. Reads stdin when omitted.
    #[arg(value_name = "REQUEST")]
    request: Option<PathBuf>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,

    /// Validate the batch and print the validation report instead of
    /// evaluating it.
    #[arg(long)]
    validate_only: bool,
}

#[derive(Debug, Deserialize)]
struct Request {
    formulas: Vec<FormulaDefinition>,
    #[serde(default)]
    variables: std::collections::HashMap<String, Value>,
    #[serde(default)]
    extra: std::collections::HashMap<String, Value>,
    #[serde(default)]
    config: EngineConfig,
    #[serde(default)]
    disable_intermediate_rounding: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        tracing::error!(error = %e, "formula-cli failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let raw = match &args.request {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: Request = serde_json::from_str(&raw)?;

    tracing::info!(formula_count = request.formulas.len(), "loaded request");

    let mut engine = Engine::new(request.config);
    let mut ctx = EvaluationContext::new();
    for (name, value) in request.variables {
        ctx.set_variable(name, value);
    }
    for (name, value) in request.extra {
        ctx.set_extra(name, value);
    }

    if args.validate_only {
        let report = engine.validate(&request.formulas, &ctx);
        print_json(&report, args.pretty)?;
        return Ok(());
    }

    let options = BatchOptions {
        disable_intermediate_rounding: request.disable_intermediate_rounding,
    };
    let result = engine.evaluate_all(&request.formulas, &ctx, options)?;
    print_json(&result, args.pretty)?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
