//! Command-line front end for the routing core
//!
//! Reads policies and fact contexts as JSON and prints results as JSON on
//! stdout. Logs go to stderr, filtered by `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use binroute_core::safety::check_command;
use binroute_core::{
    diff_policies, validate_policy, DecisionEngine, EngineConfig, EvaluationContext, ExecutablePolicy, Value,
};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "binroute", version, about = "Route factory parts to bins using compiled policies")]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide a route for one fact context
    Decide {
        /// Policy file (JSON)
        #[arg(short, long)]
        policy: PathBuf,

        /// Fact context file (JSON object of name to value)
        #[arg(short, long)]
        facts: PathBuf,

        /// Confidence to carry into the decision; defaults to the `confidence` fact
        #[arg(long)]
        confidence: Option<f64>,

        /// Include the outcome of every rule visited
        #[arg(long)]
        trace: bool,
    },

    /// Validate a policy for completeness
    Validate {
        #[arg(short, long)]
        policy: PathBuf,
    },

    /// Check a command value against a policy's safety constraints
    Check {
        #[arg(short, long)]
        policy: PathBuf,

        #[arg(long)]
        parameter: String,

        #[arg(long)]
        value: f64,
    },

    /// Diff two policy versions
    Diff {
        #[arg(long)]
        old: PathBuf,

        #[arg(long)]
        new: PathBuf,
    },

    /// Print a human-readable policy summary
    Summary {
        #[arg(short, long)]
        policy: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn read_policy(path: &Path) -> Result<ExecutablePolicy> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ExecutablePolicy::from_json(&contents).with_context(|| format!("loading policy {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            EngineConfig::from_json_file(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Decide { policy, facts, confidence, trace } => {
            let policy = read_policy(&policy)?;
            let ctx: EvaluationContext = read_json(&facts)?;
            let confidence = confidence
                .or_else(|| ctx.get("confidence").and_then(Value::as_number))
                .unwrap_or(0.0);

            let engine = DecisionEngine::new(config);
            let decision = if trace {
                engine.decide_traced(&policy.decision_rules, &policy.default_action, &ctx, confidence)
            } else {
                engine.decide_policy(&policy, &ctx, confidence)
            };
            print_json(&decision)
        }
        Command::Validate { policy } => {
            let policy = read_policy(&policy)?;
            print_json(&validate_policy(&policy, &config))
        }
        Command::Check { policy, parameter, value } => {
            let policy = read_policy(&policy)?;
            let check = check_command(&policy.safety_constraints, &parameter, value);
            print_json(&check)?;
            if !check.passed {
                std::process::exit(2);
            }
            Ok(())
        }
        Command::Diff { old, new } => {
            let old = read_policy(&old)?;
            let new = read_policy(&new)?;
            print_json(&diff_policies(&old, &new))
        }
        Command::Summary { policy } => {
            let policy = read_policy(&policy)?;
            println!("{}", policy.summary());
            Ok(())
        }
    }
}
