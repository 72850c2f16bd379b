//! Devmate CLI: plan and run developer tasks from a natural-language intent.
//!
//! Configuration is read from `devmate.toml` in the working directory (or
//! `--config`), credentials from `OPENAI_API_KEY` and `GITHUB_TOKEN`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use devmate::agent::Agent;
use devmate::core::types::RunResult;
use devmate::error::DevmateError;
use devmate::exit_codes;
use devmate::io::config::Settings;
use devmate::logging;

const HEALTH_MESSAGE: &str = "Devmate CLI is running successfully";

#[derive(Parser)]
#[command(
    name = "devmate",
    version,
    about = "Devmate: plan-then-execute developer assistant"
)]
struct Cli {
    /// Config file to use instead of `./devmate.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan and execute an intent, then print each step's result.
    Run {
        /// What you want done, e.g. "fix review comments on PR 12 in owner/repo".
        intent: String,
    },
    /// Print the validated plan for an intent without executing it.
    Plan { intent: String },
    /// Check that the CLI starts.
    Health,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Health => {
            tracing::info!("health check invoked");
            println!("{HEALTH_MESSAGE}");
            Ok(())
        }
        Command::Run { intent } => cmd_run(cli.config.as_deref(), &intent),
        Command::Plan { intent } => cmd_plan(cli.config.as_deref(), &intent),
    }
}

fn cmd_run(config: Option<&Path>, intent: &str) -> Result<()> {
    let settings = load_settings(config)?;
    let agent = Agent::from_settings(&settings)?;
    let results = agent.run(intent)?;
    print_results(&results);
    Ok(())
}

fn cmd_plan(config: Option<&Path>, intent: &str) -> Result<()> {
    let settings = load_settings(config)?;
    let agent = Agent::from_settings(&settings)?;
    let plan = agent.plan(intent)?;
    let rendered = serde_json::to_string_pretty(&plan).context("serialize plan")?;
    println!("{rendered}");
    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let workdir = std::env::current_dir().context("resolve working directory")?;
    let settings = Settings::load(&workdir, config)
        .map_err(|err| DevmateError::Configuration(format!("{err:#}")))?;
    tracing::debug!(env = settings.env(), workdir = %workdir.display(), "settings loaded");
    Ok(settings)
}

fn print_results(results: &RunResult) {
    println!("Agent execution completed");
    for entry in results {
        println!("- Action: {}", entry.action);
        println!("  Result: {}", entry.result);
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DevmateError>() {
        Some(DevmateError::Configuration(_)) => exit_codes::CONFIG,
        _ => exit_codes::FAILED,
    }
}
