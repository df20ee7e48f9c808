use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod console;
mod gateway;
mod idea;
mod scaffold;
mod spec;
mod storage;
mod synth;
mod themes;
mod workflow;

use config::RunConfig;
use console::StdConsole;
use gateway::Gateway;
use storage::ArtifactStore;
use workflow::{Workflow, WorkflowError};

/// OneDay CLI - build Flutter apps in one day with LLM assistance
#[derive(Parser)]
#[command(name = "oneday")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Generation back end (defaults to $LLM_PROVIDER, then "openai")
    #[arg(short, long)]
    provider: Option<String>,

    /// Model identifier override
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for run artifacts and the generated project
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Per-call token budget override
    #[arg(long)]
    max_tokens: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full idea-to-app workflow (default)
    Run,
    /// List the available design themes
    Themes,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Themes) => {
            run_themes();
            Ok(())
        }
        Some(Commands::Run) | None => run_workflow(cli).await,
    }
}

fn run_themes() {
    for (index, theme) in themes::all().iter().enumerate() {
        println!(
            "{}. {} ({}) — {}",
            index + 1,
            theme.name,
            theme.id.as_str(),
            theme.description
        );
        println!(
            "   primary {}, secondary {}, accent {}",
            theme.colors.primary, theme.colors.secondary, theme.colors.accent
        );
        println!("   {}", theme.characteristics.join(", "));
    }
}

async fn run_workflow(cli: Cli) -> Result<()> {
    let config = RunConfig::load(cli.provider, cli.model, cli.max_tokens, cli.output);
    let gateway = Gateway::from_config(&config)?;
    let store = ArtifactStore::new(&config.output_dir)?;

    println!("OneDay — build a Flutter app in one day");
    println!("Back end: {} ({})\n", gateway.provider(), gateway.model_id());

    let mut workflow = Workflow::new(gateway, StdConsole::new(), store, config.max_tokens);
    match workflow.run().await {
        Ok(outcome) => {
            if outcome.report.is_clean() {
                println!("\n✓ OneDay workflow completed successfully!");
            } else {
                println!(
                    "\n✓ OneDay workflow completed with {} stubbed file(s); see the summary above.",
                    outcome.report.failures.len()
                );
            }
            println!("\nNext steps:");
            println!("1. cd {}", outcome.app_dir.display());
            println!("2. flutter pub get");
            println!("3. flutter run");
            Ok(())
        }
        Err(WorkflowError::Cancelled) => {
            println!("\nWorkflow cancelled. Checkpoints up to the last accepted step are kept.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
