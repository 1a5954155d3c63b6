// Seva - conversational grievance-filing assistant
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use seva::agent::{load_system_prompt, ChatAgent};
use seva::claude::ClaudeClient;
use seva::config::{load_config, Config};
use seva::grm::GrmClient;
use seva::scheme::SchemeSearchClient;
use seva::server::SevaServer;
use seva::speech::SpeechClient;
use seva::tools::implementations::{grievance_processor, grievance_registry};
use seva::tools::{ToolName, ToolRegistry};

#[derive(Parser, Debug)]
#[command(name = "seva")]
#[command(about = "Conversational grievance-filing assistant", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Config file (default: ~/.seva/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List registered tools and whether each needs user confirmation
    Tools {
        /// Config file (default: ~/.seva/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing();

    match args.command {
        Command::Serve { bind, config } => run_serve(bind, config).await,
        Command::Tools { config } => run_tools(config),
    }
}

async fn run_serve(bind: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    config.validate()?;

    let bind_address = bind.unwrap_or_else(|| config.server.bind_address.clone());

    let grm = Arc::new(GrmClient::new(&config.grm)?);
    let registry = Arc::new(build_registry(&config, Arc::clone(&grm))?);
    let processor = grievance_processor(registry, grm, config.server.executor_failure)?;

    let system_prompt = load_system_prompt(config.model.system_prompt_path.as_deref())?;
    let provider = ClaudeClient::new(config.model.api_key.clone())?;
    let agent = ChatAgent::new(Arc::new(provider), Arc::new(processor), &config.model)
        .with_system_prompt(system_prompt);

    let speech = SpeechClient::new(config.speech.clone())
        .context("Failed to create speech client")?;
    if !speech.is_configured() {
        tracing::warn!("ELEVENLABS_API_KEY not set, /api/text-to-speech will return errors");
    }

    tracing::info!(
        model = %config.model.model,
        max_steps = config.model.max_steps,
        executor_failure = ?config.server.executor_failure,
        "Seva configured"
    );

    SevaServer::new(agent, speech).serve(&bind_address).await
}

fn run_tools(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let grm = Arc::new(GrmClient::new(&config.grm)?);
    let registry = build_registry(&config, grm)?;

    let gated = registry.tools_requiring_confirmation();
    for definition in registry.definitions() {
        let name = definition
            .name
            .parse::<ToolName>()
            .context("Registry holds an unknown tool")?;
        let mode = if gated.contains(&name) {
            "requires confirmation"
        } else {
            "auto-executes"
        };
        println!("{:<24} {}", definition.name, mode);
    }

    Ok(())
}

fn build_registry(config: &Config, grm: Arc<GrmClient>) -> Result<ToolRegistry> {
    let scheme = Arc::new(SchemeSearchClient::new(&config.scheme_search)?);
    if !scheme.is_configured() {
        tracing::warn!("SCHEME_SEARCH_URL not set, scheme searches will report failure");
    }
    Ok(grievance_registry(grm, scheme)?)
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Bridge log crate → tracing (after the subscriber is set up)
    tracing_log::LogTracer::init().ok();
}
