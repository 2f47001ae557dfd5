//! Main Entrypoint for the Project Coach
//!
//! This binary is responsible for:
//! 1. Parsing command-line flags and loading configuration from the environment.
//! 2. Initializing logging (to stderr, so it never interleaves with the conversation).
//! 3. Building the content generator for the configured provider.
//! 4. Running the interactive console loop until the learner quits.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use coach_core::{
    ContentGenerator, InMemoryDocStore, LLMContentGenerator, MockContentGenerator,
    TurnOrchestrator,
    llm_client::{LLMClient, OpenAICompatibleClient},
    prompts,
};
use coach_service::{
    cli::Cli,
    config::Config,
    repl,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let config = Config::from_env_with(cli.overrides()).context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded. Initializing coach...");

    // --- 3. Initialize Shared Services ---
    let generator: Arc<dyn ContentGenerator> = match config.provider.api_base() {
        None => {
            info!("Using offline content generator.");
            Arc::new(MockContentGenerator)
        }
        Some(api_base) => {
            info!(provider = ?config.provider, "Using hosted provider.");
            let api_key = config
                .api_key()
                .context("No API key configured for the selected provider")?;
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(api_base);
            let llm_client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(
                openai_config,
                config.chat_model.clone(),
            ));
            let prompts = prompts::load(config.prompts_path.as_deref())?;
            Arc::new(LLMContentGenerator::new(llm_client, prompts))
        }
    };

    let docs = Arc::new(InMemoryDocStore::react_reference());
    let orchestrator = TurnOrchestrator::new(generator, docs).with_docs_limit(config.docs_limit);

    // --- 4. Run the Conversation ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        docs_limit = config.docs_limit,
        "Coach configured. Starting session..."
    );
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let session = repl::run(&orchestrator, stdin, &mut stdout).await?;

    info!(
        stages = session.stages().len(),
        completed = session.completed_stages(),
        "Coach has shut down."
    );
    Ok(())
}
