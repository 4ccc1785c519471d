//! Interactive assistant for the Danish parish registry.
//!
//! ```bash
//! OPENAI_API_KEY=your_key cargo run
//! ```
//!
//! Logs go to stderr; raise the level with `RUST_LOG=sogn_agent=debug`.

use anyhow::Context;
use log::info;
use sogn_agent::catalog::parish_catalog;
use sogn_agent::config::Settings;
use sogn_agent::console::{self, SYSTEM_PROMPT};
use sogn_agent::providers::OpenAIProvider;
use sogn_agent::{AgentConfig, Conversation, LoggingHooks, RegistryClient, ToolContext};
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = Settings::load()?;
    info!("Using model {}", settings.model_id);

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let mut registry = RegistryClient::new(http.clone());
    if let Some(base_url) = &settings.registry_base_url {
        registry = registry.with_base_url(base_url.as_str());
    }

    let provider = match settings.openai_base_url {
        Some(base_url) => {
            OpenAIProvider::with_base_url(settings.api_key, settings.model_id, base_url)
        }
        None => OpenAIProvider::new(settings.api_key, settings.model_id),
    }
    .with_client(http);

    let mut conversation = Conversation::builder()
        .provider(provider)
        .tools(parish_catalog())
        .context(ToolContext::new(registry))
        .hooks(LoggingHooks)
        .config(AgentConfig::default().with_system_prompt(SYSTEM_PROMPT))
        .build()?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console::run(&mut conversation, stdin, &mut stdout).await?;

    Ok(())
}
