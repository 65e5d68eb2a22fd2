pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod relay;
pub mod widget;
pub mod format;
pub mod console;

use cli::{ Args, Command, ServeArgs };
use llm::chat::optional_client;
use llm::LlmConfig;
use config::generation::GenerationConfig;
use log::info;
use relay::Relay;
use server::Server;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve_args) => serve(serve_args).await,
        Command::Chat(chat_args) => {
            info!("--- Chat Configuration ---");
            info!("Relay URL: {}", chat_args.relay_url);
            info!("History Store Type: {}", chat_args.history_type);
            info!("History Path: {}", chat_args.history_path);
            info!("Request Timeout: {}s", chat_args.request_timeout_secs);
            info!("-------------------------");
            console::run_chat(chat_args).await
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    if !args.relay_path.starts_with('/') {
        return Err(format!("Relay path must start with '/': {}", args.relay_path).into());
    }

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Relay Path: {}", args.relay_path);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("client default"));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("client default"));
    info!("API Key Configured: {}", !args.chat_api_key.trim().is_empty());
    info!("Upstream Timeout: {}s", args.upstream_timeout_secs);
    info!("Safety Threshold: {:?}", args.safety_threshold);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let llm_config = LlmConfig {
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.trim().is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        generation: GenerationConfig::default(),
        safety_threshold: args.safety_threshold,
    };
    let chat_client = optional_client(&llm_config)?;
    if let Some(client) = &chat_client {
        info!(
            "Upstream client ready → model={} base_url={}",
            client.get_model(),
            client.get_base_url().as_deref().unwrap_or("default")
        );
    }
    let relay = Arc::new(Relay::new(chat_client, Duration::from_secs(args.upstream_timeout_secs)));

    let addr = args.server_addr.clone();
    info!("Starting relay on: {}", addr);
    let server = Server::new(addr, relay, args);
    server.run().await?;

    Ok(())
}
