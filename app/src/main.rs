//! Root application: builds the client and issues one sample read on startup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use api_core::{ApiClient, ClientConfig, MessageLog, Outcome, ReqwestTransport};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_SAMPLE_URL: &str = "http://localhost:3001/api/v1/users";

/// Settings not given here fall back to the `API_*` environment variables.
#[derive(Debug, Parser)]
#[command(name = "api-app", about = "Issue one sample read against the users API")]
struct Args {
    /// Path or URL read on startup.
    #[arg(long, default_value = DEFAULT_SAMPLE_URL)]
    url: String,

    /// Prefix for relative paths.
    #[arg(long)]
    base_url: Option<String>,

    /// File backing the token store.
    #[arg(long)]
    storage_path: Option<PathBuf>,

    /// Attach the bearer token in the request pipeline.
    #[arg(long)]
    attach_bearer: bool,

    /// Save this token before the request.
    #[arg(long)]
    token: Option<String>,

    /// Clear the whole token store before anything else.
    #[arg(long)]
    logout: bool,
}

impl Args {
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(path) = &self.storage_path {
            config.storage_path = Some(path.clone());
        }
        config.attach_bearer |= self.attach_bearer;
        config
    }
}

async fn run(args: &Args, config: &ClientConfig) -> anyhow::Result<(Outcome, Vec<String>)> {
    let messages = Arc::new(MessageLog::new());
    let client = ApiClient::from_config(config, Arc::new(ReqwestTransport::new()), messages.clone());

    if args.logout {
        client
            .tokens()
            .clean_local_storage()
            .context("failed to clear token store")?;
    }
    if let Some(token) = &args.token {
        client.tokens().save_token(token).context("failed to save token")?;
    }

    tracing::info!(url = %args.url, "issuing sample read");
    let outcome = client
        .read(&args.url, &Value::Null)
        .await
        .context("failed to read token store")?;
    Ok((outcome, messages.messages()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.apply(ClientConfig::from_env()?);
    tracing::debug!(?config, "loaded configuration");

    let (outcome, messages) = run(&args, &config).await?;
    match outcome.into_value() {
        None => println!("read {} completed", args.url),
        Some(fallback) => println!("{fallback}"),
    }
    for message in messages {
        eprintln!("{message}");
    }
    Ok(())
}
