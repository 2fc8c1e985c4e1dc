//! ferment-relay - Fermentation reading relay
//!
//! Listens for group chat messages on a local HTTP endpoint, extracts
//! specific gravity, temperature, pH and fermenter number, and appends
//! them to a CSV reading log.
//!
//! Subcommands:
//! - `serve` (default): run the relay
//! - `post`: deliver one message to a running relay

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ferment_common::config::{
    resolve_config_path, Overrides, ServiceConfig, Strategy, TomlConfig, DEFAULT_HOST,
    DEFAULT_PORT,
};
use ferment_common::{CsvLog, ReadingLog};
use ferment_relay::extract::{build_extractor, Extractor};
use ferment_relay::relay_client::RelayClient;
use ferment_relay::{build_router, AppState, InboundMessage, Recorder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line arguments for ferment-relay
#[derive(Parser, Debug)]
#[command(name = "ferment-relay")]
#[command(about = "Fermentation reading relay")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay HTTP service
    Serve(ServeArgs),
    /// Send one message to a running relay
    Post(PostArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Config file (TOML)
    #[arg(long, env = "FERMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "FERMENT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "FERMENT_PORT")]
    port: Option<u16>,

    /// CSV reading log path
    #[arg(long, env = "FERMENT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Extraction strategy: pattern or model
    #[arg(long, env = "FERMENT_STRATEGY")]
    strategy: Option<Strategy>,
}

#[derive(Args, Debug)]
struct PostArgs {
    /// Message text
    body: String,

    /// Message timestamp (seconds since epoch, defaults to now)
    #[arg(long)]
    timestamp: Option<i64>,

    /// Relay base URL
    #[arg(long, default_value_t = format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT))]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Post(args)) => {
            init_tracing("info");
            post(args).await
        }
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref());
    // Read before tracing starts so the configured log level applies
    let toml_config = TomlConfig::read(&config_path)?;
    let log_level = toml_config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&log_level);

    info!(
        "Starting ferment-relay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = TomlConfig::or_defaults(&config_path, toml_config);
    let overrides = Overrides {
        host: args.host,
        port: args.port,
        log_file: args.log_file,
        strategy: args.strategy,
    };
    let config = ServiceConfig::resolve(overrides, toml_config)?;

    let extractor = build_extractor(&config)?;
    info!("Extraction strategy: {}", extractor.name());

    let log = CsvLog::open(&config.log_file, extractor.schema())
        .with_context(|| format!("Failed to open reading log {}", config.log_file.display()))?;
    info!("Reading log: {} ({})", log.path().display(), log.schema());

    let state = AppState::new(Recorder::new(extractor, Arc::new(log)));
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn post(args: PostArgs) -> Result<()> {
    let message = InboundMessage {
        body: args.body,
        timestamp: args.timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp()),
    };

    let client = RelayClient::new(&args.url);
    let reply = client.post_message(&message).await?;
    info!("{} -> {}", client.parse_url(), reply);
    Ok(())
}
