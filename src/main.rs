use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use carelink_api::config::{self, StorageBackend};
use carelink_api::database::DatabaseManager;
use carelink_api::routes::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "carelink-api", version, about = "Care coordination API server")]
struct Args {
    /// Port to listen on (overrides PORT / CARELINK_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Use the in-process store instead of postgres
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and JWT_SECRET are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carelink_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!(
        "Starting CareLink API in {:?} mode ({:?} store)",
        config.environment,
        config.storage.backend
    );

    let store = DatabaseManager::connect(&config)
        .await
        .context("failed to initialise store")?;
    let state = AppState::new(store, &config).context("failed to build services")?;
    let router = app(state, &config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("CareLink API listening on http://{}", bind_addr);
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
