use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use heartline_api::config::{AppConfig, DatastoreBackend};
use heartline_api::database::open_store;
use heartline_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "heartline-api")]
#[command(about = "Heartline relationship tracker REST API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Interface to bind (overrides HEARTLINE_HOST)")]
    host: Option<String>,

    #[arg(long, short, help = "Port to listen on (overrides HEARTLINE_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "JSON datastore file (overrides HEARTLINE_DATA_FILE)")]
    data_file: Option<PathBuf>,

    #[arg(long, help = "Keep the JSON datastore in memory only")]
    in_memory: bool,

    #[arg(long, help = "Use the PostgreSQL datastore at this URL")]
    database_url: Option<String>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.data_file {
            config.datastore.data_file = Some(path);
        }
        if self.in_memory {
            config.datastore.data_file = None;
        }
        if let Some(url) = self.database_url {
            config.datastore.backend = DatastoreBackend::Postgres;
            config.datastore.database_url = Some(url);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let default_filter = if config.api.enable_request_logging {
        "heartline_api=info,tower_http=info"
    } else {
        "heartline_api=info,tower_http=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting Heartline API in {:?} mode", config.environment);

    if let Some(parent) = config.datastore.data_file.as_ref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let store = open_store(&config.datastore)
        .await
        .context("failed to open datastore")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", bind_addr))?;

    let app = heartline_api::app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Heartline API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
