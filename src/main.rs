//! ResumeStore -- object storage gateway for a resume builder.
//!
//! Startup provisions the bucket before the listener opens; a bucket that
//! cannot be created or made publicly readable aborts the process.
//! SIGTERM/SIGINT stop accepting connections and let in-flight requests
//! finish.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use resumestore::config::{LogFormat, LoggingConfig, StorageBackend};
use resumestore::storage::client::ObjectStoreClient;
use resumestore::storage::instrumented::InstrumentedClient;
use resumestore::storage::memory::MemoryClient;
use resumestore::storage::s3::S3Client;
use resumestore::storage::service::StorageService;

/// Command-line arguments for the ResumeStore server.
#[derive(Parser, Debug)]
#[command(
    name = "resumestore",
    version,
    about = "Object storage gateway for resume pictures, previews and documents"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "resumestore.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = resumestore::config::load_config(&cli.config)?;
    init_tracing(&config.logging);
    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics {
        resumestore::metrics::init_metrics()?;
        resumestore::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    // One client for the whole process, shared by every request.
    let client: Arc<dyn ObjectStoreClient> = match config.storage.backend {
        StorageBackend::S3 => {
            let s3_config = config.storage.s3.as_ref().ok_or_else(|| {
                anyhow::anyhow!("storage.backend is 's3' but storage.s3 config section is missing")
            })?;
            Arc::new(InstrumentedClient::new(S3Client::new(s3_config).await))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory object store; objects are lost on exit");
            Arc::new(InstrumentedClient::new(MemoryClient::new()))
        }
    };

    let storage = StorageService::new(client, &config.storage, config.image);
    storage.ensure_bucket().await?;
    info!(
        "Storage ready: bucket={} public_url={}",
        config.storage.bucket, config.storage.public_url
    );

    let state = Arc::new(resumestore::AppState {
        config: config.clone(),
        storage,
    });

    let app = resumestore::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("ResumeStore listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("ResumeStore shut down");

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
