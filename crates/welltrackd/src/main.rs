//! welltrackd — the welltrack daemon.
//!
//! Single binary that opens the redb store and serves the REST API over
//! wells, channels and their time-series buckets.
//!
//! # Usage
//!
//! ```text
//! welltrackd serve --config welltrack.toml --port 8000 --data-dir /var/lib/welltrack
//! welltrackd buckets --data-dir /var/lib/welltrack
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use welltrack_core::ServiceConfig;
use welltrack_core::config::DATABASE_FILE;
use welltrack_state::StateStore;

const DEFAULT_LOG_FILTER: &str = "info,welltrackd=debug,welltrack=debug";

#[derive(Parser)]
#[command(name = "welltrackd", about = "welltrack daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API.
    Serve {
        /// Path to welltrack.toml. Built-in defaults apply without it.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for the database file.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Allowed CORS origins, comma separated.
        #[arg(long, env = "WELLTRACK_CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Option<Vec<String>>,
    },

    /// List the bucket tables in a data directory.
    Buckets {
        /// Data directory for the database file.
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
            cors_origins,
        } => {
            let mut service = match config {
                Some(path) => ServiceConfig::from_file(&path)?,
                None => ServiceConfig::default(),
            };
            if let Some(port) = port {
                service.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                service.storage.data_dir = data_dir;
            }
            if let Some(origins) = cors_origins {
                service.cors.origins = origins;
            }
            run_serve(service).await
        }
        Command::Buckets { data_dir } => list_buckets(&data_dir),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run_serve(config: ServiceConfig) -> anyhow::Result<()> {
    info!(project = %config.project.name, version = %config.project.version, "welltrack daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&config.storage.data_dir)?;
    let db_path = config.storage.database_path();

    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let router = welltrack_api::build_router(store, &config);
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    let addr: SocketAddr = listener.local_addr()?;

    info!(%addr, prefix = %config.server.api_prefix, origins = ?config.cors.origins, "API server starting");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("welltrack daemon stopped");
    Ok(())
}

fn list_buckets(data_dir: &Path) -> anyhow::Result<()> {
    let db_path = data_dir.join(DATABASE_FILE);
    anyhow::ensure!(db_path.exists(), "no database at {}", db_path.display());

    let store = StateStore::open(&db_path)?;
    let tables = store.buckets().list_all_bucket_tables()?;
    if tables.is_empty() {
        println!("no bucket tables");
    }
    for table in tables {
        println!("{table}");
    }
    Ok(())
}
