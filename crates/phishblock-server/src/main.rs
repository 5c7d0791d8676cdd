//! phishblock server binary.
//!
//! Reads `phishblock.toml` (or the path specified with `--config`) plus
//! `PHISHBLOCK_*` environment variables, opens the SQLite store, and serves
//! the JSON API under `/api`.
//!
//! # Creating users
//!
//! Accounts are provisioned out of band:
//!
//! ```
//! cargo run -p phishblock-server -- add-user alice
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use phishblock_core::store::ThreatStore;
use phishblock_server::ServerConfig;
use phishblock_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PhishBlock community threat-report server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "phishblock.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Create a user with zero reputation and print its id.
  AddUser {
    username: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::AddUser { username } => {
      let user = store
        .add_user(username)
        .await
        .context("failed to create user")?;
      println!("{}", user.id);
      Ok(())
    }
    Command::Serve => serve(store, &server_cfg).await,
  }
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let cors = server_cfg.cors_layer().context("invalid cors_origins entry")?;
  let app = phishblock_server::app(Arc::new(store), cors);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  tracing::info!("Health check: http://{address}/api/health");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("Shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
