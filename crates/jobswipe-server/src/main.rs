//! jobswipe-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `JOBSWIPE_*` environment variables, opens the SQLite store and serves the
//! JSON and WebSocket API over HTTP.
//!
//! ```toml
//! host            = "127.0.0.1"
//! port            = 8080
//! store_path      = "~/.local/share/jobswipe/jobswipe.db"
//! avatar_dir      = "~/.local/share/jobswipe/avatars"
//! public_base_url = "http://127.0.0.1:8080"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use jobswipe_server::{AppState, ServerConfig};
use jobswipe_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "JobSwipe server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "jobswipe.db")?
    .set_default("avatar_dir", "avatars")?
    .set_default("public_base_url", "http://127.0.0.1:8080")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("JOBSWIPE"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.avatar_dir = expand_tilde(&server_cfg.avatar_dir);

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  std::fs::create_dir_all(&server_cfg.avatar_dir)
    .with_context(|| format!("failed to create {:?}", server_cfg.avatar_dir))?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!(
    policy = ?server_cfg.match_policy(),
    reload = ?server_cfg.reload_policy,
    "match settings"
  );

  let app = jobswipe_server::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
