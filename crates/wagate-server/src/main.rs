//! wagate server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `WAGATE_*`
//! environment overrides, opens the SQLite store, and serves the webhook and
//! admin API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```text
//! cargo run -p wagate-server --bin wagate -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wagate_server::{
  AppState, ServerConfig, messenger::CloudApiMessenger, notifier::SmtpNotifier,
  reconcile::spawn_reconciler,
};
use wagate_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Multi-tenant WhatsApp auto-reply gateway")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("WAGATE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.mail.is_none() {
    tracing::warn!("no [mail] section configured; handoff e-mails are disabled");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let messenger = CloudApiMessenger::new(
    &server_cfg.graph_api_base,
    &server_cfg.template_language,
    Duration::from_secs(server_cfg.http_timeout_secs),
  )
  .context("failed to build http client")?;
  let notifier = SmtpNotifier::new(server_cfg.mail.clone());

  let stall_after = chrono::Duration::seconds(
    i64::try_from(server_cfg.stall_after_secs).context("stall_after_secs out of range")?,
  );
  spawn_reconciler(
    Arc::clone(&store),
    Duration::from_secs(server_cfg.reconcile_interval_secs.max(1)),
    stall_after,
  );

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, Arc::new(messenger), Arc::new(notifier), server_cfg);
  let app = wagate_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
