//! flock server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the JSON API over HTTP.
//!
//! # Bootstrapping
//!
//! ```text
//! flock provision
//! flock create-user --name "Admin" --email admin@example.org --role admin
//! flock serve
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use flock_core::{store::MembershipStore, user::NewUser};
use flock_server::{ServerConfig, app, load_config};
use flock_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Flock membership server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,

  /// Seed the permission catalog and default roles, then exit.
  Provision,

  /// Create a user; the password is read from stdin.
  CreateUser {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    email: String,
    /// Role name to assign. Repeatable.
    #[arg(long = "role", required = true)]
    roles: Vec<String>,
  },
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
  let cfg = load_config(&cli.config)?;

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &cfg).await,
    Command::Provision => {
      store.provision().await.context("failed to provision store")?;
      tracing::info!("provisioned permissions and default roles");
      Ok(())
    }
    Command::CreateUser { name, email, roles } => {
      create_user(&store, name, email, roles).await
    }
  }
}

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  store.provision().await.context("failed to provision store")?;

  let app = app(Arc::new(store));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn create_user(
  store: &SqliteStore,
  name: String,
  email: String,
  roles: Vec<String>,
) -> anyhow::Result<()> {
  let known = store.list_roles().await.context("failed to list roles")?;
  let role_ids = roles
    .iter()
    .map(|wanted| {
      known
        .iter()
        .find(|r| &r.name == wanted)
        .map(|r| r.role_id)
        .with_context(|| format!("unknown role {wanted:?}; run `provision` first?"))
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

  let password = read_password()?;
  anyhow::ensure!(password.len() >= 8, "password must be at least 8 characters");

  let user = store
    .create_user(NewUser {
      name,
      email: email.trim().to_lowercase(),
      password,
      role_ids,
    })
    .await
    .context("failed to create user")?;

  tracing::info!(user_id = %user.user.user_id, email = %user.user.email, "user created");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
