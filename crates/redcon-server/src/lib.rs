//! HTTP server wiring for redcon.
//!
//! Loads [`ServerConfig`] and mounts [`redcon_api::api_router`] under `/api`
//! with request tracing.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use config::{Config, ConfigError, Environment, File, FileFormat};
use redcon_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `REDCON_PORT=9000`.
pub const ENV_PREFIX: &str = "REDCON";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  /// Read `path` if it exists, then apply `REDCON_*` overrides.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  /// Parse a TOML document with no environment overrides.
  pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from_str(text, FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, every request traced.
pub fn router(store: Arc<SqliteStore>) -> Router {
  Router::new()
    .nest("/api", redcon_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
