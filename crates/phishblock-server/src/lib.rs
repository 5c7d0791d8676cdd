//! Server assembly for PhishBlock: configuration, CORS and tracing layers
//! around the JSON API.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  http::{HeaderName, HeaderValue, Method, header, header::InvalidHeaderValue},
};
use phishblock_api::identity::IDENTITY_HEADER;
use phishblock_core::store::ThreatStore;
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, read from an optional TOML file and
/// `PHISHBLOCK_*` environment variables (which win).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Allowed browser origins. Empty allows any origin.
  #[serde(default)]
  pub cors_origins: Vec<String>,
}

impl ServerConfig {
  pub const DEFAULT_PORT: u16 = 3001;

  /// Layer defaults, the file at `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", i64::from(Self::DEFAULT_PORT))?
      .set_default("store_path", "phishblock.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("PHISHBLOCK")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~/` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  /// CORS policy for the configured origins.
  pub fn cors_layer(&self) -> Result<CorsLayer, InvalidHeaderValue> {
    if self.cors_origins.is_empty() {
      return Ok(CorsLayer::permissive());
    }
    let origins = self
      .cors_origins
      .iter()
      .map(|o| HeaderValue::from_str(o))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(
      CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(IDENTITY_HEADER)]),
    )
  }
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

/// The full application: the API under `/api`, wrapped in CORS and
/// per-request tracing.
pub fn app<S>(store: Arc<S>, cors: CorsLayer) -> Router
where
  S: ThreatStore + 'static,
{
  Router::new()
    .nest("/api", phishblock_api::api_router(store))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}
