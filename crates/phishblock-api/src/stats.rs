//! Dashboard and liveness handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use phishblock_core::store::{Stats, ThreatStore};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{Success, error::ApiError};

/// `GET /health`, no store access.
pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "message": "PhishBlock API is running" }))
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
  pub stats: Stats,
}

/// `GET /stats`: report counts by status and the top reporters.
pub async fn handler<S>(State(store): State<Arc<S>>) -> Result<Success<StatsBody>, ApiError>
where
  S: ThreatStore,
{
  let stats = store.stats().await.map_err(ApiError::from_store)?;
  Ok(Success(StatsBody { stats }))
}
