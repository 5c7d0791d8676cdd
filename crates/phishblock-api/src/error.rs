//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the handler as `{"success": false, "error": "..."}`.
//! Validation and duplicate-vote conflicts are 400; anything the store
//! raises (including a missing report or user) is 500.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use phishblock_core::DomainError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation error: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure, surfacing duplicate votes as conflicts.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match err.domain() {
      Some(e) if e.is_conflict() => Self::Conflict(conflict_message(e)),
      Some(e) if e.is_validation() => Self::Validation(validation_message(e)),
      _ => Self::Store(Box::new(err)),
    }
  }
}

fn validation_message(e: &phishblock_core::Error) -> String {
  use phishblock_core::Error as E;
  match e {
    E::MissingField(_) => "Missing required fields".to_owned(),
    E::InvalidReportType(_) => "Invalid type".to_owned(),
    E::InvalidVoteType(_) => "Invalid vote type".to_owned(),
    E::NotDefanged(_) => "URL must start with hxxp:// or hxxps://".to_owned(),
    other => other.to_string(),
  }
}

fn conflict_message(e: &phishblock_core::Error) -> String {
  match e {
    phishblock_core::Error::AlreadyVoted { .. } => "Already voted on this report".to_owned(),
    other => other.to_string(),
  }
}

impl From<phishblock_core::Error> for ApiError {
  fn from(e: phishblock_core::Error) -> Self { Self::from_store(e) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::Validation(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::Validation(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "success": false, "error": message }))).into_response()
  }
}
