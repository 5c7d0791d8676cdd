//! JSON REST API for PhishBlock.
//!
//! Exposes an axum [`Router`] backed by any [`phishblock_core::store::ThreatStore`].
//! Authentication, TLS, CORS and transport concerns are the caller's
//! responsibility; see [`identity`] for how an upstream proxy can pin the
//! acting user.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", phishblock_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod identity;
pub mod reports;
pub mod stats;
pub mod votes;

use std::sync::Arc;

use axum::{
  Json, Router,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use phishblock_core::store::ThreatStore;
use serde::Serialize;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ThreatStore + 'static,
{
  Router::new()
    .route("/health", get(stats::health))
    // Reports
    .route("/submit", post(reports::submit::<S>))
    .route("/reports", get(reports::list::<S>))
    .route("/flag", post(reports::flag::<S>))
    // Votes
    .route("/vote", post(votes::cast::<S>))
    // Dashboard
    .route("/stats", get(stats::handler::<S>))
    .with_state(store)
}

// ─── Success envelope ─────────────────────────────────────────────────────────

/// Wraps a serialisable map-like body as `{"success": true, ...body}`.
pub struct Success<T>(pub T);

#[derive(Serialize)]
struct Envelope<'a, T> {
  success: bool,
  #[serde(flatten)]
  body:    &'a T,
}

impl<T: Serialize> IntoResponse for Success<T> {
  fn into_response(self) -> Response {
    Json(Envelope { success: true, body: &self.0 }).into_response()
  }
}

/// `{"message": "..."}` body used by the write endpoints.
#[derive(Debug, Serialize)]
pub struct Message {
  pub message: &'static str,
}
