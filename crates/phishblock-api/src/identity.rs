//! Caller identity.
//!
//! The API does not authenticate anyone. A trust boundary in front of it (an
//! auth proxy, an API gateway) may set [`IDENTITY_HEADER`] to the
//! authenticated user's id; when present it takes precedence over the
//! `reporterId`/`userId` carried in request bodies.

use axum::{extract::FromRequestParts, http::request::Parts};
use phishblock_core::user::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// The user id asserted by the trust boundary, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity(pub Option<UserId>);

impl Identity {
  /// Resolve the acting user: the header wins over the body-supplied id.
  pub fn resolve(self, from_body: Option<UserId>) -> Result<UserId, ApiError> {
    self
      .0
      .or(from_body)
      .ok_or_else(|| ApiError::Validation("Missing required fields".to_owned()))
  }
}

impl<S> FromRequestParts<S> for Identity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(IDENTITY_HEADER) else {
      return Ok(Identity(None));
    };
    let id = value
      .to_str()
      .ok()
      .and_then(|s| s.trim().parse::<i64>().ok())
      .ok_or_else(|| ApiError::Validation(format!("invalid {IDENTITY_HEADER} header")))?;
    Ok(Identity(Some(UserId(id))))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  async fn extract(header: Option<&str>) -> Result<Identity, ApiError> {
    let mut builder = Request::builder().uri("/api/vote");
    if let Some(h) = header {
      builder = builder.header(IDENTITY_HEADER, h);
    }
    let (mut parts, ()) = builder.body(()).unwrap().into_parts();
    Identity::from_request_parts(&mut parts, &()).await
  }

  #[tokio::test]
  async fn header_overrides_body() {
    let id = extract(Some("42")).await.unwrap();
    assert_eq!(id.resolve(Some(UserId(1))).unwrap(), UserId(42));
  }

  #[tokio::test]
  async fn absent_header_falls_back_to_body() {
    let id = extract(None).await.unwrap();
    assert_eq!(id.resolve(Some(UserId(1))).unwrap(), UserId(1));
    assert!(matches!(id.resolve(None), Err(ApiError::Validation(_))));
  }

  #[tokio::test]
  async fn malformed_header_is_rejected() {
    assert!(matches!(extract(Some("alice")).await, Err(ApiError::Validation(_))));
  }
}
