//! Handlers for report endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/submit` | Body: [`SubmitBody`]; returns 201 + `report` |
//! | `GET`  | `/reports` | Optional `page`, `limit`, `status`, `type` |
//! | `POST` | `/flag` | Body: [`FlagBody`]; marks the report disputed |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use phishblock_core::{
  Error,
  report::{NewReport, Report, ReportId, ReportKind, ReportStatus},
  store::{ReportPage, ReportQuery, ThreatStore},
  user::UserId,
};
use serde::{Deserialize, Serialize};

use crate::{Message, Success, error::ApiError, identity::Identity};

/// Treat absent and empty strings alike.
pub(crate) fn present(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.is_empty())
}

// ─── Submit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submit`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
  #[serde(rename = "type")]
  pub kind:        Option<String>,
  pub content:     Option<String>,
  pub notes:       Option<String>,
  pub reporter_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct Submitted {
  pub report: Report,
}

/// `POST /submit` returns 201 + `{"success": true, "report": ...}`.
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  identity: Identity,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ThreatStore,
{
  let Json(body) = body?;

  let (Some(kind), Some(content)) = (present(body.kind), present(body.content)) else {
    return Err(Error::MissingField("type/content").into());
  };
  let reporter = identity.resolve(body.reporter_id)?;
  let kind = ReportKind::parse(&kind)?;
  let input = NewReport::new(kind, &content, body.notes.as_deref(), reporter)?;

  let report = store.submit_report(input).await.map_err(ApiError::from_store)?;
  tracing::info!(report = %report.id, reporter = %reporter, kind = %report.kind, "report submitted");

  Ok((StatusCode::CREATED, Success(Submitted { report })))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// 1-indexed; defaults to 1.
  pub page:   Option<u32>,
  /// Defaults to [`ReportQuery::DEFAULT_LIMIT`].
  pub limit:  Option<u32>,
  pub status: Option<String>,
  #[serde(rename = "type")]
  pub kind:   Option<String>,
}

/// `GET /reports[?page=..][&limit=..][&status=..][&type=..]`
///
/// A filter value no report can carry matches nothing; it is not an error.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Success<ReportPage>, ApiError>
where
  S: ThreatStore,
{
  let Query(params) = params?;

  let mut query = ReportQuery::new(
    params.page.unwrap_or(1),
    params.limit.unwrap_or(ReportQuery::DEFAULT_LIMIT),
  )?;

  if let Some(status) = present(params.status) {
    match ReportStatus::parse(&status) {
      Ok(s) => query = query.with_status(s),
      Err(_) => return Ok(Success(ReportPage::empty(&query))),
    }
  }
  if let Some(kind) = present(params.kind) {
    match ReportKind::parse(&kind) {
      Ok(k) => query = query.with_kind(k),
      Err(_) => return Ok(Success(ReportPage::empty(&query))),
    }
  }

  let page = store.list_reports(&query).await.map_err(ApiError::from_store)?;
  Ok(Success(page))
}

// ─── Flag ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /flag`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagBody {
  pub report_id: Option<ReportId>,
  pub reason:    Option<String>,
  pub user_id:   Option<UserId>,
}

/// `POST /flag` sets the report `disputed` and stores `reason` verbatim.
///
/// Any user may flag any report; there is no ownership check.
pub async fn flag<S>(
  State(store): State<Arc<S>>,
  identity: Identity,
  body: Result<Json<FlagBody>, JsonRejection>,
) -> Result<Success<Message>, ApiError>
where
  S: ThreatStore,
{
  let Json(body) = body?;

  let (Some(report_id), Some(reason)) = (body.report_id, present(body.reason)) else {
    return Err(Error::MissingField("reportId/reason").into());
  };
  let user = identity.resolve(body.user_id)?;

  store
    .flag_report(report_id, reason)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(report = %report_id, user = %user, "report flagged");

  Ok(Success(Message { message: "Report flagged successfully" }))
}
