//! Handler for `POST /vote`.
//!
//! Body: `{"reportId": 1, "userId": 2, "voteType": "up" | "down"}`. A user
//! votes at most once per report; a repeat is a 400 with
//! `"Already voted on this report"` and changes nothing.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use phishblock_core::{
  Error,
  report::ReportId,
  store::ThreatStore,
  user::UserId,
  vote::{NewVote, VoteType},
};
use serde::Deserialize;

use crate::{Message, Success, error::ApiError, identity::Identity, reports::present};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub report_id: Option<ReportId>,
  pub user_id:   Option<UserId>,
  pub vote_type: Option<String>,
}

/// `POST /vote`
pub async fn cast<S>(
  State(store): State<Arc<S>>,
  identity: Identity,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Success<Message>, ApiError>
where
  S: ThreatStore,
{
  let Json(body) = body?;

  let (Some(report_id), Some(vote_type)) = (body.report_id, present(body.vote_type)) else {
    return Err(Error::MissingField("reportId/voteType").into());
  };
  let user_id = identity.resolve(body.user_id)?;
  let vote_type = VoteType::parse(&vote_type)?;

  let receipt = store
    .cast_vote(NewVote { report_id, user_id, vote_type })
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    report = %report_id,
    user = %user_id,
    vote = %vote_type,
    reporter = %receipt.reporter_id,
    reputation_delta = receipt.reputation_delta,
    "vote recorded"
  );

  Ok(Success(Message { message: "Vote recorded successfully" }))
}
