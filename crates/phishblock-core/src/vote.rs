//! Votes and the reputation they move.
//!
//! A user may vote once per report; votes are never changed or retracted.
//! Each accepted vote bumps one counter on the report and adjusts the
//! reporter's reputation by a fixed delta.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, report::ReportId, user::UserId};

/// Reputation awarded to the reporter for an upvote.
pub const UPVOTE_REPUTATION: i64 = 5;
/// Reputation taken from the reporter for a downvote.
pub const DOWNVOTE_REPUTATION: i64 = -3;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoteType {
  Up,
  Down,
}

impl VoteType {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::InvalidVoteType(s.to_owned()))
  }

  /// Signed change applied to the reporter's reputation.
  pub fn reputation_delta(self) -> i64 {
    match self {
      Self::Up => UPVOTE_REPUTATION,
      Self::Down => DOWNVOTE_REPUTATION,
    }
  }

  /// The `reports` counter column this vote increments.
  pub fn counter_column(self) -> &'static str {
    match self {
      Self::Up => "upvotes",
      Self::Down => "downvotes",
    }
  }
}

/// An immutable vote. At most one exists per `(report_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
  pub report_id:  ReportId,
  pub user_id:    UserId,
  pub vote_type:  VoteType,
  pub created_at: DateTime<Utc>,
}

/// Input to [`ThreatStore::cast_vote`](crate::store::ThreatStore::cast_vote).
#[derive(Debug, Clone, Copy)]
pub struct NewVote {
  pub report_id: ReportId,
  pub user_id:   UserId,
  pub vote_type: VoteType,
}

/// Everything a committed vote changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
  pub vote:             Vote,
  /// Report counters after the vote was applied.
  pub upvotes:          i64,
  pub downvotes:        i64,
  pub reporter_id:      UserId,
  pub reputation_delta: i64,
}
