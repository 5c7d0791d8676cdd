//! Users and their reputation.
//!
//! Accounts are created outside the request path (authentication is not this
//! crate's concern). The only mutation a user sees during normal operation is
//! a reputation change triggered by a vote on one of their reports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         UserId,
  /// Unique display name.
  pub username:   String,
  /// Starts at 0; moves only through vote-driven increments.
  pub reputation: i64,
  pub created_at: DateTime<Utc>,
}

/// One row of the leaderboard returned with [`Stats`](crate::store::Stats).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopReporter {
  pub username:   String,
  pub reputation: i64,
}
