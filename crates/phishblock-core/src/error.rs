//! Error types for `phishblock-core`.

use thiserror::Error;

use crate::{report::ReportId, user::UserId};

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ──────────────────────────────────────────────────────────
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid report type: {0:?}")]
  InvalidReportType(String),

  #[error("invalid report status: {0:?}")]
  InvalidReportStatus(String),

  #[error("invalid vote type: {0:?}")]
  InvalidVoteType(String),

  #[error("url is not defanged (expected hxxp:// or hxxps://): {0:?}")]
  NotDefanged(String),

  #[error("page must be at least 1")]
  InvalidPage,

  #[error("limit must be at least 1")]
  InvalidLimit,

  #[error("page is out of range")]
  PageOutOfRange,

  // ── Conflict ────────────────────────────────────────────────────────────
  #[error("user {user} already voted on report {report}")]
  AlreadyVoted { report: ReportId, user: UserId },

  // ── Store-level ─────────────────────────────────────────────────────────
  #[error("report not found: {0}")]
  ReportNotFound(ReportId),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),
}

impl Error {
  /// Malformed or missing caller input.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingField(_)
        | Self::InvalidReportType(_)
        | Self::InvalidReportStatus(_)
        | Self::InvalidVoteType(_)
        | Self::NotDefanged(_)
        | Self::InvalidPage
        | Self::InvalidLimit
        | Self::PageOutOfRange
    )
  }

  /// The request collided with existing state (a duplicate vote).
  pub fn is_conflict(&self) -> bool {
    matches!(self, Self::AlreadyVoted { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so that callers holding only a
/// [`ThreatStore`](crate::store::ThreatStore) can recover the domain error
/// (duplicate vote, missing report, ...) behind a backend failure.
pub trait DomainError {
  /// The wrapped domain error, or `None` for pure backend failures.
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_duplicate_votes_conflict() {
    let dup = Error::AlreadyVoted { report: ReportId(1), user: UserId(2) };
    assert!(dup.is_conflict());
    assert!(!dup.is_validation());

    let taken = Error::UsernameTaken("alice".into());
    assert!(!taken.is_conflict());
    assert!(!taken.is_validation());
  }

  #[test]
  fn page_out_of_range_is_validation() {
    assert!(Error::PageOutOfRange.is_validation());
    assert_eq!(Error::PageOutOfRange.to_string(), "page is out of range");
  }
}
