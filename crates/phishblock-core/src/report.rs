//! Reports: a suspected phishing URL or scam wallet submitted by a user.
//!
//! A report is created `pending` with zero votes. Votes only ever increase
//! its counters, and flagging moves it to `disputed`. `verified` exists in
//! the data model but no operation in this crate produces it; promotion is an
//! administrative concern handled elsewhere.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, defang::is_defanged, user::UserId};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned report identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl fmt::Display for ReportId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// What is being reported.
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
pub enum ReportKind {
  /// A defanged phishing URL.
  Url,
  /// A scam wallet address.
  Wallet,
}

impl ReportKind {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::InvalidReportType(s.to_owned()))
  }
}

/// Community review state of a report.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportStatus {
  #[default]
  Pending,
  Verified,
  Disputed,
}

impl ReportStatus {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::InvalidReportStatus(s.to_owned()))
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub id:          ReportId,
  #[serde(rename = "type")]
  pub kind:        ReportKind,
  pub content:     String,
  pub notes:       Option<String>,
  pub reporter_id: UserId,
  pub upvotes:     i64,
  pub downvotes:   i64,
  pub status:      ReportStatus,
  /// Set when the report is flagged; `None` until then.
  pub flag_reason: Option<String>,
  /// Server-assigned; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

impl Report {
  /// Confidence score shown to users: upvotes minus downvotes.
  pub fn score(&self) -> i64 { self.upvotes - self.downvotes }
}

/// A report as returned by listings: joined with the reporter's username and
/// carrying the derived score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedReport {
  #[serde(flatten)]
  pub report:            Report,
  pub reporter_username: String,
  pub score:             i64,
}

impl ListedReport {
  pub fn new(report: Report, reporter_username: String) -> Self {
    let score = report.score();
    Self { report, reporter_username, score }
  }
}

// ─── NewReport ───────────────────────────────────────────────────────────────

/// Validated input to
/// [`ThreatStore::submit_report`](crate::store::ThreatStore::submit_report).
///
/// Counters, status and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewReport {
  pub kind:        ReportKind,
  pub content:     String,
  pub notes:       Option<String>,
  pub reporter_id: UserId,
}

impl NewReport {
  /// Validate a submission. Content and notes are kept verbatim.
  ///
  /// Content must be non-empty and `url` content must be defanged. Empty
  /// notes become `None`.
  pub fn new(
    kind: ReportKind,
    content: &str,
    notes: Option<&str>,
    reporter_id: UserId,
  ) -> Result<Self> {
    if content.is_empty() {
      return Err(Error::MissingField("content"));
    }
    if kind == ReportKind::Url && !is_defanged(content) {
      return Err(Error::NotDefanged(content.to_owned()));
    }

    let notes = notes.filter(|n| !n.is_empty()).map(str::to_owned);

    Ok(Self { kind, content: content.to_owned(), notes, reporter_id })
  }
}
