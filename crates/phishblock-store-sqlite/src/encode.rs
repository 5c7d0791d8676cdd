//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! and a `Z` suffix, so lexical order matches chronological order. Enums are
//! stored as their lowercase names.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use phishblock_core::{
  report::{ListedReport, Report, ReportId, ReportKind, ReportStatus},
  user::{TopReporter, User, UserId},
  vote::{Vote, VoteType},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision [`encode_dt`] keeps, so a freshly
/// created record equals the one read back.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_kind(s: &str) -> Result<ReportKind> {
  ReportKind::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

pub fn decode_status(s: &str) -> Result<ReportStatus> {
  ReportStatus::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

fn decode_vote_type(s: &str) -> Result<VoteType> {
  VoteType::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

fn decode_count(column: &str, n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative {column}: {n}")))
}

pub fn decode_counts(rows: Vec<(String, i64)>) -> Result<Vec<(ReportStatus, u64)>> {
  rows
    .into_iter()
    .map(|(status, n)| Ok((decode_status(&status)?, decode_count("count", n)?)))
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a `users` row, in order.
pub const USER_COLUMNS: &str = "id, username, reputation, created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:         i64,
  pub username:   String,
  pub reputation: i64,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      username:   row.get(1)?,
      reputation: row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         UserId(self.id),
      username:   self.username,
      reputation: self.reputation,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_top_reporter(self) -> TopReporter {
    TopReporter { username: self.username, reputation: self.reputation }
  }
}

/// Columns selected for a `reports` row aliased `r`, in order.
pub const REPORT_COLUMNS: &str = "r.id, r.type, r.content, r.notes, r.reporter_id, \
   r.upvotes, r.downvotes, r.status, r.flag_reason, r.created_at";

/// Raw values read directly from a `reports` row.
pub struct RawReport {
  pub id:          i64,
  pub kind:        String,
  pub content:     String,
  pub notes:       Option<String>,
  pub reporter_id: i64,
  pub upvotes:     i64,
  pub downvotes:   i64,
  pub status:      String,
  pub flag_reason: Option<String>,
  pub created_at:  String,
}

impl RawReport {
  /// Read the [`REPORT_COLUMNS`] starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      kind:        row.get(1)?,
      content:     row.get(2)?,
      notes:       row.get(3)?,
      reporter_id: row.get(4)?,
      upvotes:     row.get(5)?,
      downvotes:   row.get(6)?,
      status:      row.get(7)?,
      flag_reason: row.get(8)?,
      created_at:  row.get(9)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      id:          ReportId(self.id),
      kind:        decode_kind(&self.kind)?,
      content:     self.content,
      notes:       self.notes,
      reporter_id: UserId(self.reporter_id),
      upvotes:     self.upvotes,
      downvotes:   self.downvotes,
      status:      decode_status(&self.status)?,
      flag_reason: self.flag_reason,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// A `reports` row joined with the reporter's username (column 10).
pub struct RawListedReport {
  pub report:            RawReport,
  pub reporter_username: String,
}

impl RawListedReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report:            RawReport::from_row(row)?,
      reporter_username: row.get(10)?,
    })
  }

  pub fn into_listed(self) -> Result<ListedReport> {
    Ok(ListedReport::new(self.report.into_report()?, self.reporter_username))
  }
}

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub report_id:  i64,
  pub user_id:    i64,
  pub vote_type:  String,
  pub created_at: String,
}

impl RawVote {
  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      report_id:  ReportId(self.report_id),
      user_id:    UserId(self.user_id),
      vote_type:  decode_vote_type(&self.vote_type)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
