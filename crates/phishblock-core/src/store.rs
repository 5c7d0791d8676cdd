//! The `ThreatStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `phishblock-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  DomainError, Error, Result,
  report::{ListedReport, NewReport, Report, ReportId, ReportKind, ReportStatus},
  user::{TopReporter, User, UserId},
  vote::{NewVote, Vote, VoteReceipt},
};

/// Number of users returned in [`Stats::top_reporters`].
pub const TOP_REPORTERS: usize = 10;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ThreatStore::list_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
  pub status: Option<ReportStatus>,
  pub kind:   Option<ReportKind>,
  /// 1-indexed.
  pub page:   u32,
  pub limit:  u32,
}

impl ReportQuery {
  pub const DEFAULT_LIMIT: u32 = 20;

  /// Build a query, rejecting a zero page or limit and a page whose offset
  /// no store can address.
  pub fn new(page: u32, limit: u32) -> Result<Self> {
    if page == 0 {
      return Err(Error::InvalidPage);
    }
    if limit == 0 {
      return Err(Error::InvalidLimit);
    }
    let query = Self { status: None, kind: None, page, limit };
    if i64::try_from(query.offset()).is_err() {
      return Err(Error::PageOutOfRange);
    }
    Ok(query)
  }

  pub fn with_status(mut self, status: ReportStatus) -> Self {
    self.status = Some(status);
    self
  }

  pub fn with_kind(mut self, kind: ReportKind) -> Self {
    self.kind = Some(kind);
    self
  }

  /// Rows to skip before the requested page.
  pub fn offset(&self) -> u64 { (u64::from(self.page) - 1) * u64::from(self.limit) }
}

impl Default for ReportQuery {
  fn default() -> Self {
    Self { status: None, kind: None, page: 1, limit: Self::DEFAULT_LIMIT }
  }
}

/// One page of [`ListedReport`]s plus the pre-pagination total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPage {
  pub reports: Vec<ListedReport>,
  pub total:   u64,
  pub page:    u32,
  pub limit:   u32,
  pub pages:   u64,
}

impl ReportPage {
  pub fn new(reports: Vec<ListedReport>, total: u64, query: &ReportQuery) -> Self {
    Self {
      reports,
      total,
      page: query.page,
      limit: query.limit,
      pages: page_count(total, query.limit),
    }
  }

  /// A page with no matches, e.g. for a filter value no report can carry.
  pub fn empty(query: &ReportQuery) -> Self { Self::new(Vec::new(), 0, query) }
}

/// `ceil(total / limit)`; zero when there is nothing to page through.
pub fn page_count(total: u64, limit: u32) -> u64 {
  total.div_ceil(u64::from(limit.max(1)))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total_reports: u64,
  pub verified:      u64,
  pub pending:       u64,
  pub disputed:      u64,
  pub top_reporters: Vec<TopReporter>,
}

impl Stats {
  /// Fold grouped `(status, count)` rows into the per-status totals.
  pub fn from_counts(
    counts: impl IntoIterator<Item = (ReportStatus, u64)>,
    top_reporters: Vec<TopReporter>,
  ) -> Self {
    let mut stats = Self { top_reporters, ..Self::default() };
    for (status, n) in counts {
      stats.total_reports += n;
      match status {
        ReportStatus::Verified => stats.verified += n,
        ReportStatus::Pending => stats.pending += n,
        ReportStatus::Disputed => stats.disputed += n,
      }
    }
    stats
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a PhishBlock store backend.
///
/// Every method is a single logical unit: a backend must apply all of a
/// method's effects or none of them. In particular
/// [`cast_vote`](Self::cast_vote) must make the duplicate check, the vote
/// insert, the counter increment and the reputation change one atomic step.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ThreatStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user with zero reputation. Fails if the username is taken.
  fn add_user(
    &self,
    username: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Atomically add `amount` (which may be negative) to a user's reputation
  /// and return the new value.
  fn increment_reputation(
    &self,
    id: UserId,
    amount: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Persist a new `pending` report with zero votes and return it.
  fn submit_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  /// Retrieve a report by id. Returns `None` if not found.
  fn get_report(
    &self,
    id: ReportId,
  ) -> impl Future<Output = Result<Option<Report>, Self::Error>> + Send + '_;

  /// Newest-first page of reports matching `query`, joined with the
  /// reporter's username.
  fn list_reports<'a>(
    &'a self,
    query: &'a ReportQuery,
  ) -> impl Future<Output = Result<ReportPage, Self::Error>> + Send + 'a;

  /// Mark a report `disputed` and record `reason` verbatim. Re-flagging
  /// overwrites the reason.
  fn flag_report(
    &self,
    id: ReportId,
    reason: String,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Record a vote, bump the matching counter and adjust the reporter's
  /// reputation, all or nothing.
  ///
  /// Returns [`Error::AlreadyVoted`] (wrapped in the backend error) when
  /// the user has already voted on the report; nothing changes in that case.
  fn cast_vote(
    &self,
    input: NewVote,
  ) -> impl Future<Output = Result<VoteReceipt, Self::Error>> + Send + '_;

  /// The vote `user` cast on `report`, if any.
  fn get_vote(
    &self,
    report: ReportId,
    user: UserId,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Report counts by status plus the [`TOP_REPORTERS`] highest-reputation
  /// users.
  fn stats(&self) -> impl Future<Output = Result<Stats, Self::Error>> + Send + '_;
}
