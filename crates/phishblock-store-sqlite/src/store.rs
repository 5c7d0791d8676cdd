//! [`SqliteStore`], the SQLite implementation of [`ThreatStore`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};

use phishblock_core::{
  report::{NewReport, Report, ReportId, ReportStatus},
  store::{ReportPage, ReportQuery, Stats, ThreatStore, TOP_REPORTERS},
  user::{User, UserId},
  vote::{NewVote, Vote, VoteReceipt},
};

use crate::{
  Error, Result,
  encode::{
    REPORT_COLUMNS, RawListedReport, RawReport, RawUser, RawVote, USER_COLUMNS,
    decode_counts, encode_dt, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A PhishBlock store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What the vote transaction decided, computed on the connection thread.
enum VoteTx {
  Applied { upvotes: i64, downvotes: i64, reporter_id: i64 },
  MissingReport,
  MissingUser(i64),
  Duplicate,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers (run on the connection thread) ────────────────────────

fn select_report(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawReport>> {
  conn
    .query_row(
      &format!("SELECT {REPORT_COLUMNS} FROM reports r WHERE r.id = ?1"),
      rusqlite::params![id],
      RawReport::from_row,
    )
    .optional()
}

fn user_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM users WHERE id = ?1", rusqlite::params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

/// The single-statement signed increment. `None` if the user does not exist.
fn add_reputation(conn: &Connection, id: i64, amount: i64) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "UPDATE users SET reputation = reputation + ?2 WHERE id = ?1 RETURNING reputation",
      rusqlite::params![id, amount],
      |row| row.get(0),
    )
    .optional()
}

// ─── ThreatStore impl ────────────────────────────────────────────────────────

impl ThreatStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, username: String) -> Result<User> {
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let name       = username.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (username, reputation, created_at) VALUES (?1, 0, ?2)
           ON CONFLICT (username) DO NOTHING",
          rusqlite::params![name, at_str],
        )?;
        Ok((inserted == 1).then(|| conn.last_insert_rowid()))
      })
      .await?;

    let id = id.ok_or_else(|| phishblock_core::Error::UsernameTaken(username.clone()))?;
    Ok(User { id: UserId(id), username, reputation: 0, created_at })
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            rusqlite::params![id.0],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn increment_reputation(&self, id: UserId, amount: i64) -> Result<i64> {
    let updated = self
      .conn
      .call(move |conn| Ok(add_reputation(conn, id.0, amount)?))
      .await?;

    Ok(updated.ok_or(phishblock_core::Error::UserNotFound(id))?)
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn submit_report(&self, input: NewReport) -> Result<Report> {
    let created_at  = now();
    let at_str      = encode_dt(created_at);
    let kind_str    = input.kind.as_ref().to_owned();
    let status_str  = ReportStatus::Pending.as_ref().to_owned();
    let reporter    = input.reporter_id;
    let content     = input.content.clone();
    let notes       = input.notes.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        if !user_exists(conn, reporter.0)? {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO reports (
             type, content, notes, reporter_id, upvotes, downvotes, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?6)",
          rusqlite::params![kind_str, content, notes, reporter.0, status_str, at_str],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let id = id.ok_or(phishblock_core::Error::UserNotFound(reporter))?;

    Ok(Report {
      id:          ReportId(id),
      kind:        input.kind,
      content:     input.content,
      notes:       input.notes,
      reporter_id: reporter,
      upvotes:     0,
      downvotes:   0,
      status:      ReportStatus::Pending,
      flag_reason: None,
      created_at,
    })
  }

  async fn get_report(&self, id: ReportId) -> Result<Option<Report>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_report(conn, id.0)?))
      .await?;

    raw.map(RawReport::into_report).transpose()
  }

  async fn list_reports(&self, query: &ReportQuery) -> Result<ReportPage> {
    let status_str = query.status.map(|s| s.as_ref().to_owned());
    let kind_str   = query.kind.map(|k| k.as_ref().to_owned());
    let limit_val  = i64::from(query.limit);
    let offset_val = i64::try_from(query.offset())
      .map_err(|_| Error::Core(phishblock_core::Error::PageOutOfRange))?;

    let (total, raws): (i64, Vec<RawListedReport>) = self
      .conn
      .call(move |conn| {
        // Count and page from the same snapshot.
        let tx = conn.transaction()?;

        let filter = "(?1 IS NULL OR r.status = ?1) AND (?2 IS NULL OR r.type = ?2)";

        let total: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM reports r WHERE {filter}"),
          rusqlite::params![status_str, kind_str],
          |row| row.get(0),
        )?;

        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {REPORT_COLUMNS}, u.username
             FROM reports r
             JOIN users u ON u.id = r.reporter_id
             WHERE {filter}
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?3 OFFSET ?4"
          ))?;
          stmt
            .query_map(
              rusqlite::params![status_str, kind_str, limit_val, offset_val],
              RawListedReport::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok((total, rows))
      })
      .await?;

    let reports = raws
      .into_iter()
      .map(RawListedReport::into_listed)
      .collect::<Result<Vec<_>>>()?;
    let total = u64::try_from(total).map_err(|_| Error::Decode(format!("negative count: {total}")))?;

    Ok(ReportPage::new(reports, total, query))
  }

  async fn flag_report(&self, id: ReportId, reason: String) -> Result<Report> {
    let disputed = ReportStatus::Disputed.as_ref().to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE reports SET status = ?2, flag_reason = ?3 WHERE id = ?1",
          rusqlite::params![id.0, disputed, reason],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        let raw = select_report(&tx, id.0)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or(Error::Core(phishblock_core::Error::ReportNotFound(id)))?
      .into_report()
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn cast_vote(&self, input: NewVote) -> Result<VoteReceipt> {
    let NewVote { report_id, user_id, vote_type } = input;
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let type_str   = vote_type.as_ref().to_owned();
    let column     = vote_type.counter_column();
    let delta      = vote_type.reputation_delta();

    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front so a second process sharing
        // the file cannot interleave between the checks and the writes.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let reporter_id: Option<i64> = tx
          .query_row(
            "SELECT reporter_id FROM reports WHERE id = ?1",
            rusqlite::params![report_id.0],
            |row| row.get(0),
          )
          .optional()?;
        let Some(reporter_id) = reporter_id else {
          return Ok(VoteTx::MissingReport);
        };
        if !user_exists(&tx, user_id.0)? {
          return Ok(VoteTx::MissingUser(user_id.0));
        }

        // The primary key on (report_id, user_id) is the duplicate check.
        let inserted = tx.execute(
          "INSERT INTO votes (report_id, user_id, vote_type, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (report_id, user_id) DO NOTHING",
          rusqlite::params![report_id.0, user_id.0, type_str, at_str],
        )?;
        if inserted == 0 {
          return Ok(VoteTx::Duplicate);
        }

        let (upvotes, downvotes): (i64, i64) = tx.query_row(
          &format!(
            "UPDATE reports SET {column} = {column} + 1 WHERE id = ?1
             RETURNING upvotes, downvotes"
          ),
          rusqlite::params![report_id.0],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        if add_reputation(&tx, reporter_id, delta)?.is_none() {
          return Ok(VoteTx::MissingUser(reporter_id));
        }

        tx.commit()?;
        Ok(VoteTx::Applied { upvotes, downvotes, reporter_id })
      })
      .await?;

    match outcome {
      VoteTx::Applied { upvotes, downvotes, reporter_id } => Ok(VoteReceipt {
        vote: Vote { report_id, user_id, vote_type, created_at },
        upvotes,
        downvotes,
        reporter_id: UserId(reporter_id),
        reputation_delta: delta,
      }),
      VoteTx::MissingReport => Err(phishblock_core::Error::ReportNotFound(report_id).into()),
      VoteTx::MissingUser(id) => Err(phishblock_core::Error::UserNotFound(UserId(id)).into()),
      VoteTx::Duplicate => Err(
        phishblock_core::Error::AlreadyVoted { report: report_id, user: user_id }.into(),
      ),
    }
  }

  async fn get_vote(&self, report: ReportId, user: UserId) -> Result<Option<Vote>> {
    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT report_id, user_id, vote_type, created_at
             FROM votes WHERE report_id = ?1 AND user_id = ?2",
            rusqlite::params![report.0, user.0],
            |row| {
              Ok(RawVote {
                report_id:  row.get(0)?,
                user_id:    row.get(1)?,
                vote_type:  row.get(2)?,
                created_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<Stats> {
    let top_n = TOP_REPORTERS as i64;

    let (counts, top): (Vec<(String, i64)>, Vec<RawUser>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let counts = {
          let mut stmt = tx.prepare("SELECT status, COUNT(*) FROM reports GROUP BY status")?;
          stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let top = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY reputation DESC, id ASC LIMIT ?1"
          ))?;
          stmt
            .query_map(rusqlite::params![top_n], RawUser::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok((counts, top))
      })
      .await?;

    Ok(Stats::from_counts(
      decode_counts(counts)?,
      top.into_iter().map(RawUser::into_top_reporter).collect(),
    ))
  }
}
