//! Integration tests for `SqliteStore` against an in-memory database.

use phishblock_core::{
  Error as CoreError,
  report::{NewReport, ReportId, ReportKind, ReportStatus},
  store::{ReportQuery, ThreatStore},
  user::{User, UserId},
  vote::{NewVote, VoteType},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.add_user(name.into()).await.unwrap()
}

fn url_report(reporter: UserId, content: &str) -> NewReport {
  NewReport::new(ReportKind::Url, content, None, reporter).unwrap()
}

fn wallet_report(reporter: UserId, content: &str) -> NewReport {
  NewReport::new(ReportKind::Wallet, content, Some("seen in a DM"), reporter).unwrap()
}

fn vote(report: ReportId, user: UserId, vote_type: VoteType) -> NewVote {
  NewVote { report_id: report, user_id: user, vote_type }
}

fn core_err(err: &Error) -> &CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;

  let alice = user(&s, "alice").await;
  assert_eq!(alice.reputation, 0);

  let fetched = s.get_user(alice.id).await.unwrap().unwrap();
  assert_eq!(fetched.username, "alice");
  assert_eq!(fetched.reputation, 0);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  user(&s, "alice").await;

  let err = s.add_user("alice".into()).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::UsernameTaken(n) if n == "alice"));
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(UserId(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn increment_reputation_is_signed() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  assert_eq!(s.increment_reputation(alice.id, 5).await.unwrap(), 5);
  assert_eq!(s.increment_reputation(alice.id, -8).await.unwrap(), -3);

  let err = s.increment_reputation(UserId(404), 1).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::UserNotFound(UserId(404))));
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submitted_report_starts_pending_with_no_votes() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let report = s
    .submit_report(url_report(alice.id, "hxxps://evil.example"))
    .await
    .unwrap();
  assert_eq!(report.upvotes, 0);
  assert_eq!(report.downvotes, 0);
  assert_eq!(report.status, ReportStatus::Pending);
  assert!(report.flag_reason.is_none());

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(stored.content, "hxxps://evil.example");
  assert_eq!(stored.kind, ReportKind::Url);
  assert_eq!(stored.reporter_id, alice.id);
  assert_eq!(stored.created_at, report.created_at);
}

#[tokio::test]
async fn submit_for_unknown_reporter_fails_without_insert() {
  let s = store().await;

  let err = s
    .submit_report(url_report(UserId(9), "hxxp://x.example"))
    .await
    .unwrap_err();
  assert!(matches!(core_err(&err), CoreError::UserNotFound(UserId(9))));

  let page = s.list_reports(&ReportQuery::default()).await.unwrap();
  assert_eq!(page.total, 0);
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_newest_first_with_username() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let first = s.submit_report(url_report(alice.id, "hxxp://one.example")).await.unwrap();
  let second = s.submit_report(wallet_report(alice.id, "0xabc")).await.unwrap();

  let page = s.list_reports(&ReportQuery::default()).await.unwrap();
  assert_eq!(page.total, 2);
  assert_eq!(page.pages, 1);
  assert_eq!(page.reports[0].report.id, second.id);
  assert_eq!(page.reports[1].report.id, first.id);
  assert!(page.reports.iter().all(|r| r.reporter_username == "alice"));
  assert_eq!(page.reports[0].report.notes.as_deref(), Some("seen in a DM"));
}

#[tokio::test]
async fn list_paginates_and_counts_before_paging() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  for i in 0..5 {
    s.submit_report(wallet_report(alice.id, &format!("0x{i}")))
      .await
      .unwrap();
  }

  let q = ReportQuery::new(2, 2).unwrap();
  let page = s.list_reports(&q).await.unwrap();
  assert_eq!(page.total, 5);
  assert_eq!(page.pages, 3);
  assert_eq!(page.page, 2);
  assert_eq!(page.limit, 2);
  let contents: Vec<_> = page.reports.iter().map(|r| r.report.content.as_str()).collect();
  assert_eq!(contents, ["0x2", "0x1"]);

  let past_end = s.list_reports(&ReportQuery::new(9, 2).unwrap()).await.unwrap();
  assert!(past_end.reports.is_empty());
  assert_eq!(past_end.total, 5);
}

#[tokio::test]
async fn list_filters_by_status_and_type() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let url = s.submit_report(url_report(alice.id, "hxxp://a.example")).await.unwrap();
  s.submit_report(url_report(alice.id, "hxxp://b.example")).await.unwrap();
  s.submit_report(wallet_report(alice.id, "0xdead")).await.unwrap();
  s.flag_report(url.id, "legit bank".into()).await.unwrap();

  let disputed = s
    .list_reports(&ReportQuery::default().with_status(ReportStatus::Disputed))
    .await
    .unwrap();
  assert_eq!(disputed.total, 1);
  assert!(disputed.reports.iter().all(|r| r.report.status == ReportStatus::Disputed));

  let pending_urls = s
    .list_reports(
      &ReportQuery::default()
        .with_status(ReportStatus::Pending)
        .with_kind(ReportKind::Url),
    )
    .await
    .unwrap();
  assert_eq!(pending_urls.total, 1);
  assert_eq!(pending_urls.reports[0].report.content, "hxxp://b.example");

  let verified = s
    .list_reports(&ReportQuery::default().with_status(ReportStatus::Verified))
    .await
    .unwrap();
  assert_eq!(verified.total, 0);
  assert_eq!(verified.pages, 0);
}

// ─── Voting ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upvote_bumps_counter_and_reputation() {
  let s = store().await;
  let reporter = user(&s, "reporter").await;
  let voter = user(&s, "voter").await;
  let report = s
    .submit_report(url_report(reporter.id, "hxxps://evil.example"))
    .await
    .unwrap();

  let receipt = s.cast_vote(vote(report.id, voter.id, VoteType::Up)).await.unwrap();
  assert_eq!(receipt.upvotes, 1);
  assert_eq!(receipt.downvotes, 0);
  assert_eq!(receipt.reporter_id, reporter.id);
  assert_eq!(receipt.reputation_delta, 5);

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!((stored.upvotes, stored.downvotes), (1, 0));
  assert_eq!(s.get_user(reporter.id).await.unwrap().unwrap().reputation, 5);
  assert_eq!(s.get_user(voter.id).await.unwrap().unwrap().reputation, 0);

  let v = s.get_vote(report.id, voter.id).await.unwrap().unwrap();
  assert_eq!(v.vote_type, VoteType::Up);
}

#[tokio::test]
async fn downvote_costs_reputation() {
  let s = store().await;
  let reporter = user(&s, "reporter").await;
  let voter = user(&s, "voter").await;
  let report = s.submit_report(wallet_report(reporter.id, "0x1")).await.unwrap();

  s.cast_vote(vote(report.id, voter.id, VoteType::Down)).await.unwrap();

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!((stored.upvotes, stored.downvotes), (0, 1));
  assert_eq!(s.get_user(reporter.id).await.unwrap().unwrap().reputation, -3);
}

#[tokio::test]
async fn second_vote_conflicts_and_changes_nothing() {
  let s = store().await;
  let reporter = user(&s, "reporter").await;
  let voter = user(&s, "voter").await;
  let report = s.submit_report(url_report(reporter.id, "hxxp://x.example")).await.unwrap();

  s.cast_vote(vote(report.id, voter.id, VoteType::Up)).await.unwrap();

  // Same pair, even with the other vote type.
  for vt in [VoteType::Up, VoteType::Down] {
    let err = s.cast_vote(vote(report.id, voter.id, vt)).await.unwrap_err();
    let core = core_err(&err);
    assert!(core.is_conflict());
    assert!(matches!(core, CoreError::AlreadyVoted { report: r, user: u }
      if *r == report.id && *u == voter.id));
  }

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!((stored.upvotes, stored.downvotes), (1, 0));
  assert_eq!(s.get_user(reporter.id).await.unwrap().unwrap().reputation, 5);
  assert_eq!(
    s.get_vote(report.id, voter.id).await.unwrap().unwrap().vote_type,
    VoteType::Up
  );
}

#[tokio::test]
async fn vote_on_missing_report_or_by_missing_user_fails() {
  let s = store().await;
  let reporter = user(&s, "reporter").await;
  let report = s.submit_report(url_report(reporter.id, "hxxp://x.example")).await.unwrap();

  let err = s
    .cast_vote(vote(ReportId(999), reporter.id, VoteType::Up))
    .await
    .unwrap_err();
  assert!(matches!(core_err(&err), CoreError::ReportNotFound(ReportId(999))));

  let err = s
    .cast_vote(vote(report.id, UserId(999), VoteType::Up))
    .await
    .unwrap_err();
  assert!(matches!(core_err(&err), CoreError::UserNotFound(UserId(999))));

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(stored.upvotes, 0);
  assert_eq!(s.get_user(reporter.id).await.unwrap().unwrap().reputation, 0);
}

#[tokio::test]
async fn concurrent_votes_from_distinct_users_are_all_counted() {
  let s = store().await;
  let reporter = user(&s, "reporter").await;
  let report = s.submit_report(url_report(reporter.id, "hxxp://x.example")).await.unwrap();

  let mut voters = Vec::new();
  for i in 0..20 {
    voters.push(user(&s, &format!("voter{i}")).await.id);
  }

  let handles: Vec<_> = voters
    .into_iter()
    .enumerate()
    .map(|(i, voter)| {
      let s = s.clone();
      let vt = if i % 4 == 0 { VoteType::Down } else { VoteType::Up };
      tokio::spawn(async move { s.cast_vote(vote(report.id, voter, vt)).await })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap();
  }

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!((stored.upvotes, stored.downvotes), (15, 5));
  assert_eq!(
    s.get_user(reporter.id).await.unwrap().unwrap().reputation,
    15 * 5 - 5 * 3
  );
}

#[tokio::test]
async fn concurrent_duplicate_votes_admit_exactly_one() {
  let s = store().await;
  let reporter = user(&s, "reporter").await;
  let voter = user(&s, "voter").await;
  let report = s.submit_report(url_report(reporter.id, "hxxp://x.example")).await.unwrap();

  let handles: Vec<_> = (0..10)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.cast_vote(vote(report.id, voter.id, VoteType::Up)).await })
    })
    .collect();

  let mut ok = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => ok += 1,
      Err(e) => assert!(core_err(&e).is_conflict()),
    }
  }
  assert_eq!(ok, 1);

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(stored.upvotes, 1);
  assert_eq!(s.get_user(reporter.id).await.unwrap().unwrap().reputation, 5);
}

#[tokio::test]
async fn returned_records_match_stored_records() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  assert_eq!(s.get_user(alice.id).await.unwrap().unwrap().created_at, alice.created_at);

  let report = s.submit_report(url_report(alice.id, "hxxp://a.example")).await.unwrap();
  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(stored.created_at, report.created_at);

  let receipt = s.cast_vote(vote(report.id, bob.id, VoteType::Up)).await.unwrap();
  let stored_vote = s.get_vote(report.id, bob.id).await.unwrap().unwrap();
  assert_eq!(stored_vote.created_at, receipt.vote.created_at);
}

// ─── Flagging ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn flag_sets_disputed_and_overwrites_reason() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let report = s.submit_report(url_report(alice.id, "hxxp://x.example")).await.unwrap();

  let flagged = s.flag_report(report.id, "false positive".into()).await.unwrap();
  assert_eq!(flagged.status, ReportStatus::Disputed);
  assert_eq!(flagged.flag_reason.as_deref(), Some("false positive"));

  let again = s
    .flag_report(report.id, "  still legit, see thread  ".into())
    .await
    .unwrap();
  assert_eq!(again.status, ReportStatus::Disputed);
  assert_eq!(again.flag_reason.as_deref(), Some("  still legit, see thread  "));
}

#[tokio::test]
async fn flag_missing_report_errors() {
  let s = store().await;
  let err = s.flag_report(ReportId(5), "why".into()).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::ReportNotFound(ReportId(5))));
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_on_empty_store() {
  let s = store().await;
  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_reports, 0);
  assert_eq!(stats.pending, 0);
  assert!(stats.top_reporters.is_empty());
}

#[tokio::test]
async fn stats_count_statuses_and_rank_reporters() {
  let s = store().await;

  let mut users = Vec::new();
  for i in 0..12 {
    let u = user(&s, &format!("user{i:02}")).await;
    s.increment_reputation(u.id, i).await.unwrap();
    users.push(u);
  }

  let a = s.submit_report(url_report(users[0].id, "hxxp://a.example")).await.unwrap();
  s.submit_report(url_report(users[0].id, "hxxp://b.example")).await.unwrap();
  s.submit_report(wallet_report(users[1].id, "0x1")).await.unwrap();
  s.flag_report(a.id, "dup".into()).await.unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_reports, 3);
  assert_eq!(stats.pending, 2);
  assert_eq!(stats.disputed, 1);
  assert_eq!(stats.verified, 0);

  assert_eq!(stats.top_reporters.len(), 10);
  assert_eq!(stats.top_reporters[0].username, "user11");
  assert_eq!(stats.top_reporters[0].reputation, 11);
  assert_eq!(stats.top_reporters[9].username, "user02");
  assert!(
    stats
      .top_reporters
      .windows(2)
      .all(|w| w[0].reputation >= w[1].reputation)
  );
}

#[tokio::test]
async fn verified_reports_count_and_can_be_disputed() {
  let dir = std::env::temp_dir().join(format!("phishblock-verified-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("verified.db");
  let _ = std::fs::remove_file(&path);

  let s = SqliteStore::open(&path).await.unwrap();
  let alice = user(&s, "alice").await;
  let report = s.submit_report(url_report(alice.id, "hxxp://x.example")).await.unwrap();

  // No operation verifies a report; moderators do it in the database.
  let raw = rusqlite::Connection::open(&path).unwrap();
  raw
    .execute("UPDATE reports SET status = 'verified' WHERE id = ?1", [report.id.0])
    .unwrap();
  drop(raw);

  let stored = s.get_report(report.id).await.unwrap().unwrap();
  assert_eq!(stored.status, ReportStatus::Verified);

  let stats = s.stats().await.unwrap();
  assert_eq!(stats.total_reports, 1);
  assert_eq!(stats.verified, 1);
  assert_eq!(stats.pending, 0);
  assert_eq!(stats.disputed, 0);

  let flagged = s.flag_report(report.id, "x".into()).await.unwrap();
  assert_eq!(flagged.status, ReportStatus::Disputed);
  assert_eq!(flagged.flag_reason.as_deref(), Some("x"));
  assert_eq!(s.stats().await.unwrap().verified, 0);

  let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn store_survives_reopen() {
  let dir = std::env::temp_dir().join(format!("phishblock-test-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("reopen.db");
  let _ = std::fs::remove_file(&path);

  let report_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let alice = user(&s, "alice").await;
    s.submit_report(url_report(alice.id, "hxxp://x.example")).await.unwrap().id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.get_report(report_id).await.unwrap().is_some());
  let _ = std::fs::remove_dir_all(&dir);
}
