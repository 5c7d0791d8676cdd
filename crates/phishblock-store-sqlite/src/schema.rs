//! SQL schema for the PhishBlock SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT    NOT NULL UNIQUE,
    reputation  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS reports (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    type        TEXT    NOT NULL CHECK (type IN ('url', 'wallet')),
    content     TEXT    NOT NULL,
    notes       TEXT,
    reporter_id INTEGER NOT NULL REFERENCES users(id),
    upvotes     INTEGER NOT NULL DEFAULT 0 CHECK (upvotes >= 0),
    downvotes   INTEGER NOT NULL DEFAULT 0 CHECK (downvotes >= 0),
    status      TEXT    NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'verified', 'disputed')),
    flag_reason TEXT,
    created_at  TEXT    NOT NULL   -- RFC 3339 UTC, fixed width; server-assigned
);

-- One vote per (report, user). Rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS votes (
    report_id   INTEGER NOT NULL REFERENCES reports(id),
    user_id     INTEGER NOT NULL REFERENCES users(id),
    vote_type   TEXT    NOT NULL CHECK (vote_type IN ('up', 'down')),
    created_at  TEXT    NOT NULL,
    PRIMARY KEY (report_id, user_id)
);

CREATE INDEX IF NOT EXISTS reports_status_idx  ON reports(status);
CREATE INDEX IF NOT EXISTS reports_type_idx    ON reports(type);
CREATE INDEX IF NOT EXISTS reports_created_idx ON reports(created_at);
CREATE INDEX IF NOT EXISTS users_reputation_idx ON users(reputation);

PRAGMA user_version = 1;
";
