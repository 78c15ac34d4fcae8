//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (plant, line, period); an upsert overwrites the row.
-- Aggregates are never stored.
CREATE TABLE IF NOT EXISTS production (
    plant       TEXT    NOT NULL,
    line        TEXT    NOT NULL,
    period      TEXT    NOT NULL,   -- YYYY-MM-DD | YYYY-MM | YYYY
    granularity TEXT    NOT NULL,   -- 'day' | 'month' | 'year'
    quantity    INTEGER NOT NULL CHECK (quantity >= 0),
    remarks     TEXT,
    attachment  TEXT,               -- JSON-encoded Attachment or NULL
    recorded_at TEXT    NOT NULL,   -- ISO 8601 UTC; server-assigned
    PRIMARY KEY (plant, line, period)
);

CREATE TABLE IF NOT EXISTS checklist (
    task        TEXT NOT NULL,
    month       TEXT NOT NULL,
    operator    TEXT NOT NULL,
    engineer    TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (task, month)
);

CREATE INDEX IF NOT EXISTS production_period_idx ON production(period);

PRAGMA user_version = 1;
";
