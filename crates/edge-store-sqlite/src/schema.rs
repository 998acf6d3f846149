//! SQL schema for the edge SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS environments (
    id       INTEGER PRIMARY KEY,
    api_key  TEXT NOT NULL UNIQUE,
    name     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS features (
    id           INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    type         TEXT NOT NULL DEFAULT 'STANDARD',
    description  TEXT
);

-- A feature is valid for an environment while it has a state there.
CREATE TABLE IF NOT EXISTS feature_states (
    environment_id  INTEGER NOT NULL REFERENCES environments(id) ON DELETE CASCADE,
    feature_id      INTEGER NOT NULL REFERENCES features(id) ON DELETE CASCADE,
    PRIMARY KEY (environment_id, feature_id)
);

CREATE TABLE IF NOT EXISTS users (
    id     INTEGER PRIMARY KEY,
    email  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS webhooks (
    id              INTEGER PRIMARY KEY,
    environment_id  INTEGER NOT NULL REFERENCES environments(id) ON DELETE CASCADE,
    url             TEXT NOT NULL,
    enabled         INTEGER NOT NULL DEFAULT 1
);

-- Edge identity documents, one whole JSON item per identity.
-- Writes always replace the full row.
CREATE TABLE IF NOT EXISTS identity_documents (
    identity_uuid        TEXT PRIMARY KEY,
    environment_api_key  TEXT NOT NULL,
    document             TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS webhooks_environment_idx ON webhooks(environment_id);
CREATE INDEX IF NOT EXISTS identity_documents_env_idx
    ON identity_documents(environment_api_key);

PRAGMA user_version = 1;
";
