//! SQL schema for the JobSwipe SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Keyed by SHA-256 of the bearer token; the token itself is never stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES accounts(user_id),
    created_at TEXT NOT NULL
);

-- One-time callback tokens carrying a role across a sign-in redirect.
CREATE TABLE IF NOT EXISTS pending_roles (
    token_hash TEXT PRIMARY KEY,
    role       TEXT NOT NULL,      -- 'job_seeker' | 'recruiter'
    created_at TEXT NOT NULL
);

-- First insert wins; the primary key turns re-inserts into no-ops.
CREATE TABLE IF NOT EXISTS user_roles (
    user_id    TEXT PRIMARY KEY REFERENCES accounts(user_id),
    role       TEXT NOT NULL,      -- 'job_seeker' | 'recruiter'
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id               TEXT PRIMARY KEY REFERENCES accounts(user_id),
    full_name        TEXT,
    email            TEXT,
    bio              TEXT,
    location         TEXT,
    phone            TEXT,
    linkedin_url     TEXT,
    job_title        TEXT,
    company          TEXT,
    experience       TEXT,
    education        TEXT,
    salary_range     TEXT,
    skills           TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    avatar_url       TEXT,
    company_logo_url TEXT,
    updated_at       TEXT NOT NULL
);

-- No UNIQUE on the pair: duplicate matches are a policy decision.
CREATE TABLE IF NOT EXISTS matches (
    match_id      TEXT PRIMARY KEY,
    recruiter_id  TEXT NOT NULL,
    job_seeker_id TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS likes (
    swiper_id  TEXT NOT NULL,
    target_id  TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (swiper_id, target_id)
);

-- Insert-only apart from the read flag.
CREATE TABLE IF NOT EXISTS messages (
    message_id TEXT PRIMARY KEY,
    match_id   TEXT NOT NULL REFERENCES matches(match_id),
    sender_id  TEXT NOT NULL,
    content    TEXT NOT NULL CHECK (length(trim(content)) > 0),
    created_at TEXT NOT NULL,
    read       INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS sessions_user_idx     ON sessions(user_id);
CREATE INDEX IF NOT EXISTS matches_recruiter_idx ON matches(recruiter_id);
CREATE INDEX IF NOT EXISTS matches_seeker_idx    ON matches(job_seeker_id);
CREATE INDEX IF NOT EXISTS messages_match_idx    ON messages(match_id, created_at);

PRAGMA user_version = 1;
";
