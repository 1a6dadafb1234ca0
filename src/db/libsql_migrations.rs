//! SQLite-dialect schema for the libSQL backend.
//!
//! Mirrors `migrations/V1__dreamer_profile.sql`. Run on every startup;
//! idempotent via `IF NOT EXISTS`.

/// Consolidated schema for libSQL.
///
/// Translates PostgreSQL types:
/// - `UUID` -> `TEXT` (hyphenated string)
/// - `TIMESTAMPTZ` -> `TEXT` (RFC 3339)
/// - `JSONB` -> `TEXT` (JSON encoded)
/// - `TEXT[]` -> `TEXT` (JSON array)
/// - `BOOLEAN` -> `INTEGER` (0/1)
pub const SCHEMA: &str = r#"

-- ==================== Migration tracking ====================

CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ==================== Census ====================

CREATE TABLE IF NOT EXISTS census_questions (
    id TEXT PRIMARY KEY,
    section_slug TEXT NOT NULL,
    slug TEXT NOT NULL,
    question_type TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (section_slug, slug)
);

CREATE TABLE IF NOT EXISTS census_answers (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    question_id TEXT NOT NULL REFERENCES census_questions(id) ON DELETE CASCADE,
    value TEXT NOT NULL,
    answered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_census_answers_user ON census_answers(user_id);

CREATE TABLE IF NOT EXISTS census_section_progress (
    user_id TEXT NOT NULL,
    section_slug TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, section_slug)
);

-- ==================== Dream journal ====================

CREATE TABLE IF NOT EXISTS dream_entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    emotions TEXT NOT NULL DEFAULT '[]',
    vividness INTEGER,
    lucidity TEXT,
    waking_life_link TEXT,
    captured_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_dream_entries_user_captured
    ON dream_entries(user_id, captured_at);

CREATE TABLE IF NOT EXISTS dream_tags (
    dream_id TEXT NOT NULL REFERENCES dream_entries(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'user',
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (dream_id, name)
);

-- ==================== Profile snapshots ====================

CREATE TABLE IF NOT EXISTS dreamer_profiles (
    user_id TEXT PRIMARY KEY,
    boundary_score INTEGER,
    boundary_confidence INTEGER NOT NULL DEFAULT 0,
    lucidity_score INTEGER,
    lucidity_confidence INTEGER NOT NULL DEFAULT 0,
    emotion_score INTEGER,
    emotion_confidence INTEGER NOT NULL DEFAULT 0,
    meaning_score INTEGER,
    meaning_confidence INTEGER NOT NULL DEFAULT 0,
    engagement_score INTEGER,
    engagement_confidence INTEGER NOT NULL DEFAULT 0,
    primary_archetype TEXT,
    primary_confidence INTEGER,
    secondary_archetype TEXT,
    secondary_confidence INTEGER,
    unlock_points INTEGER NOT NULL DEFAULT 0,
    unlock_level INTEGER NOT NULL DEFAULT 0,
    journal TEXT NOT NULL DEFAULT '{}',
    is_stale INTEGER NOT NULL DEFAULT 0,
    last_calculated_at TEXT NOT NULL
);

INSERT OR IGNORE INTO _migrations (version, name) VALUES (1, 'dreamer_profile');
"#;
