//! SQL migration definitions for the KeywordScout database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: research_runs, run_progress, keywords",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Research run lifecycle
CREATE TABLE IF NOT EXISTS research_runs (
    id            TEXT PRIMARY KEY,
    domain        TEXT NOT NULL,
    niche         TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'pending',
    seeds_json    TEXT NOT NULL DEFAULT '[]',
    total_found   INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    created_at    TEXT NOT NULL,
    started_at    TEXT,
    completed_at  TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_status ON research_runs(status);

-- Append-only progress log per run
CREATE TABLE IF NOT EXISTS run_progress (
    run_id  TEXT NOT NULL REFERENCES research_runs(id) ON DELETE CASCADE,
    seq     INTEGER NOT NULL,
    time    TEXT NOT NULL,
    message TEXT NOT NULL,
    indent  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (run_id, seq)
);

-- Persisted keywords, annotated with cluster metadata after the fact
CREATE TABLE IF NOT EXISTS keywords (
    id                TEXT PRIMARY KEY,
    run_id            TEXT NOT NULL REFERENCES research_runs(id) ON DELETE CASCADE,
    text              TEXT NOT NULL,
    volume            INTEGER,
    difficulty        INTEGER,
    cpc               REAL,
    opportunity       INTEGER,
    intent            TEXT NOT NULL DEFAULT 'mixed',
    sources_json      TEXT NOT NULL DEFAULT '[]',
    cluster_id        INTEGER,
    is_representative INTEGER NOT NULL DEFAULT 0,
    cluster_size      INTEGER NOT NULL DEFAULT 1,
    siblings_json     TEXT NOT NULL DEFAULT '[]',
    created_at        TEXT NOT NULL,
    UNIQUE(run_id, text)
);

CREATE INDEX IF NOT EXISTS idx_keywords_run ON keywords(run_id);
CREATE INDEX IF NOT EXISTS idx_keywords_cluster ON keywords(run_id, cluster_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
