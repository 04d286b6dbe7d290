//! Database Migrations
//!
//! Schema migration definitions for the state store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: entities, links, feedback, suggestions",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Observability: graph snapshots and entity recency",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Indexes for timeline and dashboard queries",
        up: MIGRATION_V3_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
-- Linkable entities, mirrored from the in-memory index on each build
CREATE TABLE IF NOT EXISTS entities (
    name TEXT PRIMARY KEY,
    category TEXT NOT NULL DEFAULT 'other',
    path TEXT NOT NULL,
    aliases_json TEXT NOT NULL DEFAULT '[]',
    hub_score INTEGER NOT NULL DEFAULT 0
);

-- Denormalized resolved note-to-entity edges
CREATE TABLE IF NOT EXISTS note_links (
    note_path TEXT NOT NULL,
    target TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_note_links_target ON note_links(target);

-- Accepted suggestions actually written into notes
CREATE TABLE IF NOT EXISTS wikilink_applications (
    entity TEXT NOT NULL,
    note_path TEXT NOT NULL,
    applied_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_applications_entity ON wikilink_applications(entity);

-- Append-only feedback events
CREATE TABLE IF NOT EXISTS wikilink_feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity TEXT NOT NULL,
    context TEXT NOT NULL DEFAULT '',
    note_path TEXT NOT NULL DEFAULT '',
    correct INTEGER NOT NULL,  -- 0/1
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feedback_entity ON wikilink_feedback(entity);

-- Recomputed (not appended) suppression decisions
CREATE TABLE IF NOT EXISTS wikilink_suppressions (
    entity TEXT PRIMARY KEY,
    false_positive_rate REAL NOT NULL,
    updated_at TEXT NOT NULL
);

-- Every scored candidate, passing or not
CREATE TABLE IF NOT EXISTS suggestion_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_path TEXT NOT NULL,
    entity TEXT NOT NULL,
    total_score REAL NOT NULL,
    breakdown_json TEXT NOT NULL,
    threshold REAL NOT NULL,
    passed INTEGER NOT NULL,  -- 0/1
    strictness TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Graph snapshots and per-entity recency for the recency layer
const MIGRATION_V2_UP: &str = r#"
-- Periodic topology metrics; one row per metric per snapshot timestamp
CREATE TABLE IF NOT EXISTS graph_snapshots (
    timestamp TEXT NOT NULL,
    metric TEXT NOT NULL,
    value REAL NOT NULL,
    details_json TEXT
);

CREATE INDEX IF NOT EXISTS idx_snapshots_timestamp ON graph_snapshots(timestamp);

CREATE TABLE IF NOT EXISTS entity_recency (
    entity TEXT PRIMARY KEY,
    last_touched_at TEXT NOT NULL
);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// V3: Timeline and dashboard query paths
const MIGRATION_V3_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_events_entity_time ON suggestion_events(entity, timestamp);
CREATE INDEX IF NOT EXISTS idx_events_timestamp ON suggestion_events(timestamp);
CREATE INDEX IF NOT EXISTS idx_feedback_timestamp ON wikilink_feedback(timestamp);

UPDATE schema_version SET version = 3, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
