//! SQLite State Store
//!
//! The only point of persistence in the engine. Owns the tables consumed by
//! observability tooling; everything above it (feedback, observability,
//! engine) goes through these methods.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};

use crate::index::Entity;
use crate::profiles::Strictness;
use crate::scoring::ScoreBreakdown;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// State store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// State store result type
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// ROW TYPES
// ============================================================================

/// One append-only feedback event
#[derive(Debug, Clone)]
pub struct FeedbackEventRow {
    pub id: i64,
    pub entity: String,
    pub context: String,
    pub note_path: String,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// Per-entity suppression decision, recomputed not appended
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionRow {
    pub entity: String,
    pub false_positive_rate: f64,
    pub updated_at: DateTime<Utc>,
}

/// One scored candidate, passing or not
#[derive(Debug, Clone)]
pub struct SuggestionEventRow {
    pub id: i64,
    pub note_path: String,
    pub entity: String,
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
    pub threshold: f64,
    pub passed: bool,
    pub strictness: Strictness,
    pub timestamp: DateTime<Utc>,
}

/// An applied suggestion
#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub entity: String,
    pub note_path: String,
    pub applied_at: DateTime<Utc>,
}

/// One metric of a graph snapshot batch
#[derive(Debug, Clone)]
pub struct SnapshotMetricRow {
    pub metric: String,
    pub value: f64,
    pub details_json: Option<String>,
}

/// Dashboard aggregate per entity
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntityRow {
    pub entity: String,
    pub suggested: u64,
    pub passed: u64,
    pub avg_score: f64,
}

// ============================================================================
// STATE STORE
// ============================================================================

/// SQLite-backed state store
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self`, making the store `Send + Sync` so the engine can
/// hold it in an `Arc` without an outer mutex. Writes serialize on the
/// writer connection; reads share the reader.
pub struct StateStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl StateStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -32000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create a new state store instance
    ///
    /// Without an explicit path the database lands in the platform data
    /// directory (`ProjectDirs`).
    pub fn new(db_path: Option<PathBuf>) -> StoreResult<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "linkwheel", "core").ok_or_else(|| {
                    StoreError::Init("Could not determine project directories".to_string())
                })?;
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("linkwheel.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    fn write_lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))
    }

    fn read_lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // ENTITIES & NOTE LINKS
    // ========================================================================

    /// Mirror the freshly built index: replace all entity and link rows
    pub fn replace_index<'a>(
        &self,
        entities: &[Entity],
        links: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> StoreResult<()> {
        let mut conn = self.write_lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM entities", [])?;
        tx.execute("DELETE FROM note_links", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entities (name, category, path, aliases_json, hub_score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entity in entities {
                stmt.execute(params![
                    entity.name,
                    entity.category.as_str(),
                    entity.path,
                    serde_json::to_string(&entity.aliases)?,
                    entity.hub_score,
                ])?;
            }
            let mut stmt =
                tx.prepare("INSERT INTO note_links (note_path, target) VALUES (?1, ?2)")?;
            for (note_path, target) in links {
                stmt.execute(params![note_path, target])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Mirrored entity row, if the index build persisted one
    pub fn entity_by_name(&self, name: &str) -> StoreResult<Option<Entity>> {
        let conn = self.read_lock()?;
        conn.query_row(
            "SELECT name, category, path, aliases_json, hub_score
             FROM entities WHERE name = ?1",
            params![name],
            |row| {
                let aliases_json: String = row.get(3)?;
                let category: String = row.get(1)?;
                let path: String = row.get(2)?;
                let folder = path.rsplit_once('/').map(|(f, _)| f.to_string());
                Ok(Entity {
                    name: row.get(0)?,
                    category: crate::index::Category::parse_name(&category),
                    path,
                    folder: folder.unwrap_or_default(),
                    aliases: serde_json::from_str(&aliases_json).unwrap_or_default(),
                    hub_score: row.get::<_, i64>(4)? as u32,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    // ========================================================================
    // FEEDBACK
    // ========================================================================

    pub fn insert_feedback(
        &self,
        entity: &str,
        context: &str,
        note_path: &str,
        correct: bool,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.write_lock()?;
        conn.execute(
            "INSERT INTO wikilink_feedback (entity, context, note_path, correct, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entity, context, note_path, correct as i64, timestamp],
        )?;
        Ok(())
    }

    /// All feedback events for one entity, oldest first
    pub fn feedback_events(&self, entity: &str) -> StoreResult<Vec<FeedbackEventRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, entity, context, note_path, correct, timestamp
             FROM wikilink_feedback WHERE entity = ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map(params![entity], row_to_feedback)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every entity that has at least one feedback event
    pub fn feedback_entities(&self) -> StoreResult<Vec<String>> {
        let conn = self.read_lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT entity FROM wikilink_feedback ORDER BY entity")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// (positive, negative) event totals across all entities
    pub fn feedback_totals(&self) -> StoreResult<(u64, u64)> {
        let conn = self.read_lock()?;
        conn.query_row(
            "SELECT COALESCE(SUM(correct), 0), COALESCE(SUM(1 - correct), 0)
             FROM wikilink_feedback",
            [],
            |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
        )
        .map_err(Into::into)
    }

    // ========================================================================
    // SUPPRESSIONS
    // ========================================================================

    pub fn upsert_suppression(
        &self,
        entity: &str,
        false_positive_rate: f64,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.write_lock()?;
        conn.execute(
            "INSERT INTO wikilink_suppressions (entity, false_positive_rate, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(entity) DO UPDATE SET
                false_positive_rate = excluded.false_positive_rate,
                updated_at = excluded.updated_at",
            params![entity, false_positive_rate, updated_at],
        )?;
        Ok(())
    }

    pub fn clear_suppression(&self, entity: &str) -> StoreResult<()> {
        let conn = self.write_lock()?;
        conn.execute(
            "DELETE FROM wikilink_suppressions WHERE entity = ?1",
            params![entity],
        )?;
        Ok(())
    }

    pub fn suppression_for(&self, entity: &str) -> StoreResult<Option<SuppressionRow>> {
        let conn = self.read_lock()?;
        conn.query_row(
            "SELECT entity, false_positive_rate, updated_at
             FROM wikilink_suppressions WHERE entity = ?1",
            params![entity],
            row_to_suppression,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn suppression_rows(&self) -> StoreResult<Vec<SuppressionRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT entity, false_positive_rate, updated_at
             FROM wikilink_suppressions ORDER BY false_positive_rate DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_suppression)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========================================================================
    // SUGGESTION EVENTS
    // ========================================================================

    /// Persist one suggestion call's scored candidates in a single transaction
    pub fn insert_suggestion_events(&self, events: &[SuggestionEventRow]) -> StoreResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut conn = self.write_lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO suggestion_events
                 (note_path, entity, total_score, breakdown_json, threshold, passed, strictness, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.note_path,
                    event.entity,
                    event.total_score,
                    serde_json::to_string(&event.breakdown)?,
                    event.threshold,
                    event.passed as i64,
                    event.strictness.as_str(),
                    event.timestamp,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Events for one entity since a cutoff, chronological, newest-biased cap
    pub fn suggestion_events_for_entity(
        &self,
        entity: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<SuggestionEventRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, note_path, entity, total_score, breakdown_json, threshold, passed, strictness, timestamp
             FROM suggestion_events
             WHERE entity = ?1 AND timestamp >= ?2
             ORDER BY timestamp DESC LIMIT ?3",
        )?;
        let mut rows = stmt
            .query_map(params![entity, since, limit as i64], row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.reverse();
        Ok(rows)
    }

    /// All events since a cutoff, chronological
    pub fn suggestion_events_since(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<SuggestionEventRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, note_path, entity, total_score, breakdown_json, threshold, passed, strictness, timestamp
             FROM suggestion_events WHERE timestamp >= ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map(params![since], row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// (total, passed) suggestion event counts since a cutoff
    pub fn suggestion_counts_since(&self, since: DateTime<Utc>) -> StoreResult<(u64, u64)> {
        let conn = self.read_lock()?;
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(passed), 0)
             FROM suggestion_events WHERE timestamp >= ?1",
            params![since],
            |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
        )
        .map_err(Into::into)
    }

    /// Most-suggested entities since a cutoff
    pub fn top_entities_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<TopEntityRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT entity, COUNT(*), COALESCE(SUM(passed), 0), AVG(total_score)
             FROM suggestion_events WHERE timestamp >= ?1
             GROUP BY entity ORDER BY COUNT(*) DESC, entity ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![since, limit as i64], |row| {
                Ok(TopEntityRow {
                    entity: row.get(0)?,
                    suggested: row.get::<_, i64>(1)? as u64,
                    passed: row.get::<_, i64>(2)? as u64,
                    avg_score: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========================================================================
    // APPLICATIONS
    // ========================================================================

    pub fn insert_application(
        &self,
        entity: &str,
        note_path: &str,
        applied_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.write_lock()?;
        conn.execute(
            "INSERT INTO wikilink_applications (entity, note_path, applied_at)
             VALUES (?1, ?2, ?3)",
            params![entity, note_path, applied_at],
        )?;
        Ok(())
    }

    pub fn applications_for(&self, entity: &str) -> StoreResult<Vec<ApplicationRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT entity, note_path, applied_at
             FROM wikilink_applications WHERE entity = ?1 ORDER BY applied_at DESC",
        )?;
        let rows = stmt
            .query_map(params![entity], |row| {
                Ok(ApplicationRow {
                    entity: row.get(0)?,
                    note_path: row.get(1)?,
                    applied_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn application_count(&self) -> StoreResult<u64> {
        let conn = self.read_lock()?;
        conn.query_row("SELECT COUNT(*) FROM wikilink_applications", [], |row| {
            Ok(row.get::<_, i64>(0)? as u64)
        })
        .map_err(Into::into)
    }

    // ========================================================================
    // RECENCY
    // ========================================================================

    pub fn touch_recency(&self, entity: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.write_lock()?;
        conn.execute(
            "INSERT INTO entity_recency (entity, last_touched_at) VALUES (?1, ?2)
             ON CONFLICT(entity) DO UPDATE SET last_touched_at = excluded.last_touched_at",
            params![entity, at],
        )?;
        Ok(())
    }

    pub fn last_touched(&self, entity: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.read_lock()?;
        conn.query_row(
            "SELECT last_touched_at FROM entity_recency WHERE entity = ?1",
            params![entity],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    /// Full recency table, fetched once per suggestion call
    pub fn recency_map(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare("SELECT entity, last_touched_at FROM entity_recency")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(rows)
    }

    // ========================================================================
    // GRAPH SNAPSHOTS
    // ========================================================================

    /// Write one snapshot batch: one row per metric, shared timestamp
    pub fn insert_graph_snapshot(
        &self,
        at: DateTime<Utc>,
        metrics: &[SnapshotMetricRow],
    ) -> StoreResult<()> {
        let mut conn = self.write_lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO graph_snapshots (timestamp, metric, value, details_json)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in metrics {
                stmt.execute(params![at, row.metric, row.value, row.details_json])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Timestamp of the snapshot batch nearest to `target`
    pub fn nearest_snapshot_time(
        &self,
        target: DateTime<Utc>,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.read_lock()?;
        conn.query_row(
            "SELECT timestamp FROM graph_snapshots
             GROUP BY timestamp
             ORDER BY ABS(julianday(timestamp) - julianday(?1)) ASC
             LIMIT 1",
            params![target],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    /// All metric rows of the snapshot batch taken at exactly `at`
    pub fn snapshot_rows_at(&self, at: DateTime<Utc>) -> StoreResult<Vec<SnapshotMetricRow>> {
        let conn = self.read_lock()?;
        let mut stmt = conn.prepare(
            "SELECT metric, value, details_json FROM graph_snapshots
             WHERE timestamp = ?1 ORDER BY metric",
        )?;
        let rows = stmt
            .query_map(params![at], |row| {
                Ok(SnapshotMetricRow {
                    metric: row.get(0)?,
                    value: row.get(1)?,
                    details_json: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========================================================================
    // RETENTION
    // ========================================================================

    /// Purge observability rows older than the cutoff; idempotent
    pub fn purge_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let conn = self.write_lock()?;
        let events = conn.execute(
            "DELETE FROM suggestion_events WHERE timestamp < ?1",
            params![cutoff],
        )?;
        let snapshots = conn.execute(
            "DELETE FROM graph_snapshots WHERE timestamp < ?1",
            params![cutoff],
        )?;
        Ok((events + snapshots) as u64)
    }
}

// ============================================================================
// ROW MAPPERS
// ============================================================================

fn row_to_feedback(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedbackEventRow> {
    Ok(FeedbackEventRow {
        id: row.get(0)?,
        entity: row.get(1)?,
        context: row.get(2)?,
        note_path: row.get(3)?,
        correct: row.get::<_, i64>(4)? != 0,
        timestamp: row.get(5)?,
    })
}

fn row_to_suppression(row: &rusqlite::Row<'_>) -> rusqlite::Result<SuppressionRow> {
    Ok(SuppressionRow {
        entity: row.get(0)?,
        false_positive_rate: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<SuggestionEventRow> {
    let breakdown_json: String = row.get(4)?;
    let breakdown = serde_json::from_str(&breakdown_json).unwrap_or_default();
    let strictness: String = row.get(7)?;
    Ok(SuggestionEventRow {
        id: row.get(0)?,
        note_path: row.get(1)?,
        entity: row.get(2)?,
        total_score: row.get(3)?,
        breakdown,
        threshold: row.get(5)?,
        passed: row.get::<_, i64>(6)? != 0,
        strictness: Strictness::parse_name(&strictness).unwrap_or_default(),
        timestamp: row.get(8)?,
    })
}
