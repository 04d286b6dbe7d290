//! Entity Index Module
//!
//! In-memory catalog of linkable entities with a ready/stale lifecycle.
//! Built from a vault scan, swapped atomically so concurrent readers see
//! either the old snapshot or the new one, never a half-built index.

mod entity;
mod snapshot;

pub use entity::{Category, Entity, normalize_name};
pub use snapshot::{IndexSnapshot, IndexStats, LookupHit, MIN_ALIAS_LEN, NameRef};

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::{EngineError, Result};
use crate::vault::scan_vault;

/// Observable lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLifecycle {
    Uninitialized,
    Ready,
    /// A file-system event arrived; the old snapshot still serves reads
    /// until the next rebuild completes.
    Stale,
    Error,
}

enum State {
    Uninitialized,
    Ready(Arc<IndexSnapshot>),
    Stale(Arc<IndexSnapshot>),
    Error(String),
}

/// Entity index with atomic snapshot swap
///
/// All methods take `&self`; the index is shared read-only after
/// initialization and rebuilds never block in-flight readers that captured
/// the previous snapshot.
pub struct EntityIndex {
    state: RwLock<State>,
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::Uninitialized),
        }
    }

    /// Scan the vault and install a fresh snapshot
    ///
    /// Re-invocable: recovers from the error state and refreshes a stale
    /// index. On scan failure the index transitions to `Error` and
    /// subsequent lookups return empty.
    pub fn initialize(&self, vault_root: &Path, excluded: &[String]) -> Result<IndexStats> {
        let scan = match scan_vault(vault_root, excluded) {
            Ok(scan) => scan,
            Err(err) => {
                let mut state = self.state.write().expect("index lock poisoned");
                *state = State::Error(err.to_string());
                return Err(EngineError::Vault(err));
            }
        };

        let snapshot = IndexSnapshot::build(&scan);
        let stats = snapshot.stats();
        tracing::info!(
            entities = stats.total,
            notes = stats.note_count,
            "entity index built"
        );
        self.install(snapshot);
        Ok(stats)
    }

    /// Install a pre-built snapshot (fixture and test path)
    pub fn install(&self, snapshot: IndexSnapshot) {
        let mut state = self.state.write().expect("index lock poisoned");
        *state = State::Ready(Arc::new(snapshot));
    }

    /// Mark the index stale after a file-system event
    ///
    /// The current snapshot keeps serving reads; `initialize` brings the
    /// index back to ready.
    pub fn mark_stale(&self) {
        let mut state = self.state.write().expect("index lock poisoned");
        if let State::Ready(snap) = &*state {
            *state = State::Stale(Arc::clone(snap));
        }
    }

    pub fn lifecycle(&self) -> IndexLifecycle {
        match &*self.state.read().expect("index lock poisoned") {
            State::Uninitialized => IndexLifecycle::Uninitialized,
            State::Ready(_) => IndexLifecycle::Ready,
            State::Stale(_) => IndexLifecycle::Stale,
            State::Error(_) => IndexLifecycle::Error,
        }
    }

    /// True when a snapshot is available (ready or stale)
    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Current snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        match &*self.state.read().expect("index lock poisoned") {
            State::Ready(snap) | State::Stale(snap) => Some(Arc::clone(snap)),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<IndexStats> {
        self.snapshot().map(|s| s.stats())
    }

    /// Single-token lookup; empty when the index is not ready
    pub fn lookup(&self, token: &str) -> Vec<LookupHit> {
        self.snapshot()
            .map(|s| s.lookup(token))
            .unwrap_or_default()
    }

    pub fn category_of(&self, entity: &str) -> Option<Category> {
        let snap = self.snapshot()?;
        let id = snap.id_of(entity)?;
        Some(snap.entity(id).category)
    }

    pub fn hub_score_of(&self, entity: &str) -> u32 {
        self.snapshot()
            .and_then(|s| s.id_of(entity).map(|id| s.entity(id).hub_score))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed_vault(dir: &Path) {
        fs::create_dir_all(dir.join("tech")).unwrap();
        fs::write(dir.join("tech/React.md"), "React body").unwrap();
        fs::write(dir.join("Note.md"), "see [[React]]").unwrap();
    }

    #[test]
    fn test_lifecycle_uninitialized_to_ready() {
        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());

        let index = EntityIndex::new();
        assert_eq!(index.lifecycle(), IndexLifecycle::Uninitialized);
        assert!(!index.is_ready());
        assert!(index.lookup("react").is_empty());

        let stats = index.initialize(dir.path(), &[]).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(index.lifecycle(), IndexLifecycle::Ready);
        assert_eq!(index.lookup("react").len(), 1);
        assert_eq!(index.hub_score_of("React"), 1);
        assert_eq!(index.category_of("React"), Some(Category::Technologies));
    }

    #[test]
    fn test_stale_keeps_serving_old_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());

        let index = EntityIndex::new();
        index.initialize(dir.path(), &[]).unwrap();
        index.mark_stale();

        assert_eq!(index.lifecycle(), IndexLifecycle::Stale);
        assert!(index.is_ready());
        assert_eq!(index.lookup("react").len(), 1);

        index.initialize(dir.path(), &[]).unwrap();
        assert_eq!(index.lifecycle(), IndexLifecycle::Ready);
    }

    #[test]
    fn test_error_state_and_recovery() {
        let index = EntityIndex::new();
        let missing = Path::new("/nonexistent/vault/path");
        assert!(index.initialize(missing, &[]).is_err());
        assert_eq!(index.lifecycle(), IndexLifecycle::Error);
        assert!(index.lookup("anything").is_empty());

        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());
        index.initialize(dir.path(), &[]).unwrap();
        assert!(index.is_ready());
    }

    #[test]
    fn test_rebuild_is_atomic_for_captured_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        seed_vault(dir.path());

        let index = EntityIndex::new();
        index.initialize(dir.path(), &[]).unwrap();
        let captured = index.snapshot().unwrap();

        fs::write(dir.path().join("New Note.md"), "fresh").unwrap();
        index.initialize(dir.path(), &[]).unwrap();

        // The captured snapshot is unchanged; the new one sees the note.
        assert_eq!(captured.len(), 2);
        assert_eq!(index.snapshot().unwrap().len(), 3);
    }
}
