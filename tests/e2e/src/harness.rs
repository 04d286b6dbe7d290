//! Test Harness
//!
//! Isolated vault + state-store instances for end-to-end tests. Each
//! harness owns a temporary directory; everything is cleaned up on drop.

use std::fs;
use std::path::{Path, PathBuf};

use linkwheel_core::{
    EngineConfig, Fixture, FixtureEntity, FixtureNote, GroundTruthLink, SuggestionEngine,
};
use tempfile::TempDir;

/// An engine wired to a temporary vault and database
pub struct EngineHarness {
    pub engine: SuggestionEngine,
    vault: PathBuf,
    _dir: TempDir,
}

impl EngineHarness {
    /// Empty vault, index initialized
    pub fn new() -> Self {
        Self::with_notes(&[])
    }

    /// Vault seeded with `(relative path, raw content)` notes
    pub fn with_notes(notes: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let vault = dir.path().join("vault");
        fs::create_dir_all(&vault).expect("create vault dir");
        for (rel, body) in notes {
            write_note(&vault, rel, body);
        }

        let mut config = EngineConfig::new(&vault);
        config.db_path = Some(dir.path().join("state.db"));
        let engine = SuggestionEngine::new(config).expect("open engine");
        engine.initialize_index().expect("initialize index");

        Self {
            engine,
            vault,
            _dir: dir,
        }
    }

    /// Vault materialized from a ground-truth fixture
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let vault = dir.path().join("vault");
        fs::create_dir_all(&vault).expect("create vault dir");
        fixture.materialize(&vault).expect("materialize fixture");

        let mut config = EngineConfig::new(&vault);
        config.db_path = Some(dir.path().join("state.db"));
        let engine = SuggestionEngine::new(config).expect("open engine");
        engine.initialize_index().expect("initialize index");

        Self {
            engine,
            vault,
            _dir: dir,
        }
    }

    /// Add or overwrite a note, then rebuild the index
    pub fn write_note(&self, rel: &str, body: &str) {
        write_note(&self.vault, rel, body);
        self.engine.initialize_index().expect("reinitialize index");
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault
    }
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn write_note(vault: &Path, rel: &str, body: &str) {
    let path = vault.join(rel);
    fs::create_dir_all(path.parent().expect("note has parent")).expect("create folder");
    fs::write(path, body).expect("write note");
}

/// Deterministic fixture generator: a vault of categorized entities plus
/// daily notes that mention them at the three ground-truth tiers.
///
/// A small LCG keyed on `seed` decides which entities each note mentions,
/// so the same seed always yields the same fixture.
pub fn generate_fixture(seed: u64, entity_count: usize, note_count: usize) -> Fixture {
    let mut state = seed.max(1);
    let mut next = move || {
        // Numerical Recipes LCG constants.
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let categories = ["technologies", "people", "projects", "concepts"];
    let mut entities = Vec::new();
    let mut notes = Vec::new();

    for i in 0..entity_count {
        let category = categories[i % categories.len()];
        let name = format!("Topic{i:03}");
        let path = format!("{category}/{name}.md");
        entities.push(FixtureEntity {
            name: name.clone(),
            category: category.to_string(),
            path: path.clone(),
            aliases: vec![],
            hub_score: (i % 7) as u32,
        });
        notes.push(FixtureNote {
            path,
            title: name.clone(),
            frontmatter: serde_json::Map::new(),
            content: format!("About {name}."),
            links: vec![],
            folder: category.to_string(),
        });
    }

    let mut ground_truth = Vec::new();
    for n in 0..note_count {
        let path = format!("journal/day{n:03}.md");
        let mentioned = next() % entity_count;
        let stemmed = next() % entity_count;
        let linked = next() % entity_count;

        let mentioned_name = format!("Topic{mentioned:03}");
        let stemmed_name = format!("Topic{stemmed:03}");
        let linked_name = format!("Topic{linked:03}");

        let content = format!(
            "Worked on {mentioned_name} today. Also {stemmed_name}s came up. \
             Related: [[{linked_name}]] as usual.",
        );
        notes.push(FixtureNote {
            path: path.clone(),
            title: format!("day{n:03}"),
            frontmatter: serde_json::Map::new(),
            content,
            links: vec![],
            folder: "journal".to_string(),
        });

        ground_truth.push(GroundTruthLink {
            note_path: path.clone(),
            entity: mentioned_name,
            tier: 1,
            reason: "verbatim mention".to_string(),
        });
        if stemmed != mentioned {
            ground_truth.push(GroundTruthLink {
                note_path: path,
                entity: stemmed_name,
                tier: 2,
                reason: "stem mention".to_string(),
            });
        }
    }

    Fixture {
        seed,
        description: format!("{entity_count} entities, {note_count} journal notes"),
        entities,
        notes,
        ground_truth,
    }
}
