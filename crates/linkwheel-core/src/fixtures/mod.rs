//! Fixtures Module
//!
//! Ground-truth fixture format for the test harness: a seeded vault
//! description plus tiered expected links. Validation reports every missing
//! reference concretely; materialization writes the vault to disk for an
//! end-to-end run.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::index::{Category, Entity, normalize_name};

/// Ground-truth difficulty tier
///
/// 1 = verbatim name in the text, 2 = alias or stem only, 3 = graph
/// context only.
pub type Tier = u8;

/// One expected entity in the fixture vault
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixtureEntity {
    pub name: String,
    pub category: String,
    pub path: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hub_score: u32,
}

/// One note in the fixture vault
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixtureNote {
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    pub content: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub folder: String,
}

/// One expected suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroundTruthLink {
    pub note_path: String,
    pub entity: String,
    pub tier: Tier,
    #[serde(default)]
    pub reason: String,
}

/// A complete ground-truth fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Fixture {
    pub seed: u64,
    #[serde(default)]
    pub description: String,
    pub entities: Vec<FixtureEntity>,
    pub notes: Vec<FixtureNote>,
    #[serde(default)]
    pub ground_truth: Vec<GroundTruthLink>,
}

impl Fixture {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            EngineError::InvalidFixture {
                missing: vec![format!("unparseable fixture: {err}")],
            }
        })
    }

    /// Check every cross-reference; all missing references are reported
    pub fn validate(&self) -> Result<()> {
        let entity_keys: HashSet<String> = self
            .entities
            .iter()
            .map(|e| normalize_name(&e.name))
            .collect();
        let note_paths: HashSet<&str> = self.notes.iter().map(|n| n.path.as_str()).collect();

        let mut missing = Vec::new();
        for (idx, entity) in self.entities.iter().enumerate() {
            if !note_paths.contains(entity.path.as_str()) {
                missing.push(format!(
                    "entities[{idx}].path \"{}\" has no note",
                    entity.path
                ));
            }
        }
        for (idx, truth) in self.ground_truth.iter().enumerate() {
            if !note_paths.contains(truth.note_path.as_str()) {
                missing.push(format!(
                    "groundTruth[{idx}].notePath \"{}\" has no note",
                    truth.note_path
                ));
            }
            if !entity_keys.contains(&normalize_name(&truth.entity)) {
                missing.push(format!(
                    "groundTruth[{idx}].entity \"{}\" has no entity",
                    truth.entity
                ));
            }
            if !(1..=3).contains(&truth.tier) {
                missing.push(format!(
                    "groundTruth[{idx}].tier {} out of range 1..=3",
                    truth.tier
                ));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidFixture { missing })
        }
    }

    /// Entities in index form
    pub fn index_entities(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .map(|e| Entity {
                name: e.name.clone(),
                category: Category::parse_name(&e.category),
                path: e.path.clone(),
                folder: e
                    .path
                    .rsplit_once('/')
                    .map(|(folder, _)| folder.to_string())
                    .unwrap_or_default(),
                aliases: e.aliases.clone(),
                hub_score: e.hub_score,
            })
            .collect()
    }

    /// Write the fixture's notes under `root` as a real vault
    ///
    /// Fixture links not already present in a note's content are appended
    /// as wikilinks, so the written vault carries the declared edges.
    pub fn materialize(&self, root: &Path) -> Result<()> {
        self.validate()?;
        for note in &self.notes {
            let path = root.join(&note.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::File::create(&path)?;

            if !note.frontmatter.is_empty() {
                writeln!(file, "---")?;
                for (key, value) in &note.frontmatter {
                    match value {
                        serde_json::Value::String(s) => writeln!(file, "{key}: {s}")?,
                        serde_json::Value::Array(items) => {
                            let rendered: Vec<String> = items
                                .iter()
                                .map(|v| match v {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .collect();
                            writeln!(file, "{key}: [{}]", rendered.join(", "))?;
                        }
                        other => writeln!(file, "{key}: {other}")?,
                    }
                }
                writeln!(file, "---")?;
            }

            write!(file, "{}", note.content)?;
            for link in &note.links {
                let inline = format!("[[{link}]]");
                if !note.content.contains(&inline) {
                    writeln!(file)?;
                    write!(file, "{inline}")?;
                }
            }
        }
        Ok(())
    }
}
