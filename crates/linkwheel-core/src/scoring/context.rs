//! Note Context
//!
//! Per-call view of the note being scored: its already-linked entities,
//! declared type, folder, and the token positions of existing wikilinks
//! (for the context-proximity layer).

use std::collections::HashMap;

use crate::index::{Category, IndexSnapshot, normalize_name};
use crate::textmatch::{ZoneKind, mask_protected, tokenize};
use crate::vault::{extract_wikilink_targets, parse_note};

/// Context for one suggestion call
#[derive(Debug, Clone, Default)]
pub struct NoteContext {
    pub note_path: Option<String>,
    pub folder: Option<String>,
    /// Normalized basename of the note itself; never suggested
    pub own_key: Option<String>,
    /// Category from the note's frontmatter `type`, if declared
    pub note_category: Option<Category>,
    /// Entity ids already linked from this note
    pub linked: Vec<usize>,
    /// Dominant category among the linked entities
    pub dominant_linked_category: Option<Category>,
    /// Token-stream positions of existing wikilinks
    pub link_token_positions: Vec<usize>,
    /// Frontmatter was present but unparseable
    pub malformed_frontmatter: bool,
}

impl NoteContext {
    /// Build the context from raw note text
    pub fn build(text: &str, note_path: Option<&str>, snapshot: &IndexSnapshot) -> Self {
        let parsed = parse_note(note_path.unwrap_or("untitled.md"), text);

        let own_key = note_path.map(|p| {
            let file = p.rsplit('/').next().unwrap_or(p);
            normalize_name(file.strip_suffix(".md").unwrap_or(file))
        });
        let folder = note_path.map(|p| match p.rsplit_once('/') {
            Some((folder, _)) => folder.to_string(),
            None => String::new(),
        });

        let note_category = parsed
            .frontmatter
            .note_type
            .as_deref()
            .and_then(Category::from_note_type);

        // Already-linked entities, deduplicated, resolution order preserved.
        let mut linked = Vec::new();
        for target in extract_wikilink_targets(text) {
            if let Some(id) = snapshot.resolve_target(&target) {
                if !linked.contains(&id) {
                    linked.push(id);
                }
            }
        }

        let dominant_linked_category = dominant_category(&linked, snapshot);

        // Wikilink zones projected onto the token stream: a link "sits at"
        // the index of the first token after it.
        let (masked, zones) = mask_protected(text);
        let tokens = tokenize(&masked);
        let link_token_positions = zones
            .iter()
            .filter(|z| z.kind == ZoneKind::Wikilink)
            .map(|z| tokens.partition_point(|t| t.start < z.start))
            .collect();

        Self {
            note_path: note_path.map(str::to_string),
            folder,
            own_key,
            note_category,
            linked,
            dominant_linked_category,
            link_token_positions,
            malformed_frontmatter: parsed.malformed_frontmatter,
        }
    }

    /// Distance in tokens from `token_idx` to the nearest existing wikilink
    pub fn distance_to_nearest_link(&self, token_idx: usize) -> Option<usize> {
        self.link_token_positions
            .iter()
            .map(|&pos| pos.abs_diff(token_idx))
            .min()
    }
}

fn dominant_category(linked: &[usize], snapshot: &IndexSnapshot) -> Option<Category> {
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for &id in linked {
        *counts.entry(snapshot.entity(id).category).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .filter(|(_, count)| *count > 0)
        .map(|(category, _)| category)
}
