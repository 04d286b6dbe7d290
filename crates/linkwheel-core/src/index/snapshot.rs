//! Index Snapshot
//!
//! The immutable product of one index build. Readers always hold a complete
//! snapshot; rebuilds assemble a fresh one and swap it in atomically.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::textmatch::{MatchKind, mask_protected, stem, stem_variants, tokenize};
use crate::vault::{NoteFile, VaultScan};

use super::entity::{Category, Entity, normalize_name};

/// Aliases shorter than this (normalized) are never indexed
pub const MIN_ALIAS_LEN: usize = 3;

/// One matchable name (canonical or alias) keyed by its first word
#[derive(Debug, Clone)]
pub struct NameRef {
    /// Entity this name belongs to
    pub entity: usize,
    /// Normalized words of the name
    pub words: Vec<String>,
    /// Raw alias text when this ref is an alias, None for the canonical name
    pub alias: Option<String>,
}

/// A single-token lookup hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupHit {
    pub entity: usize,
    pub kind: MatchKind,
}

/// Aggregate index statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total: usize,
    pub aliases: usize,
    pub per_category: BTreeMap<String, usize>,
    pub note_count: usize,
    pub built_at: DateTime<Utc>,
}

/// Immutable entity index snapshot
#[derive(Debug)]
pub struct IndexSnapshot {
    entities: Vec<Entity>,
    by_key: HashMap<String, usize>,
    alias_key: HashMap<String, Vec<usize>>,
    name_refs: HashMap<String, Vec<NameRef>>,
    stem_refs: HashMap<String, Vec<usize>>,
    doc_count: usize,
    doc_freq: HashMap<String, u32>,
    /// Per entity: indices of notes that link to it
    linking_notes: Vec<BTreeSet<u32>>,
    /// Resolved edges (note index, entity id) for persistence and graph use
    resolved_links: Vec<(u32, u32)>,
    note_paths: Vec<String>,
    built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    /// Build a snapshot from a vault scan
    ///
    /// Every scanned note contributes a candidate entity named after its
    /// basename. Duplicate canonical names (case-insensitive, hyphens as
    /// spaces) keep the first note and skip the rest.
    pub fn build(scan: &VaultScan) -> Self {
        let mut entities: Vec<Entity> = Vec::with_capacity(scan.notes.len());
        let mut seen: HashSet<String> = HashSet::new();

        for note in &scan.notes {
            let key = normalize_name(&note.title);
            if key.is_empty() {
                continue;
            }
            if !seen.insert(key) {
                tracing::warn!(
                    note = %note.path,
                    name = %note.title,
                    "duplicate canonical name, keeping first"
                );
                continue;
            }
            let category = note
                .frontmatter
                .note_type
                .as_deref()
                .and_then(Category::from_note_type)
                .or_else(|| Category::from_folder(&note.folder))
                .unwrap_or_default();
            entities.push(Entity {
                name: note.title.clone(),
                category,
                path: note.path.clone(),
                folder: note.folder.clone(),
                aliases: note.frontmatter.aliases.clone(),
                hub_score: 0,
            });
        }

        let mut snapshot = Self::assemble(entities, &scan.notes);

        // Hub score = in-link occurrences + curated boost.
        let mut inlinks = vec![0u32; snapshot.entities.len()];
        for &(_, entity) in &snapshot.resolved_links {
            inlinks[entity as usize] += 1;
        }
        let boosts: HashMap<String, u32> = scan
            .notes
            .iter()
            .filter_map(|n| n.frontmatter.hub_boost.map(|b| (n.path.clone(), b)))
            .collect();
        for (id, entity) in snapshot.entities.iter_mut().enumerate() {
            let curated = boosts.get(&entity.path).copied().unwrap_or(0);
            entity.hub_score = inlinks[id] + curated;
        }

        snapshot
    }

    /// Assemble a snapshot from pre-built entities plus the notes that back
    /// them (fixture path: hub scores are taken as given)
    pub fn from_entities(entities: Vec<Entity>, notes: &[NoteFile]) -> Self {
        Self::assemble(entities, notes)
    }

    fn assemble(entities: Vec<Entity>, notes: &[NoteFile]) -> Self {
        let mut by_key: HashMap<String, usize> = HashMap::new();
        let mut alias_key: HashMap<String, Vec<usize>> = HashMap::new();
        let mut name_refs: HashMap<String, Vec<NameRef>> = HashMap::new();
        let mut stem_refs: HashMap<String, Vec<usize>> = HashMap::new();

        for (id, entity) in entities.iter().enumerate() {
            let key = normalize_name(&entity.name);
            let words: Vec<String> = key.split(' ').map(str::to_string).collect();
            if let Some(first) = words.first() {
                name_refs.entry(first.clone()).or_default().push(NameRef {
                    entity: id,
                    words: words.clone(),
                    alias: None,
                });
                let s = stem(first);
                if s.len() >= 3 {
                    stem_refs.entry(s.to_string()).or_default().push(id);
                }
            }
            by_key.entry(key).or_insert(id);

            for alias in &entity.aliases {
                let akey = normalize_name(alias);
                if akey.len() < MIN_ALIAS_LEN || by_key.get(&akey) == Some(&id) {
                    continue;
                }
                let words: Vec<String> = akey.split(' ').map(str::to_string).collect();
                if let Some(first) = words.first() {
                    name_refs.entry(first.clone()).or_default().push(NameRef {
                        entity: id,
                        words,
                        alias: Some(alias.clone()),
                    });
                }
                alias_key.entry(akey).or_default().push(id);
            }
        }

        // Document frequencies over masked prose, for IDF weighting.
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        for note in notes {
            let (masked, _) = mask_protected(&note.content);
            let unique: HashSet<String> = tokenize(&masked)
                .iter()
                .map(|t| t.text.to_lowercase())
                .collect();
            for token in unique {
                *doc_freq.entry(token).or_default() += 1;
            }
        }

        // Resolve wikilink targets to entities for hub scores, co-occurrence
        // sets, and the persisted note_links edges.
        let mut linking_notes = vec![BTreeSet::new(); entities.len()];
        let mut resolved_links = Vec::new();
        for (note_idx, note) in notes.iter().enumerate() {
            for raw in &note.links {
                let Some(target) = resolve_target_key(raw) else {
                    continue;
                };
                let Some(&id) = by_key.get(&target) else {
                    continue;
                };
                if entities[id].path == note.path {
                    continue;
                }
                linking_notes[id].insert(note_idx as u32);
                resolved_links.push((note_idx as u32, id as u32));
            }
        }

        Self {
            entities,
            by_key,
            alias_key,
            name_refs,
            stem_refs,
            doc_count: notes.len(),
            doc_freq,
            linking_notes,
            resolved_links,
            note_paths: notes.iter().map(|n| n.path.clone()).collect(),
            built_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: usize) -> &Entity {
        &self.entities[id]
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    /// Entity id for a canonical name (normalized comparison)
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.by_key.get(&normalize_name(name)).copied()
    }

    /// Resolve a raw wikilink target (may carry folders, anchors, extension)
    pub fn resolve_target(&self, raw: &str) -> Option<usize> {
        resolve_target_key(raw).and_then(|key| self.by_key.get(&key).copied())
    }

    /// Matchable names starting with `first_word` (normalized)
    pub fn name_refs(&self, first_word: &str) -> &[NameRef] {
        self.name_refs
            .get(first_word)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entities whose canonical first word stems to `stem_key`
    pub fn stem_entities(&self, stem_key: &str) -> &[usize] {
        self.stem_refs
            .get(stem_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Single-token lookup: exact canonical, then alias, then stem
    pub fn lookup(&self, token: &str) -> Vec<LookupHit> {
        let key = normalize_name(token);
        let mut hits = Vec::new();
        let mut seen = HashSet::new();

        if let Some(&id) = self.by_key.get(&key) {
            seen.insert(id);
            hits.push(LookupHit {
                entity: id,
                kind: MatchKind::Exact,
            });
        }
        if let Some(ids) = self.alias_key.get(&key) {
            for &id in ids {
                if seen.insert(id) {
                    hits.push(LookupHit {
                        entity: id,
                        kind: MatchKind::Alias,
                    });
                }
            }
        }
        for variant in stem_variants(&key) {
            for &id in self.stem_entities(variant) {
                if seen.insert(id) {
                    hits.push(LookupHit {
                        entity: id,
                        kind: MatchKind::Stem,
                    });
                }
            }
        }
        hits
    }

    /// IDF factor in [0.5, 1.5]: rare tokens score high, ubiquitous low
    pub fn idf_factor(&self, token: &str) -> f64 {
        if self.doc_count == 0 {
            return 1.0;
        }
        let df = self
            .doc_freq
            .get(&token.to_lowercase())
            .copied()
            .unwrap_or(0) as f64;
        let n = self.doc_count as f64;
        let scaled = (((n + 1.0) / (df + 1.0)).ln() / (n + 1.0).ln()).clamp(0.0, 1.0);
        0.5 + scaled
    }

    /// IDF factor for an entity name: its rarest word governs
    pub fn name_idf_factor(&self, entity: usize) -> f64 {
        normalize_name(&self.entities[entity].name)
            .split(' ')
            .map(|w| self.idf_factor(w))
            .fold(1.0f64, f64::max)
    }

    /// Normalized pointwise mutual information between two entities'
    /// linking-note sets, clamped to [0, 1]
    pub fn cooccurrence_npmi(&self, a: usize, b: usize) -> f64 {
        if a == b || self.doc_count == 0 {
            return 0.0;
        }
        let sa = &self.linking_notes[a];
        let sb = &self.linking_notes[b];
        let both = sa.intersection(sb).count() as f64;
        if both == 0.0 {
            return 0.0;
        }
        let n = self.doc_count as f64;
        let p_ab = both / n;
        if p_ab >= 1.0 {
            return 1.0;
        }
        let p_a = sa.len() as f64 / n;
        let p_b = sb.len() as f64 / n;
        let pmi = (p_ab / (p_a * p_b)).ln();
        (pmi / -p_ab.ln()).clamp(0.0, 1.0)
    }

    /// Resolved (note path, entity name) edges for persistence
    pub fn note_link_rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolved_links.iter().map(|&(note, entity)| {
            (
                self.note_paths[note as usize].as_str(),
                self.entities[entity as usize].name.as_str(),
            )
        })
    }

    /// Top-N entities by hub score, ties broken by name
    pub fn hub_top(&self, n: usize) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self
            .entities
            .iter()
            .map(|e| (e.name.clone(), e.hub_score))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn stats(&self) -> IndexStats {
        let mut per_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut aliases = 0;
        for entity in &self.entities {
            *per_category
                .entry(entity.category.as_str().to_string())
                .or_default() += 1;
            aliases += entity.aliases.len();
        }
        IndexStats {
            total: self.entities.len(),
            aliases,
            per_category,
            note_count: self.doc_count,
            built_at: self.built_at,
        }
    }
}

/// Normalize a raw wikilink target to a canonical lookup key
fn resolve_target_key(raw: &str) -> Option<String> {
    let mut target = raw;
    for sep in ['#', '^'] {
        if let Some(idx) = target.find(sep) {
            target = &target[..idx];
        }
    }
    if let Some(idx) = target.rfind('/') {
        target = &target[idx + 1..];
    }
    let target = target.strip_suffix(".md").unwrap_or(target);
    let key = normalize_name(target);
    if key.is_empty() { None } else { Some(key) }
}
