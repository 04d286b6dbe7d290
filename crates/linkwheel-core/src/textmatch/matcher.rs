//! Candidate Matching
//!
//! Scans masked note text for entity mentions. Three match kinds: exact
//! canonical name, alias, and stem. Greedy leftmost-longest: at any given
//! span the longest matching name wins and shorter names inside that span
//! are skipped.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::index::IndexSnapshot;

use super::stem::stem_variants;
use super::tokens::{Token, tokenize};
use super::zones::mask_protected;

/// How a candidate was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Stem,
    Alias,
}

/// A candidate entity match, aggregated over all its occurrences
#[derive(Debug, Clone)]
pub struct CandidateMatch {
    /// Entity id in the snapshot
    pub entity: usize,
    /// Best kind seen: exact beats alias beats stem
    pub kind: MatchKind,
    /// First-occurrence byte span in the original text
    pub first_start: usize,
    pub first_end: usize,
    /// First-occurrence position in the token stream
    pub first_token: usize,
    pub exact_count: u32,
    pub alias_count: u32,
    pub stem_count: u32,
}

impl CandidateMatch {
    fn new(entity: usize, kind: MatchKind, token: &Token<'_>, token_idx: usize) -> Self {
        Self {
            entity,
            kind,
            first_start: token.start,
            first_end: token.end,
            first_token: token_idx,
            exact_count: 0,
            alias_count: 0,
            stem_count: 0,
        }
    }
}

/// Match entities in `text`, first-occurrence order preserved
pub fn match_entities(text: &str, snapshot: &IndexSnapshot) -> Vec<CandidateMatch> {
    let (masked, _zones) = mask_protected(text);
    let tokens = tokenize(&masked);
    let norms: Vec<String> = tokens.iter().map(|t| t.text.to_lowercase()).collect();

    let mut order: Vec<usize> = Vec::new();
    let mut found: HashMap<usize, CandidateMatch> = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        // Exact / alias: longest name starting at this token.
        let mut best: Option<(usize, usize, Option<&str>)> = None; // (words, entity, alias)
        for name_ref in snapshot.name_refs(&norms[i]) {
            let len = name_ref.words.len();
            if i + len > tokens.len() {
                continue;
            }
            if !name_ref
                .words
                .iter()
                .zip(&norms[i..i + len])
                .all(|(w, t)| w == t)
            {
                continue;
            }
            if let Some(alias) = name_ref.alias.as_deref() {
                if is_short_code(alias)
                    && !short_code_context_ok(text, &tokens[i..i + len], alias)
                {
                    continue;
                }
            }
            let better = match best {
                None => true,
                // Longest wins; ties prefer the canonical name.
                Some((blen, _, balias)) => {
                    len > blen || (len == blen && balias.is_some() && name_ref.alias.is_none())
                }
            };
            if better {
                best = Some((len, name_ref.entity, name_ref.alias.as_deref()));
            }
        }

        if let Some((len, entity, alias)) = best {
            let end_token = &tokens[i + len - 1];
            let kind = if alias.is_some() {
                MatchKind::Alias
            } else {
                MatchKind::Exact
            };
            let entry = found.entry(entity).or_insert_with(|| {
                order.push(entity);
                CandidateMatch::new(entity, kind, &tokens[i], i)
            });
            match kind {
                MatchKind::Alias => entry.alias_count += 1,
                _ => entry.exact_count += 1,
            }
            if rank(kind) > rank(entry.kind) {
                entry.kind = kind;
            }
            // Span end covers the full multi-word name.
            if entry.first_token == i {
                entry.first_end = end_token.end;
            }
            i += len;
            continue;
        }

        // Stem fallback on the single token. Tokens consumed by an exact or
        // alias span never reach this branch, so every count here is a
        // stem-only occurrence. Every stem variant is tried because token
        // and entity name can stem to different forms of the same word.
        let mut hit_this_token: HashSet<usize> = HashSet::new();
        for variant in stem_variants(&norms[i]) {
            for &entity in snapshot.stem_entities(variant) {
                if !hit_this_token.insert(entity) {
                    continue;
                }
                let entry = found.entry(entity).or_insert_with(|| {
                    order.push(entity);
                    CandidateMatch::new(entity, MatchKind::Stem, &tokens[i], i)
                });
                entry.stem_count += 1;
            }
        }
        i += 1;
    }

    order
        .into_iter()
        .map(|id| found.remove(&id).expect("ordered entity recorded"))
        .collect()
}

fn rank(kind: MatchKind) -> u8 {
    match kind {
        MatchKind::Stem => 0,
        MatchKind::Alias => 1,
        MatchKind::Exact => 2,
    }
}

/// Short-code aliases: 2-3 uppercase alphanumerics ("STG", "ML")
fn is_short_code(alias: &str) -> bool {
    (2..=3).contains(&alias.len())
        && alias
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Guard for short-code aliases: the occurrence must be verbatim uppercase
/// and either punctuation-bounded or inside a majority-uppercase window.
/// Suppresses the "stg"/"TS"/"ML" false-positive class in prose.
fn short_code_context_ok(text: &str, span_tokens: &[Token<'_>], alias: &str) -> bool {
    let start = span_tokens[0].start;
    let end = span_tokens[span_tokens.len() - 1].end;
    if &text[start..end] != alias {
        return false;
    }

    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let punct = |c: Option<char>| matches!(c, Some(c) if c.is_ascii_punctuation());
    if punct(before) || punct(after) {
        return true;
    }

    // Majority-uppercase window of surrounding letters.
    let window_start = start.saturating_sub(30);
    let window_end = (end + 30).min(text.len());
    let window: String = text
        .char_indices()
        .filter(|(i, _)| (*i >= window_start && *i < start) || (*i >= end && *i < window_end))
        .map(|(_, c)| c)
        .collect();
    let letters: Vec<char> = window.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return true;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper * 2 >= letters.len()
}
