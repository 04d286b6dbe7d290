//! Protected Zones
//!
//! Spans the engine must neither read as prose nor alter: YAML frontmatter,
//! fenced code blocks, inline code, and existing wikilinks. Matching runs
//! over a masked copy where every protected character is replaced by a
//! space, one space per byte, so spans in the masked text index the
//! original text directly.

use once_cell::sync::Lazy;
use regex::Regex;

static FRONTMATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\r?\n.*?\r?\n---(?:\r?\n|\z)").expect("valid regex"));

static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`\n]+`").expect("valid regex"));

static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[[^\[\]]+\]\]").expect("valid regex"));

/// Kind of protected span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Frontmatter,
    FencedCode,
    InlineCode,
    Wikilink,
}

/// A protected byte span in the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub start: usize,
    pub end: usize,
    pub kind: ZoneKind,
}

/// Locate all protected zones
pub fn protected_zones(text: &str) -> Vec<Zone> {
    mask_protected(text).1
}

/// Mask protected zones and return the masked text plus the zones
///
/// The masked text has the same byte length as the input; multi-byte
/// characters inside a zone become runs of spaces.
pub fn mask_protected(text: &str) -> (String, Vec<Zone>) {
    let mut zones = Vec::new();
    let mut masked = text.to_string();

    // Frontmatter first: only a fence at offset 0 counts.
    if let Some(m) = FRONTMATTER_RE.find(&masked) {
        zones.push(Zone {
            start: m.start(),
            end: m.end(),
            kind: ZoneKind::Frontmatter,
        });
        masked = apply_mask(&masked, m.start(), m.end());
    }

    // Fenced code blocks: line-oriented scan so an unclosed fence runs to
    // the end of the note.
    for (start, end) in fenced_spans(&masked) {
        zones.push(Zone {
            start,
            end,
            kind: ZoneKind::FencedCode,
        });
        masked = apply_mask(&masked, start, end);
    }

    // Inline code on the already-masked text, so backticks inside fences
    // are gone by now.
    let inline: Vec<(usize, usize)> = INLINE_CODE_RE
        .find_iter(&masked)
        .map(|m| (m.start(), m.end()))
        .collect();
    for (start, end) in inline {
        zones.push(Zone {
            start,
            end,
            kind: ZoneKind::InlineCode,
        });
        masked = apply_mask(&masked, start, end);
    }

    let links: Vec<(usize, usize)> = WIKILINK_RE
        .find_iter(&masked)
        .map(|m| (m.start(), m.end()))
        .collect();
    for (start, end) in links {
        zones.push(Zone {
            start,
            end,
            kind: ZoneKind::Wikilink,
        });
        masked = apply_mask(&masked, start, end);
    }

    zones.sort_by_key(|z| z.start);
    (masked, zones)
}

fn apply_mask(text: &str, start: usize, end: usize) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    for ch in text[start..end].chars() {
        for _ in 0..ch.len_utf8() {
            out.push(' ');
        }
    }
    out.push_str(&text[end..]);
    debug_assert_eq!(out.len(), text.len());
    out
}

/// Byte spans of ``` fenced blocks, including the fence lines
fn fenced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            match open.take() {
                None => open = Some(offset),
                Some(start) => spans.push((start, offset + line.len())),
            }
        }
        offset += line.len();
    }
    if let Some(start) = open {
        spans.push((start, text.len()));
    }
    spans
}
