//! Note Parsing
//!
//! Splits a raw Markdown note into frontmatter, body, and wikilink targets.
//! Frontmatter that fails to parse marks the note as malformed; the note is
//! then treated as if it had no frontmatter at all.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

/// Leading `---` fence through the matching `---` fence, at offset 0 only
static FRONTMATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---(?:\r?\n|\z)").expect("valid regex"));

/// `[[Target]]` and piped `[[Target|Display]]`
static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]|]+)(?:\|[^\[\]]*)?\]\]").expect("valid regex"));

/// Parsed YAML frontmatter fields the engine cares about
///
/// Unknown keys are tolerated; vault frontmatter carries plenty of fields
/// (tags, dates, custom properties) that are not the engine's business.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    /// Explicit note type, first source of truth for the entity category
    #[serde(default, rename = "type")]
    pub note_type: Option<String>,
    /// Alternative names this note may be referred to by
    #[serde(default, deserialize_with = "string_or_seq")]
    pub aliases: Vec<String>,
    /// Curated hub-score boost added on top of the in-link count
    #[serde(default)]
    pub hub_boost: Option<u32>,
}

/// Obsidian vaults write `aliases` both as a YAML list and as a bare string
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// A scanned Markdown note
#[derive(Debug, Clone)]
pub struct NoteFile {
    /// Vault-relative path, forward slashes, with extension
    pub path: String,
    /// Basename without extension; the note's candidate entity name
    pub title: String,
    /// Vault-relative parent folder, empty for the vault root
    pub folder: String,
    /// Parsed frontmatter (default when absent or malformed)
    pub frontmatter: Frontmatter,
    /// Full raw text including frontmatter
    pub content: String,
    /// Raw wikilink targets in order of appearance, duplicates preserved
    pub links: Vec<String>,
    /// True when a frontmatter block was present but failed to parse
    pub malformed_frontmatter: bool,
}

/// Extract raw wikilink targets (`[[Target]]`, `[[Target|Display]]`) in order
pub fn extract_wikilink_targets(text: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(text)
        .map(|cap| cap[1].trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a raw note into a `NoteFile`
///
/// `path` must be vault-relative with forward slashes.
pub fn parse_note(path: &str, raw: &str) -> NoteFile {
    let (title, folder) = split_path(path);

    let mut malformed = false;
    let frontmatter = match FRONTMATTER_RE.captures(raw) {
        Some(cap) => match serde_yaml::from_str::<Frontmatter>(&cap[1]) {
            Ok(fm) => fm,
            Err(err) => {
                tracing::warn!(note = path, error = %err, "malformed frontmatter, ignoring");
                malformed = true;
                Frontmatter::default()
            }
        },
        None => Frontmatter::default(),
    };

    NoteFile {
        path: path.to_string(),
        title,
        folder,
        frontmatter,
        content: raw.to_string(),
        links: extract_wikilink_targets(raw),
        malformed_frontmatter: malformed,
    }
}

fn split_path(path: &str) -> (String, String) {
    let (folder, file) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };
    let title = file.strip_suffix(".md").unwrap_or(file).to_string();
    (title, folder.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_with_frontmatter() {
        let raw = "---\ntype: person\naliases:\n  - Bob\n  - Bobby\n---\nSome text about [[Alice]].\n";
        let note = parse_note("people/Bob Smith.md", raw);

        assert_eq!(note.title, "Bob Smith");
        assert_eq!(note.folder, "people");
        assert_eq!(note.frontmatter.note_type.as_deref(), Some("person"));
        assert_eq!(note.frontmatter.aliases, vec!["Bob", "Bobby"]);
        assert_eq!(note.links, vec!["Alice"]);
        assert!(!note.malformed_frontmatter);
    }

    #[test]
    fn test_aliases_accepts_bare_string() {
        let raw = "---\naliases: TS\n---\nbody\n";
        let note = parse_note("TypeScript.md", raw);
        assert_eq!(note.frontmatter.aliases, vec!["TS"]);
    }

    #[test]
    fn test_malformed_frontmatter_is_flagged_not_fatal() {
        let raw = "---\ntype: [unclosed\n---\nbody\n";
        let note = parse_note("x.md", raw);
        assert!(note.malformed_frontmatter);
        assert!(note.frontmatter.note_type.is_none());
        assert_eq!(note.content, raw);
    }

    #[test]
    fn test_frontmatter_only_at_start() {
        let raw = "intro\n---\ntype: person\n---\n";
        let note = parse_note("x.md", raw);
        assert!(note.frontmatter.note_type.is_none());
        assert!(!note.malformed_frontmatter);
    }

    #[test]
    fn test_piped_wikilinks_yield_target() {
        let targets = extract_wikilink_targets("See [[React Native|RN]] and [[React]].");
        assert_eq!(targets, vec!["React Native", "React"]);
    }

    #[test]
    fn test_root_note_has_empty_folder() {
        let note = parse_note("Index.md", "hello");
        assert_eq!(note.folder, "");
        assert_eq!(note.title, "Index");
    }
}
