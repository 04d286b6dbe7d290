//! Vault Scanning
//!
//! Walks the vault root, reads every Markdown file outside the excluded
//! folders, and parses each into a `NoteFile`.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

use super::note::{NoteFile, parse_note};

/// Folders skipped during the scan unless the caller overrides them
pub const DEFAULT_EXCLUDED_FOLDERS: &[&str] =
    &["daily notes", "templates", "attachments", "inbox", "clippings"];

/// Result of one vault scan
#[derive(Debug, Clone, Default)]
pub struct VaultScan {
    /// Parsed notes in path order
    pub notes: Vec<NoteFile>,
    /// Paths of notes whose frontmatter failed to parse
    pub malformed: Vec<String>,
}

/// Scan every Markdown file under `root`, skipping `excluded` folders
///
/// Exclusion compares each path component case-insensitively against the
/// excluded folder names, so `Templates/weekly.md` and
/// `archive/templates/x.md` are both skipped for the entry `templates`.
pub fn scan_vault(root: &Path, excluded: &[String]) -> io::Result<VaultScan> {
    let mut scan = VaultScan::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !excluded.iter().any(|ex| name.eq_ignore_ascii_case(ex))
        });

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let raw = std::fs::read_to_string(path)?;
        let note = parse_note(&relative, &raw);
        if note.malformed_frontmatter {
            scan.malformed.push(note.path.clone());
        }
        scan.notes.push(note);
    }

    tracing::info!(
        root = %root.display(),
        notes = scan.notes.len(),
        malformed = scan.malformed.len(),
        "vault scan complete"
    );

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_note(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_scan_skips_excluded_folders() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "projects/Linkwheel.md", "# Linkwheel");
        write_note(dir.path(), "Templates/Daily.md", "template body");
        write_note(dir.path(), "notes/inbox/Todo.md", "inbox body");

        let excluded: Vec<String> = DEFAULT_EXCLUDED_FOLDERS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let scan = scan_vault(dir.path(), &excluded).unwrap();

        let paths: Vec<&str> = scan.notes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["projects/Linkwheel.md"]);
    }

    #[test]
    fn test_scan_ignores_non_markdown() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "a.md", "a");
        write_note(dir.path(), "b.txt", "b");
        write_note(dir.path(), "image.png", "binaryish");

        let scan = scan_vault(dir.path(), &[]).unwrap();
        assert_eq!(scan.notes.len(), 1);
        assert_eq!(scan.notes[0].title, "a");
    }

    #[test]
    fn test_scan_collects_malformed_paths() {
        let dir = tempfile::tempdir().unwrap();
        write_note(dir.path(), "bad.md", "---\ntype: [oops\n---\nbody");
        write_note(dir.path(), "good.md", "---\ntype: concept\n---\nbody");

        let scan = scan_vault(dir.path(), &[]).unwrap();
        assert_eq!(scan.malformed, vec!["bad.md"]);
        assert_eq!(scan.notes.len(), 2);
    }
}
