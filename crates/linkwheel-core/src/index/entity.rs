//! Entity Model
//!
//! A linkable entity is a vault note: its basename is the canonical display
//! name, its frontmatter and folder decide the category, and its in-link
//! count plus any curated boost form the hub score.

use serde::{Deserialize, Serialize};

/// Entity categories
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    People,
    Projects,
    Technologies,
    Organizations,
    Locations,
    Concepts,
    Health,
    Acronyms,
    #[default]
    Other,
    Animals,
    Media,
    Events,
    Documents,
    Finance,
    Food,
    Hobbies,
}

impl Category {
    /// Stable string form, matches the persisted `category` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Projects => "projects",
            Category::Technologies => "technologies",
            Category::Organizations => "organizations",
            Category::Locations => "locations",
            Category::Concepts => "concepts",
            Category::Health => "health",
            Category::Acronyms => "acronyms",
            Category::Other => "other",
            Category::Animals => "animals",
            Category::Media => "media",
            Category::Events => "events",
            Category::Documents => "documents",
            Category::Finance => "finance",
            Category::Food => "food",
            Category::Hobbies => "hobbies",
        }
    }

    /// Parse the persisted column form; unknown values fall back to Other
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "people" => Category::People,
            "projects" => Category::Projects,
            "technologies" => Category::Technologies,
            "organizations" => Category::Organizations,
            "locations" => Category::Locations,
            "concepts" => Category::Concepts,
            "health" => Category::Health,
            "acronyms" => Category::Acronyms,
            "animals" => Category::Animals,
            "media" => Category::Media,
            "events" => Category::Events,
            "documents" => Category::Documents,
            "finance" => Category::Finance,
            "food" => Category::Food,
            "hobbies" => Category::Hobbies,
            _ => Category::Other,
        }
    }

    /// Resolve an explicit frontmatter `type` value
    ///
    /// Accepts the singular/plural spellings seen in real vaults. Returns
    /// None for unrecognized values so the folder rule can take over.
    pub fn from_note_type(s: &str) -> Option<Self> {
        let t = s.trim().to_lowercase();
        let category = match t.as_str() {
            "person" | "people" | "contact" => Category::People,
            "project" | "projects" => Category::Projects,
            "technology" | "technologies" | "tech" | "tool" => Category::Technologies,
            "organization" | "organizations" | "org" | "company" => Category::Organizations,
            "location" | "locations" | "place" => Category::Locations,
            "concept" | "concepts" | "idea" => Category::Concepts,
            "health" => Category::Health,
            "acronym" | "acronyms" => Category::Acronyms,
            "animal" | "animals" | "pet" => Category::Animals,
            "media" | "book" | "movie" | "show" | "podcast" => Category::Media,
            "event" | "events" => Category::Events,
            "document" | "documents" | "doc" => Category::Documents,
            "finance" | "finances" => Category::Finance,
            "food" | "recipe" => Category::Food,
            "hobby" | "hobbies" => Category::Hobbies,
            _ => return None,
        };
        Some(category)
    }

    /// Folder-based rule table, applied when frontmatter gives no type
    ///
    /// Checks every component of the note's folder path so nested layouts
    /// like `areas/health/sleep` still classify.
    pub fn from_folder(folder: &str) -> Option<Self> {
        for component in folder.split('/') {
            let category = match component.to_lowercase().as_str() {
                "people" | "contacts" => Category::People,
                "projects" => Category::Projects,
                "tech" | "technologies" | "tools" => Category::Technologies,
                "orgs" | "organizations" | "companies" => Category::Organizations,
                "places" | "locations" | "travel" => Category::Locations,
                "concepts" | "ideas" => Category::Concepts,
                "health" | "fitness" => Category::Health,
                "acronyms" => Category::Acronyms,
                "animals" | "pets" => Category::Animals,
                "media" | "books" | "movies" => Category::Media,
                "events" => Category::Events,
                "documents" | "docs" | "reference" => Category::Documents,
                "finance" | "money" => Category::Finance,
                "food" | "recipes" => Category::Food,
                "hobbies" => Category::Hobbies,
                _ => continue,
            };
            return Some(category);
        }
        None
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A linkable entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Canonical display name, preserved verbatim in suggestions
    pub name: String,
    pub category: Category,
    /// Vault-relative path of the source note
    pub path: String,
    /// Vault-relative folder of the source note
    pub folder: String,
    /// Alternative names, order preserved from frontmatter
    pub aliases: Vec<String>,
    /// In-link count plus curated boost
    pub hub_score: u32,
}

/// Canonical comparison key: lowercase, hyphens to spaces, collapsed whitespace
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for ch in name.chars() {
        let ch = if ch == '-' { ' ' } else { ch };
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        }
    }
    out
}
