//! Tokenizer/Matcher Module
//!
//! Converts note text into candidate entity matches. Protected zones
//! (frontmatter, fenced code, inline code, existing wikilinks) are masked
//! before matching and match spans always refer to the original text.

mod matcher;
mod stem;
mod tokens;
mod zones;

pub use matcher::{CandidateMatch, MatchKind, match_entities};
pub use stem::{MIN_STEM_LEN, stem, stem_variants};
pub use tokens::{Token, tokenize};
pub use zones::{Zone, ZoneKind, mask_protected, protected_zones};
