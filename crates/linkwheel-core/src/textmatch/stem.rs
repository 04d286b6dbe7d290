//! Suffix Stemmer
//!
//! Light suffix stripping for stem matches: final `ing`, `es`, `ed`, `ly`,
//! `s`. A stem shorter than three characters is rejected and the word is
//! returned unchanged.

/// Minimum stem length
pub const MIN_STEM_LEN: usize = 3;

const SUFFIXES: &[&str] = &["ing", "es", "ed", "ly", "s"];

/// Strip one suffix from a lowercase word
pub fn stem(word: &str) -> &str {
    for suffix in SUFFIXES {
        if let Some(stripped) = word.strip_suffix(suffix) {
            if stripped.len() >= MIN_STEM_LEN {
                return stripped;
            }
        }
    }
    word
}

/// All stem candidates of a word: the word itself plus every suffix strip
/// that leaves a long-enough stem
///
/// Matching tries every variant because suffixes overlap: "obscures" must
/// reach both "obscur" (−es) and "obscure" (−s) to line up with whichever
/// form the entity name stems to.
pub fn stem_variants(word: &str) -> Vec<&str> {
    let mut variants = Vec::with_capacity(3);
    if word.len() >= MIN_STEM_LEN {
        variants.push(word);
    }
    for suffix in SUFFIXES {
        if let Some(stripped) = word.strip_suffix(suffix) {
            if stripped.len() >= MIN_STEM_LEN && !variants.contains(&stripped) {
                variants.push(stripped);
            }
        }
    }
    variants
}
