//! Word Tokenizer
//!
//! Splits text into alphanumeric word tokens with byte spans. Hyphens and
//! all other punctuation are separators, which lines up with the index's
//! name normalization (hyphens become spaces there).

/// A word token with its byte span in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Tokenize into `[A-Za-z0-9]+` runs (Unicode alphanumerics included)
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if start.is_none() {
                start = Some(idx);
            }
        } else if let Some(s) = start.take() {
            tokens.push(Token {
                text: &text[s..idx],
                start: s,
                end: idx,
            });
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &text[s..],
            start: s,
            end: text.len(),
        });
    }

    tokens
}
