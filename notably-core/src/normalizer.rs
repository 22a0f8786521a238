//! Phrase normalization
//!
//! Keeps ASCII letters, digits and spaces, lowercases, collapses runs of
//! spaces and splits into tokens. Everything else (punctuation, tabs,
//! accented letters) is dropped outright, so "don't" becomes "dont".

use crate::error::SegmentError;
use serde::Serialize;
use std::fmt;

/// A single normalized word, always `[a-z0-9]+`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty ordered sequence of tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSequence {
    tokens: Vec<Token>,
}

impl TokenSequence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for a constructed sequence
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Tokens in `[start, end)` joined with single spaces
    pub fn join(&self, start: usize, end: usize) -> String {
        self.tokens[start..end]
            .iter()
            .map(Token::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whole sequence as text; `normalize(seq.as_text())` yields `seq`
    pub fn as_text(&self) -> String {
        self.join(0, self.tokens.len())
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.0.clone()).collect()
    }
}

/// Normalize a raw phrase into tokens
///
/// # Errors
/// [`SegmentError::EmptyPhrase`] when nothing searchable remains.
pub fn normalize(text: &str) -> Result<TokenSequence, SegmentError> {
    let tokens: Vec<Token> = canonical_words(text).into_iter().map(Token).collect();

    if tokens.is_empty() {
        return Err(SegmentError::EmptyPhrase);
    }
    Ok(TokenSequence { tokens })
}

/// Canonical text for a track title, used for exact-match comparison
///
/// Same rules as [`normalize`] but never fails; an unsearchable title
/// yields an empty string.
pub fn normalize_title(name: &str) -> String {
    canonical_words(name).join(" ")
}

fn canonical_words(text: &str) -> Vec<String> {
    let filtered: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    filtered
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_lowercases() {
        let seq = normalize("Good Day, Sunshine!").unwrap();
        assert_eq!(seq.to_strings(), vec!["good", "day", "sunshine"]);
    }

    #[test]
    fn test_collapses_and_trims_spaces() {
        let seq = normalize("   hello    world  ").unwrap();
        assert_eq!(seq.as_text(), "hello world");
    }

    #[test]
    fn test_apostrophes_join_words() {
        let seq = normalize("Don't Stop Me Now").unwrap();
        assert_eq!(seq.to_strings(), vec!["dont", "stop", "me", "now"]);
    }

    #[test]
    fn test_non_space_whitespace_is_dropped() {
        // Only the space character separates words
        let seq = normalize("hello\tworld").unwrap();
        assert_eq!(seq.to_strings(), vec!["helloworld"]);
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        let seq = normalize("Café 99 Luftballons").unwrap();
        assert_eq!(seq.to_strings(), vec!["caf", "99", "luftballons"]);
    }

    #[test]
    fn test_empty_phrase_rejected() {
        assert!(matches!(normalize(""), Err(SegmentError::EmptyPhrase)));
        assert!(matches!(normalize("   "), Err(SegmentError::EmptyPhrase)));
        assert!(matches!(normalize("?!... -"), Err(SegmentError::EmptyPhrase)));
    }

    #[test]
    fn test_idempotent() {
        for phrase in ["Hey Jude", "  a  B c!! ", "99 Problems", "x"] {
            let once = normalize(phrase).unwrap();
            let twice = normalize(&once.as_text()).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", phrase);
        }
    }

    #[test]
    fn test_tokens_are_never_empty() {
        let seq = normalize("a - b -- c").unwrap();
        assert!(seq.tokens().iter().all(|t| !t.as_str().is_empty()));
        assert!(seq
            .tokens()
            .iter()
            .all(|t| t.as_str().chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())));
    }

    #[test]
    fn test_join_window() {
        let seq = normalize("one two three four").unwrap();
        assert_eq!(seq.join(1, 3), "two three");
        assert_eq!(seq.join(3, 4), "four");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Good Day (Remastered)"), "good day remastered");
        assert_eq!(normalize_title("!!!"), "");
    }
}
