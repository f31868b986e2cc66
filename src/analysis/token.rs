//! Token types and utilities for text analysis.
//!
//! This module defines the core data structures for representing text tokens,
//! which are the fundamental units that flow through the cleaning pipeline.
//!
//! # Examples
//!
//! ```
//! use classbench::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 1, 6, 11);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.start_offset, 6);
//! assert_eq!(token.end_offset, 11);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A token represents a single word of a document after tokenization.
///
/// # Fields
///
/// - `text` - The token's text content
/// - `position` - Position in the token stream (0-based)
/// - `start_offset` / `end_offset` - Byte offsets in the filtered text
/// - `stopped` - Whether the token was marked for removal
///
/// # Examples
///
/// ```
/// use classbench::analysis::token::Token;
///
/// let token = Token::new("review", 0).stop();
/// assert!(token.is_stopped());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the original token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the tokenized text
    pub start_offset: usize,

    /// The byte offset where this token ends in the tokenized text
    pub end_offset: usize,

    /// Whether this token has been marked as stopped (removed) by a filter
    pub stopped: bool,
}

impl Token {
    /// Create a new token whose offsets span its own text.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Token {
            text,
            position,
            start_offset: 0,
            end_offset,
            stopped: false,
        }
    }

    /// Create a new token with explicit byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
            stopped: false,
        }
    }

    /// Replace the token text, keeping position and offsets.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    /// Mark this token as stopped.
    pub fn stop(mut self) -> Self {
        self.stopped = true;
        self
    }

    /// Check if this token is stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of characters in the token text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the token text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A stream of tokens, the unit passed between pipeline stages.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

/// Convert owned token collections into a [`TokenStream`].
pub trait IntoTokenStream {
    fn into_token_stream(self) -> TokenStream;
}

impl IntoTokenStream for Vec<Token> {
    fn into_token_stream(self) -> TokenStream {
        Box::new(self.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new("hello", 0);
        assert_eq!(token.text, "hello");
        assert_eq!(token.position, 0);
        assert_eq!(token.start_offset, 0);
        assert_eq!(token.end_offset, 5);
        assert!(!token.is_stopped());
    }

    #[test]
    fn test_token_with_text_keeps_offsets() {
        let token = Token::with_offsets("Running", 3, 10, 17).with_text("run");
        assert_eq!(token.text, "run");
        assert_eq!(token.position, 3);
        assert_eq!(token.start_offset, 10);
        assert_eq!(token.end_offset, 17);
    }

    #[test]
    fn test_char_len_counts_code_points() {
        assert_eq!(Token::new("caf\u{e9}", 0).char_len(), 4);
        assert!(Token::new("", 0).is_empty());
    }

    #[test]
    fn test_into_token_stream() {
        let stream = vec![Token::new("a", 0), Token::new("b", 1)].into_token_stream();
        let texts: Vec<String> = stream.map(|t| t.to_string()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
