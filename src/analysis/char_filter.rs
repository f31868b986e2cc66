//! Character filters applied to raw text before tokenization.
//!
//! A char filter sees the whole document as a string and returns a new
//! string. It runs ahead of the tokenizer, so it is the place to strip
//! markup, punctuation or digits that should never become tokens.

/// Trait for filters that rewrite raw text ahead of tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod pattern_replace;
