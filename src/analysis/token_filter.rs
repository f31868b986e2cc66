//! Token filter implementations for token transformation.
//!
//! This module provides filters that transform token streams produced by
//! tokenizers. Filters can modify or remove tokens to implement lowercasing,
//! length limits, stop word removal, stemming and lemmatization.
//!
//! # Available Filters
//!
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`length::LengthFilter`] - Drops tokens outside a character length range
//! - [`stop::StopFilter`] - Removes stop words
//! - [`stem::StemFilter`] - Reduces words to their stem form
//! - [`lemma::LemmaFilter`] - Replaces words with their dictionary lemma
//!
//! # Examples
//!
//! ```
//! use classbench::analysis::token_filter::Filter;
//! use classbench::analysis::token_filter::lowercase::LowercaseFilter;
//! use classbench::analysis::token::Token;
//!
//! let filter = LowercaseFilter::new();
//! let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
//! let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(filtered[0].text, "hello");
//! assert_eq!(filtered[1].text, "world");
//! ```
//!
//! # Filter Chaining
//!
//! The cleaner chains filters in a fixed order:
//!
//! ```text
//! Tokenizer → Lowercase → Length → Stop Words → Stemmer → Lemmatizer (v, n, a)
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
///
/// Filters receive a stream of tokens and produce a new stream. Tokens
/// already marked as stopped pass through untouched.
///
/// The trait requires `Send + Sync` to allow use in concurrent contexts.
///
/// # Examples
///
/// Implementing a custom filter:
///
/// ```
/// use classbench::analysis::token::{Token, TokenStream};
/// use classbench::analysis::token_filter::Filter;
/// use classbench::error::Result;
///
/// struct ReverseFilter;
///
/// impl Filter for ReverseFilter {
///     fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
///         let reversed: Vec<Token> = tokens
///             .map(|mut t| {
///                 t.text = t.text.chars().rev().collect();
///                 t
///             })
///             .collect();
///         Ok(Box::new(reversed.into_iter()))
///     }
///
///     fn name(&self) -> &'static str {
///         "reverse"
///     }
/// }
/// ```
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod lemma;
pub mod length;
pub mod lowercase;
pub mod stem;
pub mod stop;
