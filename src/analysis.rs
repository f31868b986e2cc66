//! Text analysis module for classbench.
//!
//! This module provides the text cleaning pipeline: char filters,
//! tokenization, token filters and the [`cleaner::TextCleaner`] that wires
//! them together for review text.

pub mod analyzer;
pub mod char_filter;
pub mod cleaner;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use cleaner::{CleanOptions, Cleaned, TextCleaner, clean};
