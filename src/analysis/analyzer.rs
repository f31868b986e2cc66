//! Analyzer trait and implementations.
//!
//! Analyzers are the complete text processing pipeline:
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Filter 1 → ... → Filter N → Token Stream
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that turn raw text into a token stream.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &str;
}

pub mod pipeline;

pub use pipeline::PipelineAnalyzer;
