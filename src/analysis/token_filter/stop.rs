//! Stop filter implementation.
//!
//! This module provides a filter that removes common words (stop words) that
//! carry little signal for classification. Stop words come from a
//! [`StopwordSource`]: either the built-in English list or a word-per-line
//! file supplied at runtime.
//!
//! # Examples
//!
//! ```
//! use classbench::analysis::token_filter::Filter;
//! use classbench::analysis::token_filter::stop::StopFilter;
//! use classbench::analysis::token::Token;
//!
//! let filter = StopFilter::new(); // Uses default English stop words
//! let tokens = vec![
//!     Token::new("the", 0),
//!     Token::new("quick", 1),
//!     Token::new("brown", 2)
//! ];
//!
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result[0].text, "quick");
//! assert_eq!(result[1].text, "brown");
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::{ClassbenchError, Result};

/// Default English stop words list.
///
/// The widely used 179-word English list, contractions and their
/// apostrophe-less fragments included.
const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// Default English stop words as a HashSet.
pub static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<String>> = LazyLock::new(|| {
    DEFAULT_ENGLISH_STOP_WORDS
        .iter()
        .map(|&s| s.to_string())
        .collect()
});

/// A provider of stop words.
///
/// Implementations may read from disk; failures surface as errors instead
/// of silently yielding an empty list.
pub trait StopwordSource: Send + Sync {
    /// Load the stop word set.
    fn stopwords(&self) -> Result<HashSet<String>>;

    /// Short description used in log output.
    fn describe(&self) -> String;
}

/// The built-in English list.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishStopwords;

impl StopwordSource for EnglishStopwords {
    fn stopwords(&self) -> Result<HashSet<String>> {
        Ok(DEFAULT_ENGLISH_STOP_WORDS_SET.clone())
    }

    fn describe(&self) -> String {
        "english (built-in)".to_string()
    }
}

/// A plain text file with one stop word per line.
///
/// Blank lines and lines starting with `#` are skipped. Words are trimmed
/// and lowercased.
#[derive(Clone, Debug)]
pub struct StopwordFile {
    path: PathBuf,
}

impl StopwordFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        StopwordFile {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StopwordSource for StopwordFile {
    fn stopwords(&self) -> Result<HashSet<String>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ClassbenchError::resource(format!(
                "cannot read stop word list {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A filter that removes stop words from the token stream.
///
/// The filter can either remove stop words entirely or mark them as stopped
/// while keeping them in the stream.
///
/// # Examples
///
/// ```
/// use classbench::analysis::token_filter::Filter;
/// use classbench::analysis::token_filter::stop::StopFilter;
/// use classbench::analysis::token::Token;
///
/// // Mark as stopped but don't remove
/// let filter = StopFilter::from_words(vec!["the"]).remove_stopped(false);
/// let tokens = vec![Token::new("the", 0), Token::new("quick", 1)];
///
/// let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
///     .unwrap()
///     .collect();
///
/// assert_eq!(result.len(), 2);
/// assert!(result[0].is_stopped());
/// assert!(!result[1].is_stopped());
/// ```
#[derive(Clone, Debug)]
pub struct StopFilter {
    /// The set of stop words to remove
    stop_words: Arc<HashSet<String>>,
    /// Whether to remove stopped tokens entirely or just mark them as stopped
    remove_stopped: bool,
}

impl StopFilter {
    /// Create a new stop filter with the default English stop words.
    ///
    /// # Examples
    ///
    /// ```
    /// use classbench::analysis::token_filter::stop::StopFilter;
    ///
    /// let filter = StopFilter::new();
    /// assert!(filter.is_stop_word("the"));
    /// assert!(filter.is_stop_word("wouldn"));
    /// assert!(!filter.is_stop_word("movie"));
    /// ```
    pub fn new() -> Self {
        Self::with_stop_words(DEFAULT_ENGLISH_STOP_WORDS_SET.clone())
    }

    /// Create a new stop filter with custom stop words.
    pub fn with_stop_words(stop_words: HashSet<String>) -> Self {
        StopFilter {
            stop_words: Arc::new(stop_words),
            remove_stopped: true,
        }
    }

    /// Create a new stop filter by loading words from a source.
    pub fn from_source(source: &dyn StopwordSource) -> Result<Self> {
        let words = source.stopwords()?;
        log::debug!(
            "loaded {} stop words from {}",
            words.len(),
            source.describe()
        );
        Ok(Self::with_stop_words(words))
    }

    /// Create a new stop filter from a list of stop words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stop_words = words.into_iter().map(|s| s.into()).collect();
        Self::with_stop_words(stop_words)
    }

    /// Set whether to remove stopped tokens entirely or just mark them as stopped.
    pub fn remove_stopped(mut self, remove: bool) -> Self {
        self.remove_stopped = remove;
        self
    }

    /// Check if a word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Get the number of stop words.
    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    /// Check if the stop word set is empty.
    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl Default for StopFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StopFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens
            .filter_map(|token| {
                if token.is_stopped() {
                    Some(token)
                } else if self.is_stop_word(&token.text) {
                    if self.remove_stopped {
                        None // Remove the token entirely
                    } else {
                        Some(token.stop()) // Mark as stopped but keep it
                    }
                } else {
                    Some(token)
                }
            })
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}
