//! Review text cleaning.
//!
//! [`TextCleaner`] turns a raw review into normalized words ready for
//! vectorization. The steps always run in this order:
//!
//! 1. every character outside `[a-zA-Z]` becomes a space
//! 2. whitespace tokenization, lowercasing, minimum length
//! 3. stop word removal (optional)
//! 4. Porter stemming (optional)
//! 5. lemmatization as verb, then noun, then adjective (optional)
//!
//! The result is either the surviving words joined by single spaces or the
//! word list itself.
//!
//! # Examples
//!
//! ```
//! use classbench::analysis::cleaner::{clean, CleanOptions, Cleaned};
//!
//! let cleaned = clean("The Movie was AMAZING!!", &CleanOptions::default()).unwrap();
//! assert_eq!(cleaned, Cleaned::Text("the movie was amazing".to_string()));
//!
//! let options = CleanOptions {
//!     remove_stopwords: true,
//!     as_tokens: true,
//!     ..CleanOptions::default()
//! };
//! let cleaned = clean("The Movie was AMAZING!!", &options).unwrap();
//! assert_eq!(cleaned.into_tokens(), vec!["movie", "amazing"]);
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
use crate::analysis::token_filter::lemma::{LemmaFilter, Lemmatizer, PartOfSpeech};
use crate::analysis::token_filter::length::LengthFilter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stem::{PorterStemmer, StemFilter, Stemmer};
use crate::analysis::token_filter::stop::{StopFilter, StopwordSource};
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;
use crate::error::{ClassbenchError, Result};

/// Lemmatization passes, in application order.
const LEMMA_PASSES: [PartOfSpeech; 3] = [
    PartOfSpeech::Verb,
    PartOfSpeech::Noun,
    PartOfSpeech::Adjective,
];

/// Options controlling a cleaning run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Tokens shorter than this many characters are dropped.
    pub min_word_length: usize,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub lemmatize: bool,
    /// Return the token list instead of a space-joined string.
    pub as_tokens: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            min_word_length: 3,
            remove_stopwords: false,
            stem: false,
            lemmatize: false,
            as_tokens: false,
        }
    }
}

/// Output of cleaning a single document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cleaned {
    Text(String),
    Tokens(Vec<String>),
}

impl Cleaned {
    /// The cleaned words joined by single spaces.
    pub fn into_text(self) -> String {
        match self {
            Cleaned::Text(text) => text,
            Cleaned::Tokens(tokens) => tokens.join(" "),
        }
    }

    /// The cleaned words as a list.
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            Cleaned::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            Cleaned::Tokens(tokens) => tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cleaned::Text(text) => text.is_empty(),
            Cleaned::Tokens(tokens) => tokens.is_empty(),
        }
    }
}

impl fmt::Display for Cleaned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cleaned::Text(text) => write!(f, "{text}"),
            Cleaned::Tokens(tokens) => write!(f, "{}", tokens.join(" ")),
        }
    }
}

/// Assembles cleaning pipelines from its stop words, stemmer and
/// (optional) lemmatizer.
///
/// A cleaner holds no per-document state and can be shared across threads.
#[derive(Clone)]
pub struct TextCleaner {
    char_filter: Arc<PatternReplaceCharFilter>,
    stop_filter: Arc<StopFilter>,
    stemmer: Arc<dyn Stemmer>,
    lemmatizer: Option<Arc<dyn Lemmatizer>>,
}

impl TextCleaner {
    /// Cleaner with the built-in English stop words, the Porter stemmer and
    /// no lemmatizer.
    pub fn new() -> Result<Self> {
        Ok(TextCleaner {
            char_filter: Arc::new(PatternReplaceCharFilter::non_letters()?),
            stop_filter: Arc::new(StopFilter::new()),
            stemmer: Arc::new(PorterStemmer::new()),
            lemmatizer: None,
        })
    }

    /// Replace the stop word list with one loaded from `source`.
    pub fn with_stopwords(mut self, source: &dyn StopwordSource) -> Result<Self> {
        self.stop_filter = Arc::new(StopFilter::from_source(source)?);
        Ok(self)
    }

    pub fn with_stemmer(mut self, stemmer: Arc<dyn Stemmer>) -> Self {
        self.stemmer = stemmer;
        self
    }

    pub fn with_lemmatizer(mut self, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        self.lemmatizer = Some(lemmatizer);
        self
    }

    pub fn has_lemmatizer(&self) -> bool {
        self.lemmatizer.is_some()
    }

    /// Build the analysis pipeline for `options`.
    ///
    /// Fails when lemmatization is requested but no lexicon was loaded.
    pub fn analyzer(&self, options: &CleanOptions) -> Result<PipelineAnalyzer> {
        let mut analyzer = PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
            .add_char_filter(self.char_filter.clone())
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(LengthFilter::min(options.min_word_length)))
            .with_name("review_cleaner");

        if options.remove_stopwords {
            analyzer = analyzer.add_filter(self.stop_filter.clone());
        }

        if options.stem {
            analyzer = analyzer.add_filter(Arc::new(StemFilter::with_stemmer(self.stemmer.clone())));
        }

        if options.lemmatize {
            let lemmatizer = self.lemmatizer.clone().ok_or_else(|| {
                ClassbenchError::resource(
                    "lemmatization requested but no lexicon is loaded (set cleaner.lexicon_dir)",
                )
            })?;
            for pos in LEMMA_PASSES {
                analyzer = analyzer.add_filter(Arc::new(LemmaFilter::new(lemmatizer.clone(), pos)));
            }
        }

        Ok(analyzer)
    }

    /// Clean a single document.
    pub fn clean(&self, document: &str, options: &CleanOptions) -> Result<Cleaned> {
        let analyzer = self.analyzer(options)?;
        run(&analyzer, document, options)
    }

    /// Clean many documents with one pipeline, preserving input order.
    pub fn clean_all<S: AsRef<str>>(
        &self,
        documents: &[S],
        options: &CleanOptions,
    ) -> Result<Vec<Cleaned>> {
        let analyzer = self.analyzer(options)?;
        log::debug!(
            "cleaning {} documents with {:?}",
            documents.len(),
            analyzer
        );
        documents
            .iter()
            .map(|document| run(&analyzer, document.as_ref(), options))
            .collect()
    }
}

impl fmt::Debug for TextCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextCleaner")
            .field("stop_words", &self.stop_filter.len())
            .field("stemmer", &self.stemmer.name())
            .field(
                "lemmatizer",
                &self.lemmatizer.as_ref().map(|lemmatizer| lemmatizer.name()),
            )
            .finish()
    }
}

fn run(analyzer: &PipelineAnalyzer, document: &str, options: &CleanOptions) -> Result<Cleaned> {
    let tokens: Vec<String> = analyzer
        .analyze(document)?
        .filter(|token| !token.is_stopped())
        .map(|token| token.text)
        .collect();

    Ok(if options.as_tokens {
        Cleaned::Tokens(tokens)
    } else {
        Cleaned::Text(tokens.join(" "))
    })
}

static DEFAULT_CLEANER: LazyLock<Result<TextCleaner>> = LazyLock::new(TextCleaner::new);

/// Clean `document` with the default cleaner.
///
/// Lemmatization needs lexicon data, so `options.lemmatize` is rejected
/// here; build a [`TextCleaner`] with a lemmatizer instead.
pub fn clean(document: &str, options: &CleanOptions) -> Result<Cleaned> {
    match DEFAULT_CLEANER.as_ref() {
        Ok(cleaner) => cleaner.clean(document, options),
        Err(e) => Err(ClassbenchError::analysis(format!(
            "default cleaner unavailable: {e}"
        ))),
    }
}
