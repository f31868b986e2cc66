//! Lemmatization token filter.
//!
//! Lemmatizers map an inflected word to its dictionary form for a given
//! part of speech ("running" → "run" as a verb). Unlike stemmers they need
//! lexical data, so construction is fallible and the data is shared behind
//! an `Arc`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod wordnet;

pub use wordnet::WordNetLemmatizer;

/// Parts of speech a lemmatizer can be asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl PartOfSpeech {
    /// All supported parts of speech.
    pub const ALL: [PartOfSpeech; 4] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
    ];

    /// One-letter tag (`n`, `v`, `a`, `r`).
    pub fn tag(self) -> char {
        match self {
            PartOfSpeech::Noun => 'n',
            PartOfSpeech::Verb => 'v',
            PartOfSpeech::Adjective => 'a',
            PartOfSpeech::Adverb => 'r',
        }
    }

    /// File stem used by the lexicon data files (`index.noun`, `verb.exc`, ...).
    pub fn file_stem(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adj",
            PartOfSpeech::Adverb => "adv",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// Trait for dictionary-based lemmatizers.
pub trait Lemmatizer: Send + Sync {
    /// Return the lemma of `word` read as `pos`, or the word itself when
    /// no lemma is known.
    fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

/// Filter that lemmatizes tokens as a single part of speech.
///
/// The cleaner chains three of these (verb, noun, adjective), each one
/// applied to the output of the previous.
#[derive(Clone)]
pub struct LemmaFilter {
    lemmatizer: Arc<dyn Lemmatizer>,
    pos: PartOfSpeech,
}

impl LemmaFilter {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>, pos: PartOfSpeech) -> Self {
        LemmaFilter { lemmatizer, pos }
    }

    pub fn pos(&self) -> PartOfSpeech {
        self.pos
    }
}

impl fmt::Debug for LemmaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemmaFilter")
            .field("lemmatizer", &self.lemmatizer.name())
            .field("pos", &self.pos)
            .finish()
    }
}

impl Filter for LemmaFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                if token.is_stopped() {
                    token
                } else {
                    let lemma = self.lemmatizer.lemmatize(&token.text, self.pos);
                    token.with_text(lemma)
                }
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    fn lemmatizer() -> Arc<dyn Lemmatizer> {
        Arc::new(
            WordNetLemmatizer::from_entries()
                .lemmas(PartOfSpeech::Verb, ["run", "be"])
                .lemmas(PartOfSpeech::Noun, ["movie", "plot"])
                .exceptions(PartOfSpeech::Verb, [("was", &["be"][..])])
                .build(),
        )
    }

    #[test]
    fn test_lemma_filter() {
        let filter = LemmaFilter::new(lemmatizer(), PartOfSpeech::Noun);
        let tokens = vec![
            Token::new("movies", 0),
            Token::new("plots", 1),
            Token::new("movies", 2).stop(),
        ];
        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result[0].text, "movie");
        assert_eq!(result[1].text, "plot");
        assert_eq!(result[2].text, "movies");
    }

    #[test]
    fn test_chained_passes() {
        let lemmatizer = lemmatizer();
        let verb = LemmaFilter::new(lemmatizer.clone(), PartOfSpeech::Verb);
        let noun = LemmaFilter::new(lemmatizer, PartOfSpeech::Noun);

        let tokens = vec![Token::new("was", 0), Token::new("movies", 1)];
        let stream = verb.filter(Box::new(tokens.into_iter())).unwrap();
        let result: Vec<String> = noun.filter(stream).unwrap().map(|t| t.text).collect();

        assert_eq!(result, vec!["be", "movie"]);
    }

    #[test]
    fn test_pos_tags() {
        let tags: String = PartOfSpeech::ALL.iter().map(|p| p.tag()).collect();
        assert_eq!(tags, "nvar");
        assert_eq!(PartOfSpeech::Adjective.to_string(), "adj");
    }
}
