//! WordNet-style morphological lemmatizer.
//!
//! Lemmas are found the way WordNet's `morphy` finds them:
//!
//! 1. If the word is listed in the exception file for the part of speech,
//!    the candidates are the word and its listed base forms.
//! 2. Otherwise, detachment rules (suffix substitutions) are applied to the
//!    word, and the word plus every rewritten form that exists in the
//!    lexicon are candidates.
//! 3. If nothing matched, the rules are re-applied to the rewritten forms
//!    until a lexicon hit is found or no forms remain.
//!
//! The shortest candidate wins, and the first one listed wins a tie. A
//! word with no candidate is returned unchanged.
//!
//! Lexicon data comes from a WordNet `dict` directory (`index.noun`,
//! `noun.exc`, ...) or from in-memory entries.

use std::fs;
use std::path::Path;

use ahash::{AHashMap, AHashSet};

use super::{Lemmatizer, PartOfSpeech};
use crate::error::{ClassbenchError, Result};

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const ADJECTIVE_RULES: &[(&str, &str)] = &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

fn rules_for(pos: PartOfSpeech) -> &'static [(&'static str, &'static str)] {
    match pos {
        PartOfSpeech::Noun => NOUN_RULES,
        PartOfSpeech::Verb => VERB_RULES,
        PartOfSpeech::Adjective => ADJECTIVE_RULES,
        PartOfSpeech::Adverb => &[],
    }
}

/// Lexicon-backed lemmatizer.
#[derive(Clone, Debug, Default)]
pub struct WordNetLemmatizer {
    lemmas: AHashMap<PartOfSpeech, AHashSet<String>>,
    exceptions: AHashMap<PartOfSpeech, AHashMap<String, Vec<String>>>,
}

impl WordNetLemmatizer {
    /// Load lexicon data from a WordNet `dict` directory.
    ///
    /// `index.noun`, `index.verb` and `index.adj` are required; `index.adv`
    /// and the `*.exc` exception lists are read when present.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ClassbenchError::resource(format!(
                "lexicon directory {} does not exist",
                dir.display()
            )));
        }

        let mut lemmatizer = WordNetLemmatizer::default();
        for pos in PartOfSpeech::ALL {
            let index_path = dir.join(format!("index.{}", pos.file_stem()));
            if index_path.is_file() {
                let content = fs::read_to_string(&index_path)?;
                lemmatizer
                    .lemmas
                    .insert(pos, parse_index(&content).collect());
            } else if pos != PartOfSpeech::Adverb {
                return Err(ClassbenchError::resource(format!(
                    "lexicon file {} is missing",
                    index_path.display()
                )));
            }

            let exc_path = dir.join(format!("{}.exc", pos.file_stem()));
            if exc_path.is_file() {
                let content = fs::read_to_string(&exc_path)?;
                lemmatizer
                    .exceptions
                    .insert(pos, parse_exceptions(&content));
            }
        }

        log::info!(
            "loaded lexicon from {} ({} lemmas)",
            dir.display(),
            lemmatizer.lemma_count()
        );
        Ok(lemmatizer)
    }

    /// Start building a lemmatizer from in-memory entries.
    pub fn from_entries() -> LexiconBuilder {
        LexiconBuilder::default()
    }

    /// Total number of lemmas across all parts of speech.
    pub fn lemma_count(&self) -> usize {
        self.lemmas.values().map(|lemmas| lemmas.len()).sum()
    }

    /// Check whether `word` is a lemma for `pos`.
    pub fn contains(&self, word: &str, pos: PartOfSpeech) -> bool {
        self.lemmas
            .get(&pos)
            .is_some_and(|lemmas| lemmas.contains(word))
    }

    /// All lemma candidates for `word`, in discovery order.
    pub fn morphy(&self, word: &str, pos: PartOfSpeech) -> Vec<String> {
        let filter_forms = |forms: Vec<String>| -> Vec<String> {
            let mut seen = AHashSet::new();
            forms
                .into_iter()
                .filter(|form| self.contains(form, pos) && seen.insert(form.clone()))
                .collect()
        };

        if let Some(bases) = self.exceptions.get(&pos).and_then(|e| e.get(word)) {
            let mut forms = vec![word.to_string()];
            forms.extend(bases.iter().cloned());
            return filter_forms(forms);
        }

        let rules = rules_for(pos);
        let mut forms = apply_rules(&[word.to_string()], rules);
        let mut candidates = vec![word.to_string()];
        candidates.extend(forms.iter().cloned());
        let results = filter_forms(candidates);
        if !results.is_empty() {
            return results;
        }

        while !forms.is_empty() {
            forms = apply_rules(&forms, rules);
            let results = filter_forms(forms.clone());
            if !results.is_empty() {
                return results;
            }
        }

        Vec::new()
    }
}

impl Lemmatizer for WordNetLemmatizer {
    fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String {
        self.morphy(word, pos)
            .into_iter()
            .reduce(|best, candidate| {
                if candidate.len() < best.len() {
                    candidate
                } else {
                    best
                }
            })
            .unwrap_or_else(|| word.to_string())
    }

    fn name(&self) -> &'static str {
        "wordnet"
    }
}

fn apply_rules(forms: &[String], rules: &[(&str, &str)]) -> Vec<String> {
    let mut out = Vec::new();
    for form in forms {
        for (suffix, replacement) in rules {
            if let Some(stem) = form.strip_suffix(suffix) {
                out.push(format!("{stem}{replacement}"));
            }
        }
    }
    out
}

/// Lemma column of an index file. License lines start with a space.
fn parse_index(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .filter(|line| !line.starts_with(' ') && !line.is_empty())
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
}

/// `inflected base [base...]` lines of an exception file.
fn parse_exceptions(content: &str) -> AHashMap<String, Vec<String>> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let inflected = fields.next()?;
            Some((
                inflected.to_string(),
                fields.map(str::to_string).collect::<Vec<_>>(),
            ))
        })
        .collect()
}

/// Builder for in-memory lexicons.
#[derive(Debug, Default)]
pub struct LexiconBuilder {
    inner: WordNetLemmatizer,
}

impl LexiconBuilder {
    /// Add lemmas for a part of speech.
    pub fn lemmas<I, S>(mut self, pos: PartOfSpeech, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner
            .lemmas
            .entry(pos)
            .or_default()
            .extend(words.into_iter().map(|w| w.as_ref().to_string()));
        self
    }

    /// Add exception entries mapping an inflected form to its base forms.
    pub fn exceptions<I, S, L>(mut self, pos: PartOfSpeech, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        let map = self.inner.exceptions.entry(pos).or_default();
        for (inflected, bases) in entries {
            map.insert(
                inflected.as_ref().to_string(),
                bases.into_iter().map(|b| b.as_ref().to_string()).collect(),
            );
        }
        self
    }

    pub fn build(self) -> WordNetLemmatizer {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> WordNetLemmatizer {
        WordNetLemmatizer::from_entries()
            .lemmas(
                PartOfSpeech::Noun,
                ["movie", "box", "church", "woman", "fly", "wolf", "actress", "bus"],
            )
            .lemmas(
                PartOfSpeech::Verb,
                ["run", "love", "watch", "be", "fly", "go", "hate"],
            )
            .lemmas(PartOfSpeech::Adjective, ["good", "large", "big", "fast"])
            .exceptions(PartOfSpeech::Verb, [("was", vec!["be"]), ("went", vec!["go"])])
            .exceptions(PartOfSpeech::Adjective, [("better", vec!["good", "well"])])
            .exceptions(PartOfSpeech::Noun, [("women", vec!["woman"])])
            .build()
    }

    #[test]
    fn test_noun_rules() {
        let lemmatizer = sample();
        let cases = [
            ("movies", "movie"),
            ("boxes", "box"),
            ("churches", "church"),
            ("flies", "fly"),
            ("wolves", "wolf"),
            ("actresses", "actress"),
            ("buses", "bus"),
            ("women", "woman"),
        ];
        for (word, lemma) in cases {
            assert_eq!(lemmatizer.lemmatize(word, PartOfSpeech::Noun), lemma, "{word}");
        }
    }

    #[test]
    fn test_verb_rules() {
        let lemmatizer = sample();
        let cases = [
            ("loved", "love"),
            ("loving", "love"),
            ("watches", "watch"),
            ("watched", "watch"),
            ("flies", "fly"),
            ("was", "be"),
            ("went", "go"),
        ];
        for (word, lemma) in cases {
            assert_eq!(lemmatizer.lemmatize(word, PartOfSpeech::Verb), lemma, "{word}");
        }
    }

    #[test]
    fn test_unknown_form_is_returned_unchanged() {
        // "running" → "runne"/"runn", neither is a lemma, and a further
        // round of rules produces no forms at all.
        let lemmatizer = sample();
        assert_eq!(lemmatizer.lemmatize("running", PartOfSpeech::Verb), "running");
    }

    #[test]
    fn test_adjective_rules() {
        let lemmatizer = sample();
        assert_eq!(lemmatizer.lemmatize("larger", PartOfSpeech::Adjective), "large");
        assert_eq!(lemmatizer.lemmatize("fastest", PartOfSpeech::Adjective), "fast");
        assert_eq!(lemmatizer.lemmatize("better", PartOfSpeech::Adjective), "good");
    }

    #[test]
    fn test_known_word_is_its_own_lemma() {
        let lemmatizer = sample();
        assert_eq!(lemmatizer.lemmatize("movie", PartOfSpeech::Noun), "movie");
        assert_eq!(lemmatizer.lemmatize("plot", PartOfSpeech::Noun), "plot");
    }

    #[test]
    fn test_shortest_candidate_wins() {
        let lemmatizer = WordNetLemmatizer::from_entries()
            .lemmas(PartOfSpeech::Noun, ["axes", "axe", "ax"])
            .build();
        // "axes" itself, "axe" (s → ""), "ax" (xes → x)
        assert_eq!(
            lemmatizer.morphy("axes", PartOfSpeech::Noun),
            vec!["axes", "axe", "ax"]
        );
        assert_eq!(lemmatizer.lemmatize("axes", PartOfSpeech::Noun), "ax");
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for (stem, words) in [
            ("noun", "movie n 1 1 @ 1 0 06613686\nplot n 1 1 @ 1 0 06613687\n"),
            ("verb", "run v 1 1 @ 1 0 01926311\n"),
            ("adj", "good a 1 1 & 1 0 01123148\n"),
        ] {
            let mut file = fs::File::create(dir.path().join(format!("index.{stem}"))).unwrap();
            writeln!(file, "  1 This software and database is being provided").unwrap();
            write!(file, "{words}").unwrap();
        }
        fs::write(dir.path().join("verb.exc"), "ran run\n").unwrap();

        let lemmatizer = WordNetLemmatizer::from_dir(dir.path()).unwrap();
        assert_eq!(lemmatizer.lemma_count(), 4);
        assert!(!lemmatizer.contains("1", PartOfSpeech::Noun));
        assert_eq!(lemmatizer.lemmatize("plots", PartOfSpeech::Noun), "plot");
        assert_eq!(lemmatizer.lemmatize("ran", PartOfSpeech::Verb), "run");
    }

    #[test]
    fn test_from_dir_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        match WordNetLemmatizer::from_dir(dir.path()) {
            Err(ClassbenchError::Resource(msg)) => assert!(msg.contains("index.noun")),
            other => panic!("expected resource error, got {other:?}"),
        }

        match WordNetLemmatizer::from_dir(dir.path().join("absent")) {
            Err(ClassbenchError::Resource(_)) => {}
            other => panic!("expected resource error, got {other:?}"),
        }
    }
}
