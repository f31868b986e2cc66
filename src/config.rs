//! JSON configuration for cleaning, vectorizing, splitting and evaluation.
//!
//! Every field has a default, so `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "cleaner": { "min_word_length": 3, "remove_stopwords": true, "lexicon_dir": "wordnet" },
//!   "vectorizer": { "kind": "tfidf", "max_features": 5000 },
//!   "evaluator": { "parallel": true, "classifiers": ["DecisionTree", "RandomForest"] },
//!   "split": { "test_size": 0.25, "seed": 42, "stratify": true }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::analysis::token_filter::lemma::WordNetLemmatizer;
use crate::analysis::token_filter::stop::StopwordFile;
use crate::analysis::{CleanOptions, TextCleaner};
use crate::error::{ClassbenchError, Result};
use crate::ml::registry::ClassifierRegistry;
use crate::ml::vectorize::{Vectorizer, VectorizerKind};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassbenchConfig {
    pub cleaner: CleanerConfig,
    pub vectorizer: VectorizerConfig,
    pub evaluator: EvaluatorConfig,
    pub split: SplitConfig,
}

/// Cleaning options plus the locations of optional NLP resources.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    #[serde(flatten)]
    pub options: CleanOptions,
    /// One stopword per line; replaces the built-in English list.
    pub stopwords_path: Option<PathBuf>,
    /// WordNet dictionary directory (`index.*`, `*.exc`).
    pub lexicon_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub kind: VectorizerKind,
    pub max_features: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub parallel: bool,
    /// Roster names to run, in order; `None` runs the whole roster.
    pub classifiers: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_size: f64,
    pub seed: u64,
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            test_size: 0.25,
            seed: 42,
            stratify: true,
        }
    }
}

impl ClassbenchConfig {
    /// Read and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: ClassbenchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let test_size = self.split.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ClassbenchError::config(format!(
                "split.test_size must be in (0, 1), got {test_size}"
            )));
        }
        if self.vectorizer.max_features == Some(0) {
            return Err(ClassbenchError::config("vectorizer.max_features must be positive"));
        }
        self.registry().map(|_| ())
    }

    /// The roster, or the configured subset of it.
    pub fn registry(&self) -> Result<ClassifierRegistry> {
        let roster = ClassifierRegistry::default_roster();
        match &self.evaluator.classifiers {
            None => Ok(roster),
            Some(names) => roster.subset(names).map_err(|e| match e {
                ClassbenchError::UnknownClassifier { name } => ClassbenchError::config(format!(
                    "unknown classifier '{name}' in evaluator.classifiers"
                )),
                other => other,
            }),
        }
    }

    /// A cleaner wired to the configured stopword file and lexicon.
    pub fn text_cleaner(&self) -> Result<TextCleaner> {
        let mut cleaner = TextCleaner::new()?;
        if let Some(path) = &self.cleaner.stopwords_path {
            cleaner = cleaner.with_stopwords(&StopwordFile::new(path))?;
        }
        if let Some(dir) = &self.cleaner.lexicon_dir {
            cleaner = cleaner.with_lemmatizer(Arc::new(WordNetLemmatizer::from_dir(dir)?));
        }
        Ok(cleaner)
    }

    pub fn vectorizer(&self) -> Box<dyn Vectorizer> {
        self.vectorizer.kind.build(self.vectorizer.max_features)
    }
}
