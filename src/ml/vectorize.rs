//! Bag-of-words vectorizers for cleaned review text.
//!
//! Both vectorizers learn an alphabetically ordered vocabulary from the
//! training documents and map each document to one row of a
//! [`FeatureMatrix`]. Terms unseen during `fit` are ignored by `transform`.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;
use crate::error::{ClassbenchError, Result};
use crate::ml::matrix::FeatureMatrix;

/// Turns documents into feature rows.
pub trait Vectorizer: Send + Sync {
    /// Learn the vocabulary (and weights) from training documents.
    fn fit(&mut self, documents: &[String]) -> Result<()>;

    /// Map documents to feature rows. Fails if called before `fit`.
    fn transform(&self, documents: &[String]) -> Result<FeatureMatrix>;

    fn fit_transform(&mut self, documents: &[String]) -> Result<FeatureMatrix> {
        self.fit(documents)?;
        self.transform(documents)
    }

    /// Number of feature columns after fitting.
    fn vocabulary_size(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Which vectorizer to build from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorizerKind {
    #[default]
    Tfidf,
    Count,
}

impl VectorizerKind {
    pub fn build(self, max_features: Option<usize>) -> Box<dyn Vectorizer> {
        match self {
            VectorizerKind::Tfidf => Box::new(TfIdfVectorizer::new().with_max_features(max_features)),
            VectorizerKind::Count => Box::new(CountVectorizer::new().with_max_features(max_features)),
        }
    }
}

fn default_analyzer() -> Arc<dyn Analyzer> {
    Arc::new(PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new())).with_name("vectorizer"))
}

fn tokenize(analyzer: &dyn Analyzer, document: &str) -> Result<Vec<String>> {
    Ok(analyzer
        .analyze(document)?
        .filter(|token| !token.is_stopped())
        .map(|token| token.text)
        .collect())
}

/// Shared vocabulary state for both vectorizers.
#[derive(Clone)]
struct Vocabulary {
    terms: BTreeMap<String, usize>,
    analyzer: Arc<dyn Analyzer>,
    max_features: Option<usize>,
    fitted: bool,
}

impl Vocabulary {
    fn new() -> Self {
        Vocabulary {
            terms: BTreeMap::new(),
            analyzer: default_analyzer(),
            max_features: None,
            fitted: false,
        }
    }

    /// Learn terms and return per-term document frequencies in column order.
    fn fit(&mut self, documents: &[String]) -> Result<Vec<usize>> {
        let mut term_counts: AHashMap<String, usize> = AHashMap::new();
        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            let tokens = tokenize(self.analyzer.as_ref(), doc)?;
            let unique: AHashSet<&String> = tokens.iter().collect();
            for token in unique {
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
            for token in tokens {
                *term_counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = term_counts.into_iter().collect();
        if let Some(limit) = self.max_features
            && kept.len() > limit
        {
            // Most frequent first, ties broken alphabetically.
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            kept.truncate(limit);
        }

        let mut names: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        names.sort();

        let df = names
            .iter()
            .map(|term| document_frequency.get(term).copied().unwrap_or(0))
            .collect();
        self.terms = names
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        self.fitted = true;

        log::debug!(
            "fitted vocabulary of {} terms over {} documents",
            self.terms.len(),
            documents.len()
        );
        Ok(df)
    }

    /// Raw term counts per document.
    fn counts(&self, documents: &[String], vectorizer: &str) -> Result<FeatureMatrix> {
        if !self.fitted {
            return Err(ClassbenchError::not_fitted(format!(
                "{vectorizer} must be fitted before transform"
            )));
        }

        let mut matrix = FeatureMatrix::zeros(documents.len(), self.terms.len());
        for (i, doc) in documents.iter().enumerate() {
            let row = matrix.row_mut(i);
            for token in tokenize(self.analyzer.as_ref(), doc)? {
                if let Some(&idx) = self.terms.get(&token) {
                    row[idx] += 1.0;
                }
            }
        }
        Ok(matrix)
    }
}

impl std::fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("vocabulary_size", &self.terms.len())
            .field("max_features", &self.max_features)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

/// Raw term-count vectorizer.
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    vocabulary: Vocabulary,
}

impl CountVectorizer {
    pub fn new() -> Self {
        CountVectorizer {
            vocabulary: Vocabulary::new(),
        }
    }

    /// Tokenize documents with a custom analyzer instead of whitespace splitting.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.vocabulary.analyzer = analyzer;
        self
    }

    /// Keep only the `max_features` most frequent terms.
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.vocabulary.max_features = max_features;
        self
    }

    /// Learned terms in column order.
    pub fn terms(&self) -> Vec<&str> {
        self.vocabulary.terms.keys().map(String::as_str).collect()
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Vectorizer for CountVectorizer {
    fn fit(&mut self, documents: &[String]) -> Result<()> {
        self.vocabulary.fit(documents)?;
        Ok(())
    }

    fn transform(&self, documents: &[String]) -> Result<FeatureMatrix> {
        self.vocabulary.counts(documents, self.name())
    }

    fn vocabulary_size(&self) -> usize {
        self.vocabulary.terms.len()
    }

    fn name(&self) -> &'static str {
        "count"
    }
}

/// TF-IDF vectorizer with smoothed idf and L2-normalized rows.
///
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, where `n` is the number of
/// training documents. Rows with no known terms stay all zero.
#[derive(Clone, Debug)]
pub struct TfIdfVectorizer {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        TfIdfVectorizer {
            vocabulary: Vocabulary::new(),
            idf: Vec::new(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.vocabulary.analyzer = analyzer;
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.vocabulary.max_features = max_features;
        self
    }

    pub fn terms(&self) -> Vec<&str> {
        self.vocabulary.terms.keys().map(String::as_str).collect()
    }

    /// Learned idf weights in column order.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Vectorizer for TfIdfVectorizer {
    fn fit(&mut self, documents: &[String]) -> Result<()> {
        let df = self.vocabulary.fit(documents)?;
        let n = documents.len() as f64;
        self.idf = df
            .into_iter()
            .map(|df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        Ok(())
    }

    fn transform(&self, documents: &[String]) -> Result<FeatureMatrix> {
        let mut matrix = self.vocabulary.counts(documents, self.name())?;
        for i in 0..matrix.n_rows() {
            let row = matrix.row_mut(i);
            for (value, idf) in row.iter_mut().zip(&self.idf) {
                *value *= idf;
            }
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|v| *v /= norm);
            }
        }
        Ok(matrix)
    }

    fn vocabulary_size(&self) -> usize {
        self.vocabulary.terms.len()
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}
