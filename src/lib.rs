//! # classbench
//!
//! Benchmark a roster of statistical classifiers on labelled review text.
//!
//! ## Features
//!
//! - Review text cleaning: letters-only filtering, lowercasing, length and
//!   stopword filtering, Porter stemming and WordNet-style lemmatization
//! - Count and TF-IDF vectorizers
//! - Seventeen classifiers behind one `Classifier` trait, selected by name
//!   from an injectable registry
//! - Batch evaluation with per-classifier failure isolation, optionally on
//!   a rayon pool
//! - Accuracy, F1, confusion matrices, ROC/AUC and classification reports
//!
//! ## Example
//!
//! ```
//! use classbench::analysis::{CleanOptions, clean};
//!
//! let cleaned = clean("The Movie was AMAZING!!", &CleanOptions::default()).unwrap();
//! assert_eq!(cleaned.into_text(), "the movie was amazing");
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod ml;

pub mod prelude {
    pub use crate::analysis::{CleanOptions, Cleaned, TextCleaner, clean};
    pub use crate::config::ClassbenchConfig;
    pub use crate::dataset::{Dataset, train_test_split};
    pub use crate::error::{ClassbenchError, Result};
    pub use crate::ml::{
        Classifier, ClassifierRegistry, Evaluation, FeatureMatrix, ModelEvaluator, ModelReport,
        Vectorizer,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
