//! Vectorizers, classifiers and their evaluation.
//!
//! Cleaned documents become a [`FeatureMatrix`] through a [`Vectorizer`];
//! the [`ModelEvaluator`] then fits every classifier of a
//! [`ClassifierRegistry`] and tabulates accuracy, F1 and confusion
//! matrices, while [`ModelReport`] describes one fitted model in depth.

pub mod classifier;
pub mod evaluate;
pub mod matrix;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod report;
pub mod vectorize;

pub use classifier::Classifier;
pub use evaluate::{
    ClassifierFailure, ConfusionMatrixRecord, Evaluation, FitResultRow, ModelEvaluator,
    ResultsTable, SingleEvaluation,
};
pub use matrix::FeatureMatrix;
pub use metrics::{Average, ClassificationReport, ConfusionMatrix, RocCurve};
pub use registry::{ClassifierFactory, ClassifierRegistry};
pub use report::ModelReport;
pub use vectorize::{CountVectorizer, TfIdfVectorizer, Vectorizer, VectorizerKind};
