//! Error types for the classbench library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`ClassbenchError`] enum. Per-classifier failures inside the batch
//! evaluator are reported as [`ClassbenchError::Model`] values and isolated
//! there; everything else propagates to the caller.
//!
//! # Examples
//!
//! ```
//! use classbench::error::{ClassbenchError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ClassbenchError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for classbench operations.
#[derive(Error, Debug)]
pub enum ClassbenchError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A required external resource (stopword list, lexicon) is unavailable
    #[error("Missing resource: {0}")]
    Resource(String),

    /// Malformed dataset input
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Feature matrix and label dimensions disagree
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A model was used before `fit` succeeded
    #[error("Model not fitted: {0}")]
    NotFitted(String),

    /// A classifier could not be trained or applied to the given data
    #[error("Model error: {0}")]
    Model(String),

    /// Lookup of a classifier name that is not registered
    #[error("Unknown classifier name: '{name}'")]
    UnknownClassifier { name: String },

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ClassbenchError.
pub type Result<T> = std::result::Result<T, ClassbenchError>;

impl ClassbenchError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Analysis(msg.into())
    }

    /// Create a new missing-resource error.
    pub fn resource<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Resource(msg.into())
    }

    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Dataset(msg.into())
    }

    /// Create a new shape mismatch error.
    pub fn shape<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::ShapeMismatch(msg.into())
    }

    /// Create a new not-fitted error.
    pub fn not_fitted<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::NotFitted(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Model(msg.into())
    }

    /// Create a new unknown classifier error.
    pub fn unknown_classifier<S: Into<String>>(name: S) -> Self {
        ClassbenchError::UnknownClassifier { name: name.into() }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ClassbenchError::Other(format!("Invalid argument: {}", msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ClassbenchError::analysis("Test analysis error");
        assert_eq!(error.to_string(), "Analysis error: Test analysis error");

        let error = ClassbenchError::unknown_classifier("Perceptron");
        assert_eq!(error.to_string(), "Unknown classifier name: 'Perceptron'");

        let error = ClassbenchError::shape("3 rows but 2 labels");
        assert_eq!(error.to_string(), "Shape mismatch: 3 rows but 2 labels");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = ClassbenchError::from(io_error);

        match error {
            ClassbenchError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
