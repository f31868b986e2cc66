//! The classifier capability and helpers shared by every model.

use crate::error::{ClassbenchError, Result};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::metrics;

/// A supervised classifier over dense feature rows and integer labels.
///
/// `fit` may be called once per instance; the batch evaluator creates a
/// fresh instance for every run.
pub trait Classifier: Send {
    /// Train on `x` (one row per sample) and labels `y`.
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()>;

    /// Predict one label per row of `x`.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>>;

    /// Mean accuracy of `predict(x)` against `y`.
    fn score(&self, x: &FeatureMatrix, y: &[i64]) -> Result<f64> {
        check_labels(x, y)?;
        let predicted = self.predict(x)?;
        Ok(metrics::accuracy(y, &predicted))
    }

    fn name(&self) -> &str;
}

/// Sorted distinct labels and each sample's index into them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelEncoding {
    pub classes: Vec<i64>,
    pub indices: Vec<usize>,
}

impl LabelEncoding {
    pub fn fit(y: &[i64]) -> Self {
        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let indices = y
            .iter()
            .map(|label| classes.partition_point(|c| c < label))
            .collect();
        LabelEncoding { classes, indices }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn decode(&self, index: usize) -> i64 {
        self.classes[index]
    }
}

/// Rows of `x` must match the number of labels.
pub fn check_labels(x: &FeatureMatrix, y: &[i64]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(ClassbenchError::shape(format!(
            "{} feature rows but {} labels",
            x.n_rows(),
            y.len()
        )));
    }
    Ok(())
}

/// Validate training input: matching lengths and at least one sample.
pub fn check_fit_input(x: &FeatureMatrix, y: &[i64]) -> Result<()> {
    check_labels(x, y)?;
    if y.is_empty() {
        return Err(ClassbenchError::shape("cannot fit on an empty training set"));
    }
    Ok(())
}

/// Validate prediction input against the fitted column count.
pub fn check_predict_input(x: &FeatureMatrix, n_features: Option<usize>, model: &str) -> Result<()> {
    let expected =
        n_features.ok_or_else(|| ClassbenchError::not_fitted(format!("{model} is not fitted")))?;
    if x.n_cols() != expected {
        return Err(ClassbenchError::shape(format!(
            "{model} was fitted on {expected} features but got {}",
            x.n_cols()
        )));
    }
    Ok(())
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoding() {
        let encoding = LabelEncoding::fit(&[5, -1, 5, 3]);
        assert_eq!(encoding.classes, vec![-1, 3, 5]);
        assert_eq!(encoding.indices, vec![2, 0, 2, 1]);
        assert_eq!(encoding.decode(1), 3);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_input_checks() {
        let x = FeatureMatrix::zeros(2, 3);
        assert!(check_fit_input(&x, &[0, 1]).is_ok());
        assert!(check_fit_input(&x, &[0]).is_err());
        assert!(check_fit_input(&FeatureMatrix::zeros(0, 3), &[]).is_err());
        assert!(matches!(
            check_predict_input(&x, None, "m"),
            Err(ClassbenchError::NotFitted(_))
        ));
        assert!(check_predict_input(&x, Some(4), "m").is_err());
        assert!(check_predict_input(&x, Some(3), "m").is_ok());
    }
}
