//! Classifier implementations.
//!
//! Every model implements [`Classifier`](crate::ml::classifier::Classifier)
//! over dense rows. Randomized models take an explicit seed so repeated
//! runs over the same data give the same predictions.

pub mod boosting;
pub mod forest;
pub mod kernel;
pub mod knn;
pub mod linear;
pub mod naive_bayes;
pub mod tree;

pub use boosting::{AdaBoostClassifier, GradientBoostingClassifier};
pub use forest::{BaggingClassifier, ExtraTreesClassifier, RandomForestClassifier};
pub use kernel::{GaussianProcessClassifier, KernelSvc};
pub use knn::KNeighborsClassifier;
pub use linear::{LinearSvc, LogisticRegression, SgdClassifier};
pub use naive_bayes::{GaussianNb, MultinomialNb};
pub use tree::DecisionTreeClassifier;

use crate::ml::matrix::FeatureMatrix;

/// Default seed for randomized models.
pub const DEFAULT_SEED: u64 = 42;

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Per-column centering and scaling learned from training data.
///
/// Constant columns get a scale of 1 so they map to zero instead of NaN.
#[derive(Clone, Debug, Default)]
pub(crate) struct Standardizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Standardizer {
    pub(crate) fn fit(x: &FeatureMatrix) -> Self {
        let n = x.n_rows().max(1) as f64;
        let d = x.n_cols();
        let mut mean = vec![0.0; d];
        for row in x.rows() {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; d];
        for row in x.rows() {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        let scale = var
            .into_iter()
            .map(|s| {
                let sd = (s / n).sqrt();
                if sd > 1e-12 { sd } else { 1.0 }
            })
            .collect();

        Standardizer { mean, scale }
    }

    pub(crate) fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub(crate) fn transform(&self, x: &FeatureMatrix) -> Vec<Vec<f64>> {
        x.rows().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizer() {
        let x = FeatureMatrix::from_rows(vec![vec![1.0, 5.0], vec![3.0, 5.0]]).unwrap();
        let s = Standardizer::fit(&x);
        assert_eq!(s.transform_row(&[1.0, 5.0]), vec![-1.0, 0.0]);
        assert_eq!(s.transform_row(&[3.0, 7.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_distance_and_dot() {
        assert_eq!(squared_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }
}
