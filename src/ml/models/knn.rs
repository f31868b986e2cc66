//! k-nearest-neighbours classification.

use crate::error::Result;
use crate::ml::classifier::{Classifier, LabelEncoding, check_fit_input, check_predict_input};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::squared_distance;

/// Majority vote among the `k` closest training rows (Euclidean distance).
///
/// Vote ties go to the smallest label. Distance ties keep training order.
#[derive(Clone, Debug)]
pub struct KNeighborsClassifier {
    k: usize,
    x: Option<FeatureMatrix>,
    labels: LabelEncoding,
}

impl KNeighborsClassifier {
    pub fn new(k: usize) -> Self {
        KNeighborsClassifier {
            k: k.max(1),
            x: None,
            labels: LabelEncoding::default(),
        }
    }

    fn predict_row(&self, train: &FeatureMatrix, row: &[f64]) -> i64 {
        let mut distances: Vec<(f64, usize)> = train
            .rows()
            .enumerate()
            .map(|(i, r)| (squared_distance(r, row), i))
            .collect();
        let k = self.k.min(distances.len());
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut votes = vec![0usize; self.labels.n_classes()];
        for &(_, i) in &distances[..k] {
            votes[self.labels.indices[i]] += 1;
        }
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = class;
            }
        }
        self.labels.decode(best)
    }
}

impl Default for KNeighborsClassifier {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Classifier for KNeighborsClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        self.labels = LabelEncoding::fit(y);
        self.x = Some(x.clone());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.x.as_ref().map(FeatureMatrix::n_cols), self.name())?;
        let Some(train) = self.x.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(x.rows().map(|row| self.predict_row(train, row)).collect())
    }

    fn name(&self) -> &str {
        "KNearestNeighbour"
    }
}
