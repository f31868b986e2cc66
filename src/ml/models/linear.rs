//! Linear classifiers over standardized features.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::ml::classifier::{
    Classifier, LabelEncoding, argmax, check_fit_input, check_predict_input,
};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::{DEFAULT_SEED, Standardizer, dot};

/// One weight vector and bias per class.
#[derive(Clone, Debug, Default)]
struct LinearModel {
    scaler: Standardizer,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl LinearModel {
    fn zeros(scaler: Standardizer, n_classes: usize, n_features: usize) -> Self {
        LinearModel {
            scaler,
            weights: vec![vec![0.0; n_features]; n_classes],
            bias: vec![0.0; n_classes],
        }
    }

    fn n_features(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn decision(&self, row: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| dot(w, row) + b)
            .collect()
    }

    fn predict(&self, labels: &LabelEncoding, x: &FeatureMatrix) -> Vec<i64> {
        x.rows()
            .map(|row| {
                let scaled = self.scaler.transform_row(row);
                labels.decode(argmax(&self.decision(&scaled)))
            })
            .collect()
    }
}

fn one_vs_rest_targets(labels: &LabelEncoding, class: usize) -> Vec<f64> {
    labels
        .indices
        .iter()
        .map(|&c| if c == class { 1.0 } else { -1.0 })
        .collect()
}

/// Multinomial logistic regression trained by full-batch gradient descent
/// with an L2 penalty of strength `1 / C`.
#[derive(Clone, Debug)]
pub struct LogisticRegression {
    c: f64,
    learning_rate: f64,
    max_iter: usize,
    labels: LabelEncoding,
    model: Option<LinearModel>,
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize) -> Self {
        LogisticRegression {
            c,
            learning_rate: 0.5,
            max_iter,
            labels: LabelEncoding::default(),
            model: None,
        }
    }

    /// Class probabilities for each row.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        check_predict_input(x, self.model.as_ref().map(LinearModel::n_features), self.name())?;
        let Some(model) = self.model.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(x.rows()
            .map(|row| softmax(&model.decision(&model.scaler.transform_row(row))))
            .collect())
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0, 300)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let scaler = Standardizer::fit(x);
        let rows = scaler.transform(x);
        let (n, d, k) = (rows.len(), x.n_cols(), labels.n_classes());
        let lambda = 1.0 / (self.c * n as f64);
        let mut model = LinearModel::zeros(scaler, k, d);

        for _ in 0..self.max_iter {
            let mut grad_w = vec![vec![0.0; d]; k];
            let mut grad_b = vec![0.0; k];
            for (row, &target) in rows.iter().zip(&labels.indices) {
                let proba = softmax(&model.decision(row));
                for class in 0..k {
                    let err = proba[class] - if class == target { 1.0 } else { 0.0 };
                    for (g, v) in grad_w[class].iter_mut().zip(row) {
                        *g += err * v;
                    }
                    grad_b[class] += err;
                }
            }
            for class in 0..k {
                for (w, g) in model.weights[class].iter_mut().zip(&grad_w[class]) {
                    *w -= self.learning_rate * (g / n as f64 + lambda * *w);
                }
                model.bias[class] -= self.learning_rate * grad_b[class] / n as f64;
            }
        }

        self.labels = labels;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.model.as_ref().map(LinearModel::n_features), self.name())?;
        Ok(self
            .model
            .as_ref()
            .map(|m| m.predict(&self.labels, x))
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "LogisticRegression"
    }
}

/// One-vs-rest linear SVM minimizing the squared hinge loss.
#[derive(Clone, Debug)]
pub struct LinearSvc {
    c: f64,
    learning_rate: f64,
    max_iter: usize,
    labels: LabelEncoding,
    model: Option<LinearModel>,
}

impl LinearSvc {
    pub fn new(c: f64, max_iter: usize) -> Self {
        LinearSvc {
            c,
            learning_rate: 0.1,
            max_iter,
            labels: LabelEncoding::default(),
            model: None,
        }
    }
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self::new(1.0, 500)
    }
}

impl Classifier for LinearSvc {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let scaler = Standardizer::fit(x);
        let rows = scaler.transform(x);
        let (n, d, k) = (rows.len(), x.n_cols(), labels.n_classes());
        let lambda = 1.0 / (self.c * n as f64);
        let mut model = LinearModel::zeros(scaler, k, d);

        for class in 0..k {
            let targets = one_vs_rest_targets(&labels, class);
            let (w, b) = (&mut model.weights[class], &mut model.bias[class]);
            for _ in 0..self.max_iter {
                let mut grad_w = vec![0.0; d];
                let mut grad_b = 0.0;
                for (row, &t) in rows.iter().zip(&targets) {
                    let slack = 1.0 - t * (dot(w, row) + *b);
                    if slack > 0.0 {
                        for (g, v) in grad_w.iter_mut().zip(row) {
                            *g -= 2.0 * slack * t * v;
                        }
                        grad_b -= 2.0 * slack * t;
                    }
                }
                for (wi, g) in w.iter_mut().zip(&grad_w) {
                    *wi -= self.learning_rate * (g / n as f64 + lambda * *wi);
                }
                *b -= self.learning_rate * grad_b / n as f64;
            }
        }

        self.labels = labels;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.model.as_ref().map(LinearModel::n_features), self.name())?;
        Ok(self
            .model
            .as_ref()
            .map(|m| m.predict(&self.labels, x))
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "LinearSupportVecor"
    }
}

/// One-vs-rest hinge-loss classifier trained by stochastic gradient
/// descent with a decaying step size.
#[derive(Clone, Debug)]
pub struct SgdClassifier {
    alpha: f64,
    eta0: f64,
    epochs: usize,
    seed: u64,
    labels: LabelEncoding,
    model: Option<LinearModel>,
}

impl SgdClassifier {
    pub fn new(alpha: f64, epochs: usize, seed: u64) -> Self {
        SgdClassifier {
            alpha,
            eta0: 0.1,
            epochs: epochs.max(1),
            seed,
            labels: LabelEncoding::default(),
            model: None,
        }
    }
}

impl Default for SgdClassifier {
    fn default() -> Self {
        Self::new(1e-4, 20, DEFAULT_SEED)
    }
}

impl Classifier for SgdClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let scaler = Standardizer::fit(x);
        let rows = scaler.transform(x);
        let (d, k) = (x.n_cols(), labels.n_classes());
        let mut model = LinearModel::zeros(scaler, k, d);
        let mut rng = StdRng::seed_from_u64(self.seed);
        // step size starts at eta0 and decays as 1 / (alpha * (t0 + t))
        let t0 = 1.0 / (self.alpha * self.eta0);

        for class in 0..k {
            let targets = one_vs_rest_targets(&labels, class);
            let (w, b) = (&mut model.weights[class], &mut model.bias[class]);
            let mut order: Vec<usize> = (0..rows.len()).collect();
            let mut t = 0.0;
            for _ in 0..self.epochs {
                order.shuffle(&mut rng);
                for &i in &order {
                    let eta = 1.0 / (self.alpha * (t0 + t));
                    t += 1.0;
                    let margin = targets[i] * (dot(w, &rows[i]) + *b);
                    w.iter_mut().for_each(|wi| *wi *= 1.0 - eta * self.alpha);
                    if margin < 1.0 {
                        for (wi, v) in w.iter_mut().zip(&rows[i]) {
                            *wi += eta * targets[i] * v;
                        }
                        *b += eta * targets[i];
                    }
                }
            }
        }

        self.labels = labels;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.model.as_ref().map(LinearModel::n_features), self.name())?;
        Ok(self
            .model
            .as_ref()
            .map(|m| m.predict(&self.labels, x))
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "StochasticGradientBoost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (FeatureMatrix, Vec<i64>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..25 {
            let jitter = (i % 5) as f64 * 0.1;
            rows.push(vec![1.0 + jitter, 8.0 - jitter, 0.0]);
            y.push(-1);
            rows.push(vec![8.0 - jitter, 1.0 + jitter, 0.0]);
            y.push(1);
        }
        (FeatureMatrix::from_rows(rows).unwrap(), y)
    }

    #[test]
    fn test_logistic_regression() {
        let (x, y) = blobs();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);

        let proba = model.predict_proba(&x).unwrap();
        assert!((proba[0].iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba[0][0] > 0.9);
    }

    #[test]
    fn test_linear_svc() {
        let (x, y) = blobs();
        let mut model = LinearSvc::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_sgd_classifier() {
        let (x, y) = blobs();
        let mut model = SgdClassifier::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_linear_models_check_width() {
        let (x, y) = blobs();
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        assert!(model.predict(&FeatureMatrix::zeros(1, 2)).is_err());
    }
}
