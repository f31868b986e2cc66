//! Naive Bayes classifiers.

use crate::error::{ClassbenchError, Result};
use crate::ml::classifier::{
    Classifier, LabelEncoding, argmax, check_fit_input, check_predict_input,
};
use crate::ml::matrix::FeatureMatrix;

/// Gaussian naive Bayes with per-class feature means and variances.
///
/// A small fraction of the largest feature variance is added to every
/// variance so constant features do not produce infinite likelihoods.
#[derive(Clone, Debug)]
pub struct GaussianNb {
    var_smoothing: f64,
    labels: LabelEncoding,
    log_priors: Vec<f64>,
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
    n_features: Option<usize>,
}

impl GaussianNb {
    pub fn new() -> Self {
        GaussianNb {
            var_smoothing: 1e-9,
            labels: LabelEncoding::default(),
            log_priors: Vec::new(),
            means: Vec::new(),
            variances: Vec::new(),
            n_features: None,
        }
    }

    fn joint_log_likelihood(&self, row: &[f64]) -> Vec<f64> {
        (0..self.labels.n_classes())
            .map(|c| {
                let mut ll = self.log_priors[c];
                for ((x, mean), var) in row.iter().zip(&self.means[c]).zip(&self.variances[c]) {
                    ll -= 0.5 * (2.0 * std::f64::consts::PI * var).ln();
                    ll -= (x - mean).powi(2) / (2.0 * var);
                }
                ll
            })
            .collect()
    }
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GaussianNb {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let k = labels.n_classes();
        let d = x.n_cols();

        let mut counts = vec![0usize; k];
        let mut means = vec![vec![0.0; d]; k];
        for (row, &c) in x.rows().zip(&labels.indices) {
            counts[c] += 1;
            for (m, v) in means[c].iter_mut().zip(row) {
                *m += v;
            }
        }
        for (mean, &count) in means.iter_mut().zip(&counts) {
            mean.iter_mut().for_each(|m| *m /= count as f64);
        }

        let mut variances = vec![vec![0.0; d]; k];
        for (row, &c) in x.rows().zip(&labels.indices) {
            for ((s, v), m) in variances[c].iter_mut().zip(row).zip(&means[c]) {
                *s += (v - m).powi(2);
            }
        }

        // Smoothing is relative to the largest overall feature variance.
        let n_rows = x.n_rows() as f64;
        let max_var = (0..d)
            .map(|j| {
                let mean = x.rows().map(|r| r[j]).sum::<f64>() / n_rows;
                x.rows().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n_rows
            })
            .fold(0.0, f64::max);
        let epsilon = (self.var_smoothing * max_var).max(1e-12);

        for (var, &count) in variances.iter_mut().zip(&counts) {
            var.iter_mut().for_each(|s| *s = *s / count as f64 + epsilon);
        }

        let n = y.len() as f64;
        self.log_priors = counts.iter().map(|&c| (c as f64 / n).ln()).collect();
        self.means = means;
        self.variances = variances;
        self.labels = labels;
        self.n_features = Some(d);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, self.name())?;
        Ok(x.rows()
            .map(|row| self.labels.decode(argmax(&self.joint_log_likelihood(row))))
            .collect())
    }

    fn name(&self) -> &str {
        "GaussianNaiveBayes"
    }
}

/// Multinomial naive Bayes for count-like features with Laplace smoothing.
///
/// Rejects negative feature values.
#[derive(Clone, Debug)]
pub struct MultinomialNb {
    alpha: f64,
    labels: LabelEncoding,
    log_priors: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    n_features: Option<usize>,
}

impl MultinomialNb {
    pub fn new(alpha: f64) -> Self {
        MultinomialNb {
            alpha,
            labels: LabelEncoding::default(),
            log_priors: Vec::new(),
            feature_log_prob: Vec::new(),
            n_features: None,
        }
    }
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Classifier for MultinomialNb {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        if x.has_negative() {
            return Err(ClassbenchError::model(
                "negative values in data passed to MultinomialNaiveBayes",
            ));
        }

        let labels = LabelEncoding::fit(y);
        let k = labels.n_classes();
        let d = x.n_cols();

        let mut class_counts = vec![0usize; k];
        let mut feature_counts = vec![vec![0.0; d]; k];
        for (row, &c) in x.rows().zip(&labels.indices) {
            class_counts[c] += 1;
            for (fc, v) in feature_counts[c].iter_mut().zip(row) {
                *fc += v;
            }
        }

        self.feature_log_prob = feature_counts
            .into_iter()
            .map(|counts| {
                let total = counts.iter().sum::<f64>() + self.alpha * d as f64;
                counts
                    .into_iter()
                    .map(|c| ((c + self.alpha) / total).ln())
                    .collect()
            })
            .collect();

        let n = y.len() as f64;
        self.log_priors = class_counts.iter().map(|&c| (c as f64 / n).ln()).collect();
        self.labels = labels;
        self.n_features = Some(d);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, self.name())?;
        Ok(x.rows()
            .map(|row| {
                let scores: Vec<f64> = self
                    .feature_log_prob
                    .iter()
                    .zip(&self.log_priors)
                    .map(|(log_prob, prior)| {
                        prior + row.iter().zip(log_prob).map(|(v, lp)| v * lp).sum::<f64>()
                    })
                    .collect();
                self.labels.decode(argmax(&scores))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "MultinomialNaiveBayes"
    }
}
