//! Boosted ensembles.
//!
//! [`GradientBoostingClassifier`] fits one regression tree per class and
//! round on the softmax log-loss gradients, with Newton leaf values and an
//! optional L2 term on the leaves. Its presets cover the classic
//! gradient-boosting, XGBoost-style and LightGBM-style configurations.
//! [`AdaBoostClassifier`] is multi-class SAMME over weighted stumps.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::ml::classifier::{
    Classifier, LabelEncoding, argmax, check_fit_input, check_predict_input,
};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::DEFAULT_SEED;

/// Hyperparameters for gradient boosting.
#[derive(Clone, Debug, PartialEq)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// L2 regularization on leaf values.
    pub lambda: f64,
    /// Fraction of rows drawn (without replacement) for each round.
    pub subsample: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        BoostingParams {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            lambda: 0.0,
            subsample: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
enum RegressionNode {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<RegressionNode>,
        right: Box<RegressionNode>,
    },
}

/// Second-order regression tree fitted to gradients and hessians.
#[derive(Clone, Debug)]
struct RegressionTree {
    root: RegressionNode,
}

struct RegressionGrower<'a> {
    x: &'a FeatureMatrix,
    gradients: &'a [f64],
    hessians: &'a [f64],
    params: &'a BoostingParams,
}

impl RegressionTree {
    fn fit(
        x: &FeatureMatrix,
        gradients: &[f64],
        hessians: &[f64],
        samples: Vec<usize>,
        params: &BoostingParams,
    ) -> Self {
        let grower = RegressionGrower {
            x,
            gradients,
            hessians,
            params,
        };
        RegressionTree {
            root: grower.build(samples, 0),
        }
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                RegressionNode::Leaf(value) => return *value,
                RegressionNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

impl RegressionGrower<'_> {
    fn sums(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + self.gradients[i], h + self.hessians[i])
        })
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda + 1e-12)
    }

    fn leaf(&self, g: f64, h: f64) -> RegressionNode {
        RegressionNode::Leaf(-g / (h + self.params.lambda + 1e-12))
    }

    fn build(&self, samples: Vec<usize>, depth: usize) -> RegressionNode {
        let (g, h) = self.sums(&samples);
        if depth >= self.params.max_depth || samples.len() < 2 * self.params.min_samples_leaf.max(1)
        {
            return self.leaf(g, h);
        }

        let Some((feature, threshold)) = self.find_best_split(&samples, g, h) else {
            return self.leaf(g, h);
        };
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x.get(i, feature) <= threshold);
        if left.is_empty() || right.is_empty() {
            return self.leaf(g, h);
        }

        RegressionNode::Split {
            feature,
            threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    /// Split maximizing the second-order gain; `None` when nothing improves.
    fn find_best_split(&self, samples: &[usize], g: f64, h: f64) -> Option<(usize, f64)> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent = self.score(g, h);
        let mut best_gain = 1e-12;
        let mut best = None;

        for feature in 0..self.x.n_cols() {
            let mut values: Vec<(f64, usize)> = samples
                .iter()
                .map(|&i| (self.x.get(i, feature), i))
                .collect();
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for pos in 1..n {
                let i = values[pos - 1].1;
                g_left += self.gradients[i];
                h_left += self.hessians[i];
                let (prev, next) = (values[pos - 1].0, values[pos].0);
                if next - prev <= 1e-12 || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }
                let gain =
                    self.score(g_left, h_left) + self.score(g - g_left, h - h_left) - parent;
                if gain > best_gain {
                    best_gain = gain;
                    let threshold = (prev + next) / 2.0;
                    best = Some((feature, if threshold >= next { prev } else { threshold }));
                }
            }
        }

        best
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Multi-class gradient boosted trees.
#[derive(Clone, Debug)]
pub struct GradientBoostingClassifier {
    name: &'static str,
    params: BoostingParams,
    seed: u64,
    labels: LabelEncoding,
    init: Vec<f64>,
    rounds: Vec<Vec<RegressionTree>>,
    n_features: Option<usize>,
}

impl GradientBoostingClassifier {
    pub fn new() -> Self {
        Self::with_params("GradientBoostingClassifier", BoostingParams::default(), DEFAULT_SEED)
    }

    /// Deeper trees, a larger step and L2-regularized leaves.
    pub fn xgboost() -> Self {
        let params = BoostingParams {
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            ..BoostingParams::default()
        };
        Self::with_params("XGBoost", params, DEFAULT_SEED)
    }

    /// Leaves must hold at least 20 samples.
    pub fn lightgbm() -> Self {
        let params = BoostingParams {
            max_depth: 5,
            min_samples_leaf: 20,
            ..BoostingParams::default()
        };
        Self::with_params("LightGradientBoost", params, DEFAULT_SEED)
    }

    pub fn with_params(name: &'static str, params: BoostingParams, seed: u64) -> Self {
        GradientBoostingClassifier {
            name,
            params,
            seed,
            labels: LabelEncoding::default(),
            init: Vec::new(),
            rounds: Vec::new(),
            n_features: None,
        }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    fn logits(&self, row: &[f64]) -> Vec<f64> {
        let mut logits = self.init.clone();
        for trees in &self.rounds {
            for (logit, tree) in logits.iter_mut().zip(trees) {
                *logit += self.params.learning_rate * tree.predict(row);
            }
        }
        logits
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GradientBoostingClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let k = labels.n_classes();
        let n = y.len();

        let mut counts = vec![0usize; k];
        for &c in &labels.indices {
            counts[c] += 1;
        }
        let init: Vec<f64> = counts.iter().map(|&c| (c as f64 / n as f64).ln()).collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n_sampled = ((n as f64 * self.params.subsample).round() as usize).clamp(1, n);
        let mut logits = vec![init.clone(); n];
        let mut rounds = Vec::new();

        // a single class needs no trees
        if k > 1 {
            for _ in 0..self.params.n_estimators {
                let proba: Vec<Vec<f64>> = logits.iter().map(|l| softmax(l)).collect();
                let samples: Vec<usize> = if n_sampled < n {
                    let mut all: Vec<usize> = (0..n).collect();
                    all.shuffle(&mut rng);
                    all.truncate(n_sampled);
                    all
                } else {
                    (0..n).collect()
                };

                let trees: Vec<RegressionTree> = (0..k)
                    .map(|class| {
                        let gradients: Vec<f64> = proba
                            .iter()
                            .zip(&labels.indices)
                            .map(|(p, &c)| p[class] - if c == class { 1.0 } else { 0.0 })
                            .collect();
                        let hessians: Vec<f64> = proba
                            .iter()
                            .map(|p| (p[class] * (1.0 - p[class])).max(1e-6))
                            .collect();
                        RegressionTree::fit(x, &gradients, &hessians, samples.clone(), &self.params)
                    })
                    .collect();

                for (row_logits, row) in logits.iter_mut().zip(x.rows()) {
                    for (logit, tree) in row_logits.iter_mut().zip(&trees) {
                        *logit += self.params.learning_rate * tree.predict(row);
                    }
                }
                rounds.push(trees);
            }
        }

        self.labels = labels;
        self.init = init;
        self.rounds = rounds;
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, self.name)?;
        Ok(x.rows()
            .map(|row| self.labels.decode(argmax(&self.logits(row))))
            .collect())
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Depth-one tree over sample weights.
#[derive(Clone, Debug)]
struct Stump {
    split: Option<(usize, f64)>,
    left_class: usize,
    right_class: usize,
}

impl Stump {
    fn predict(&self, row: &[f64]) -> usize {
        match self.split {
            Some((feature, threshold)) if row[feature] > threshold => self.right_class,
            _ => self.left_class,
        }
    }

    /// Stump with the lowest weighted error.
    fn fit(x: &FeatureMatrix, y: &[usize], weights: &[f64], n_classes: usize) -> Self {
        let mut totals = vec![0.0; n_classes];
        for (&c, &w) in y.iter().zip(weights) {
            totals[c] += w;
        }
        let majority = argmax(&totals);
        let total: f64 = totals.iter().sum();
        let mut best_error = total - totals[majority];
        let mut best = Stump {
            split: None,
            left_class: majority,
            right_class: majority,
        };

        for feature in 0..x.n_cols() {
            let mut order: Vec<usize> = (0..y.len()).collect();
            order.sort_by(|&a, &b| x.get(a, feature).total_cmp(&x.get(b, feature)));

            let mut left = vec![0.0; n_classes];
            for pos in 1..order.len() {
                let i = order[pos - 1];
                left[y[i]] += weights[i];
                let (prev, next) = (x.get(i, feature), x.get(order[pos], feature));
                if next - prev <= 1e-12 {
                    continue;
                }
                let left_class = argmax(&left);
                let right: Vec<f64> = totals.iter().zip(&left).map(|(t, l)| t - l).collect();
                let right_class = argmax(&right);
                let correct = left[left_class] + right[right_class];
                let error = total - correct;
                if error < best_error - 1e-12 {
                    best_error = error;
                    best = Stump {
                        split: Some((feature, (prev + next) / 2.0)),
                        left_class,
                        right_class,
                    };
                }
            }
        }

        best
    }
}

/// SAMME boosting over decision stumps.
#[derive(Clone, Debug)]
pub struct AdaBoostClassifier {
    n_estimators: usize,
    learning_rate: f64,
    labels: LabelEncoding,
    stumps: Vec<(Stump, f64)>,
    n_features: Option<usize>,
}

impl AdaBoostClassifier {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        AdaBoostClassifier {
            n_estimators: n_estimators.max(1),
            learning_rate,
            labels: LabelEncoding::default(),
            stumps: Vec::new(),
            n_features: None,
        }
    }

    /// Number of stumps kept after fitting; fewer than requested when
    /// boosting stopped early.
    pub fn n_stumps(&self) -> usize {
        self.stumps.len()
    }
}

impl Default for AdaBoostClassifier {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl Classifier for AdaBoostClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let k = labels.n_classes();
        let n = y.len();
        let mut weights = vec![1.0 / n as f64; n];
        let mut stumps = Vec::new();

        for _ in 0..self.n_estimators {
            let stump = Stump::fit(x, &labels.indices, &weights, k);
            let missed: Vec<bool> = x
                .rows()
                .zip(&labels.indices)
                .map(|(row, &c)| stump.predict(row) != c)
                .collect();
            let total: f64 = weights.iter().sum();
            let error = missed
                .iter()
                .zip(&weights)
                .filter(|(m, _)| **m)
                .map(|(_, w)| w)
                .sum::<f64>()
                / total;

            if error <= 0.0 {
                stumps.push((stump, 1.0));
                break;
            }
            if error >= 1.0 - 1.0 / k.max(2) as f64 {
                if stumps.is_empty() {
                    stumps.push((stump, 1.0));
                }
                break;
            }

            let alpha =
                self.learning_rate * (((1.0 - error) / error).ln() + ((k.max(2) - 1) as f64).ln());
            for (w, &m) in weights.iter_mut().zip(&missed) {
                if m {
                    *w *= alpha.exp();
                }
            }
            let sum: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= sum);
            stumps.push((stump, alpha));
        }

        self.labels = labels;
        self.stumps = stumps;
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, self.name())?;
        Ok(x.rows()
            .map(|row| {
                let mut votes = vec![0.0; self.labels.n_classes()];
                for (stump, alpha) in &self.stumps {
                    votes[stump.predict(row)] += alpha;
                }
                self.labels.decode(argmax(&votes))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "AdaptiveBoost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (FeatureMatrix, Vec<i64>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let jitter = (i % 6) as f64 * 0.05;
            rows.push(vec![1.0 + jitter, 8.0 - jitter]);
            y.push(0);
            rows.push(vec![8.0 - jitter, 1.0 + jitter]);
            y.push(1);
        }
        (FeatureMatrix::from_rows(rows).unwrap(), y)
    }

    #[test]
    fn test_gradient_boosting_presets() {
        let (x, y) = blobs();
        for mut model in [
            GradientBoostingClassifier::new(),
            GradientBoostingClassifier::xgboost(),
            GradientBoostingClassifier::lightgbm(),
        ] {
            model.fit(&x, &y).unwrap();
            assert_eq!(model.score(&x, &y).unwrap(), 1.0, "{}", model.name());
        }
    }

    #[test]
    fn test_gradient_boosting_three_classes() {
        let x = FeatureMatrix::from_rows(vec![
            vec![0.0],
            vec![0.1],
            vec![5.0],
            vec![5.1],
            vec![10.0],
            vec![10.1],
        ])
        .unwrap();
        let y = [2, 2, 4, 4, 6, 6];
        let params = BoostingParams {
            n_estimators: 20,
            ..BoostingParams::default()
        };
        let mut model = GradientBoostingClassifier::with_params("gb", params, 0);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_subsampled_boosting() {
        let (x, y) = blobs();
        let params = BoostingParams {
            subsample: 0.5,
            ..BoostingParams::default()
        };
        let mut model = GradientBoostingClassifier::with_params("sgb", params, 11);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_single_class_boosting() {
        let x = FeatureMatrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        let mut model = GradientBoostingClassifier::new();
        model.fit(&x, &[9, 9]).unwrap();
        assert_eq!(model.predict(&x).unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_adaboost_stops_on_perfect_stump() {
        let (x, y) = blobs();
        let mut model = AdaBoostClassifier::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_stumps(), 1);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_adaboost_combines_stumps() {
        // no single threshold separates the middle class
        let x = FeatureMatrix::from_rows(vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![3.0],
            vec![4.0],
            vec![5.0],
        ])
        .unwrap();
        let y = [0, 0, 1, 1, 0, 0];
        let mut model = AdaBoostClassifier::default();
        model.fit(&x, &y).unwrap();
        assert!(model.n_stumps() > 1);
    }
}
