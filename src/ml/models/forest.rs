//! Bagged ensembles: random forests, extremely randomized trees and a
//! generic bootstrap-aggregating wrapper.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::ml::classifier::{
    Classifier, LabelEncoding, argmax, check_fit_input, check_predict_input,
};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::DEFAULT_SEED;
use crate::ml::models::knn::KNeighborsClassifier;
use crate::ml::models::tree::{ClassTree, MaxFeatures, Splitter, TreeParams};

fn bootstrap_sample(n: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// Trees averaged by their leaf class distributions.
#[derive(Clone, Debug)]
struct TreeEnsemble {
    n_estimators: usize,
    bootstrap: bool,
    params: TreeParams,
    seed: u64,
    labels: LabelEncoding,
    trees: Vec<ClassTree>,
    n_features: Option<usize>,
}

impl TreeEnsemble {
    fn new(n_estimators: usize, bootstrap: bool, params: TreeParams, seed: u64) -> Self {
        TreeEnsemble {
            n_estimators: n_estimators.max(1),
            bootstrap,
            params,
            seed,
            labels: LabelEncoding::default(),
            trees: Vec::new(),
            n_features: None,
        }
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = y.len();

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let samples = if self.bootstrap {
                    bootstrap_sample(n, &mut rng)
                } else {
                    (0..n).collect()
                };
                ClassTree::grow(
                    x,
                    &labels.indices,
                    samples,
                    labels.n_classes(),
                    &self.params,
                    &mut rng,
                )
            })
            .collect();
        self.labels = labels;
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix, model: &str) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, model)?;
        let k = self.labels.n_classes();
        Ok(x.rows()
            .map(|row| {
                let mut proba = vec![0.0; k];
                for tree in &self.trees {
                    for (p, d) in proba.iter_mut().zip(tree.distribution(row)) {
                        *p += d;
                    }
                }
                self.labels.decode(argmax(&proba))
            })
            .collect())
    }
}

/// Bootstrapped best-split trees over random feature subsets.
#[derive(Clone, Debug)]
pub struct RandomForestClassifier {
    ensemble: TreeEnsemble,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        let params = TreeParams {
            max_features: MaxFeatures::Sqrt,
            ..TreeParams::default()
        };
        RandomForestClassifier {
            ensemble: TreeEnsemble::new(n_estimators, true, params, seed),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.ensemble.trees.len()
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100, DEFAULT_SEED)
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        self.ensemble.fit(x, y)
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        self.ensemble.predict(x, self.name())
    }

    fn name(&self) -> &str {
        "RandomForest"
    }
}

/// Extremely randomized trees: random thresholds on the full sample.
#[derive(Clone, Debug)]
pub struct ExtraTreesClassifier {
    ensemble: TreeEnsemble,
}

impl ExtraTreesClassifier {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        let params = TreeParams {
            max_features: MaxFeatures::Sqrt,
            splitter: Splitter::Random,
            ..TreeParams::default()
        };
        ExtraTreesClassifier {
            ensemble: TreeEnsemble::new(n_estimators, false, params, seed),
        }
    }
}

impl Default for ExtraTreesClassifier {
    fn default() -> Self {
        Self::new(100, DEFAULT_SEED)
    }
}

impl Classifier for ExtraTreesClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        self.ensemble.fit(x, y)
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        self.ensemble.predict(x, self.name())
    }

    fn name(&self) -> &str {
        "ExtraTree"
    }
}

/// Builds a fresh base estimator for each bag.
pub type BaseEstimator = Arc<dyn Fn() -> Box<dyn Classifier> + Send + Sync>;

/// Majority vote over base estimators fitted on bootstrap samples.
///
/// Vote ties go to the smallest label.
pub struct BaggingClassifier {
    base: BaseEstimator,
    n_estimators: usize,
    seed: u64,
    labels: LabelEncoding,
    estimators: Vec<Box<dyn Classifier>>,
    n_features: Option<usize>,
}

impl BaggingClassifier {
    pub fn new(base: BaseEstimator, n_estimators: usize, seed: u64) -> Self {
        BaggingClassifier {
            base,
            n_estimators: n_estimators.max(1),
            seed,
            labels: LabelEncoding::default(),
            estimators: Vec::new(),
            n_features: None,
        }
    }
}

impl Default for BaggingClassifier {
    fn default() -> Self {
        Self::new(
            Arc::new(|| Box::new(KNeighborsClassifier::default())),
            10,
            DEFAULT_SEED,
        )
    }
}

impl fmt::Debug for BaggingClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaggingClassifier")
            .field("n_estimators", &self.n_estimators)
            .field("seed", &self.seed)
            .field("fitted", &self.estimators.len())
            .finish()
    }
}

impl Classifier for BaggingClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut estimators = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let sample = bootstrap_sample(y.len(), &mut rng);
            let bag_x = x.select_rows(&sample);
            let bag_y: Vec<i64> = sample.iter().map(|&i| y[i]).collect();
            let mut estimator = (self.base)();
            estimator.fit(&bag_x, &bag_y)?;
            estimators.push(estimator);
        }
        self.labels = LabelEncoding::fit(y);
        self.estimators = estimators;
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, self.name())?;
        let mut votes = vec![vec![0.0; self.labels.n_classes()]; x.n_rows()];
        for estimator in &self.estimators {
            for (row_votes, label) in votes.iter_mut().zip(estimator.predict(x)?) {
                let class = self.labels.classes.partition_point(|&c| c < label);
                if let Some(v) = row_votes.get_mut(class)
                    && self.labels.classes[class] == label
                {
                    *v += 1.0;
                }
            }
        }
        Ok(votes
            .iter()
            .map(|row_votes| self.labels.decode(argmax(row_votes)))
            .collect())
    }

    fn name(&self) -> &str {
        "BaggingClassifier"
    }
}
