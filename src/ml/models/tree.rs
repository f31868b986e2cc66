//! CART classification trees (Gini impurity).
//!
//! [`ClassTree`] is the growth engine shared by the single decision tree
//! and the tree ensembles; it works on encoded class indices and a list of
//! sample indices, so bootstrap samples with repeats need no copying.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::ml::classifier::{
    Classifier, LabelEncoding, argmax, check_fit_input, check_predict_input,
};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::DEFAULT_SEED;

/// How split thresholds are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Splitter {
    /// Best threshold over every distinct value.
    Best,
    /// One uniformly drawn threshold per candidate feature.
    Random,
}

/// How many features are considered at each split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxFeatures {
    All,
    Sqrt,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
        }
    }
}

/// Growth parameters.
#[derive(Clone, Debug)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub splitter: Splitter,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            splitter: Splitter::Best,
        }
    }
}

#[derive(Clone, Debug)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted tree predicting class distributions over `0..n_classes`.
#[derive(Clone, Debug)]
pub(crate) struct ClassTree {
    root: Node,
}

struct Grower<'a> {
    x: &'a FeatureMatrix,
    y: &'a [usize],
    n_classes: usize,
    params: &'a TreeParams,
    rng: &'a mut StdRng,
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| (c as f64 / n).powi(2))
        .sum::<f64>()
}

impl ClassTree {
    pub(crate) fn grow(
        x: &FeatureMatrix,
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            n_classes,
            params,
            rng,
        };
        ClassTree {
            root: grower.build(samples, 0),
        }
    }

    pub(crate) fn distribution(&self, row: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
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

    pub(crate) fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }
}

impl Grower<'_> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n: usize) -> Node {
        Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / n as f64).collect(),
        }
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize) -> Node {
        let n = samples.len();
        let counts = self.class_counts(&samples);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);

        if pure
            || depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return self.leaf(&counts, n);
        }

        let Some((feature, threshold)) = self.find_split(&samples, &counts) else {
            return self.leaf(&counts, n);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x.get(i, feature) <= threshold);
        if left.is_empty() || right.is_empty() {
            return self.leaf(&counts, n);
        }

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    /// Lowest weighted child impurity over the candidate features.
    fn find_split(&mut self, samples: &[usize], parent: &[usize]) -> Option<(usize, f64)> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut features: Vec<usize> = (0..self.x.n_cols()).collect();
        features.shuffle(self.rng);
        let max_visit = self.params.max_features.resolve(features.len());

        let mut best: Option<(f64, usize, f64)> = None;
        let mut visited = 0;

        for feature in features {
            if visited >= max_visit {
                break;
            }

            let mut values: Vec<(f64, usize)> = samples
                .iter()
                .map(|&i| (self.x.get(i, feature), self.y[i]))
                .collect();
            let (lo, hi) = values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(v, _)| {
                    (lo.min(v), hi.max(v))
                });
            if hi - lo <= 1e-12 {
                continue;
            }
            visited += 1;

            match self.params.splitter {
                Splitter::Best => {
                    values.sort_by(|a, b| a.0.total_cmp(&b.0));
                    let mut left = vec![0usize; self.n_classes];
                    for pos in 1..n {
                        left[values[pos - 1].1] += 1;
                        let (prev, next) = (values[pos - 1].0, values[pos].0);
                        if next - prev <= 1e-12 || pos < min_leaf || n - pos < min_leaf {
                            continue;
                        }
                        let right: Vec<usize> =
                            parent.iter().zip(&left).map(|(p, l)| p - l).collect();
                        let impurity = (pos as f64 * gini(&left, pos)
                            + (n - pos) as f64 * gini(&right, n - pos))
                            / n as f64;
                        if best.is_none_or(|(b, _, _)| impurity < b) {
                            let mut threshold = (prev + next) / 2.0;
                            if threshold >= next {
                                threshold = prev;
                            }
                            best = Some((impurity, feature, threshold));
                        }
                    }
                }
                Splitter::Random => {
                    let threshold = self.rng.random_range(lo..hi);
                    let mut left = vec![0usize; self.n_classes];
                    let mut n_left = 0;
                    for &(v, c) in &values {
                        if v <= threshold {
                            left[c] += 1;
                            n_left += 1;
                        }
                    }
                    if n_left < min_leaf || n - n_left < min_leaf {
                        continue;
                    }
                    let right: Vec<usize> =
                        parent.iter().zip(&left).map(|(p, l)| p - l).collect();
                    let impurity = (n_left as f64 * gini(&left, n_left)
                        + (n - n_left) as f64 * gini(&right, n - n_left))
                        / n as f64;
                    if best.is_none_or(|(b, _, _)| impurity < b) {
                        best = Some((impurity, feature, threshold));
                    }
                }
            }
        }

        best.map(|(_, feature, threshold)| (feature, threshold))
    }
}

/// A single CART decision tree.
#[derive(Clone, Debug)]
pub struct DecisionTreeClassifier {
    params: TreeParams,
    seed: u64,
    labels: LabelEncoding,
    tree: Option<ClassTree>,
    n_features: Option<usize>,
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self::with_params(TreeParams::default(), DEFAULT_SEED)
    }

    pub fn with_params(params: TreeParams, seed: u64) -> Self {
        DecisionTreeClassifier {
            params,
            seed,
            labels: LabelEncoding::default(),
            tree: None,
            n_features: None,
        }
    }

    /// Depth of the fitted tree (0 for a single leaf).
    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(ClassTree::depth)
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let samples = (0..y.len()).collect();
        self.tree = Some(ClassTree::grow(
            x,
            &labels.indices,
            samples,
            labels.n_classes(),
            &self.params,
            &mut rng,
        ));
        self.labels = labels;
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.n_features, self.name())?;
        let Some(tree) = self.tree.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(x.rows()
            .map(|row| self.labels.decode(argmax(tree.distribution(row))))
            .collect())
    }

    fn name(&self) -> &str {
        "DecisionTree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor() -> (FeatureMatrix, Vec<i64>) {
        let x = FeatureMatrix::from_rows(vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        (x, vec![0, 1, 1, 0])
    }

    #[test]
    fn test_tree_fits_xor() {
        let (x, y) = xor();
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.depth(), Some(2));
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let (x, y) = xor();
        let params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let mut tree = DecisionTreeClassifier::with_params(params, 7);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), Some(1));
    }

    #[test]
    fn test_single_class_is_a_leaf() {
        let x = FeatureMatrix::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &[3, 3]).unwrap();
        assert_eq!(tree.depth(), Some(0));
        assert_eq!(tree.predict(&x).unwrap(), vec![3, 3]);
    }

    #[test]
    fn test_random_splitter_separates_classes() {
        let x = FeatureMatrix::from_rows(vec![vec![0.0], vec![0.2], vec![5.0], vec![5.3]]).unwrap();
        let y = [0, 0, 1, 1];
        let params = TreeParams {
            splitter: Splitter::Random,
            ..TreeParams::default()
        };
        let mut tree = DecisionTreeClassifier::with_params(params, 3);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[2, 2], 4), 0.5);
        assert_eq!(gini(&[4, 0], 4), 0.0);
    }
}
