//! RBF kernel machines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ClassbenchError, Result};
use crate::ml::classifier::{
    Classifier, LabelEncoding, argmax, check_fit_input, check_predict_input,
};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::{DEFAULT_SEED, squared_distance};

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    (-gamma * squared_distance(a, b)).exp()
}

fn gram(x: &FeatureMatrix, gamma: f64) -> Vec<Vec<f64>> {
    let rows: Vec<&[f64]> = x.rows().collect();
    rows.iter()
        .map(|a| rows.iter().map(|b| rbf(a, b, gamma)).collect())
        .collect()
}

/// Binary machine: `decision(x) = sum(coef_k * K(sv_k, x)) + b`.
#[derive(Clone, Debug, Default)]
struct BinaryMachine {
    support: Vec<usize>,
    coef: Vec<f64>,
    bias: f64,
}

/// Support vector classifier with an RBF kernel, trained one-vs-rest by
/// simplified SMO.
///
/// `gamma` follows the `1 / (n_features * var(X))` heuristic.
#[derive(Clone, Debug)]
pub struct KernelSvc {
    name: &'static str,
    c: f64,
    tol: f64,
    max_passes: usize,
    seed: u64,
    gamma: f64,
    labels: LabelEncoding,
    train: Option<FeatureMatrix>,
    machines: Vec<BinaryMachine>,
}

impl KernelSvc {
    pub fn new(c: f64) -> Self {
        Self::with_params("SupportVectorMachine", c, DEFAULT_SEED)
    }

    /// The softer-margin preset listed as the nu-parameterized machine.
    pub fn nu() -> Self {
        Self::with_params("Nu-SupportVector", 0.5, DEFAULT_SEED)
    }

    pub fn with_params(name: &'static str, c: f64, seed: u64) -> Self {
        KernelSvc {
            name,
            c,
            tol: 1e-3,
            max_passes: 5,
            seed,
            gamma: 1.0,
            labels: LabelEncoding::default(),
            train: None,
            machines: Vec::new(),
        }
    }

    pub fn n_support(&self) -> usize {
        self.machines.iter().map(|m| m.support.len()).sum()
    }

    fn smo(&self, kernel: &[Vec<f64>], targets: &[f64], rng: &mut StdRng) -> BinaryMachine {
        let n = targets.len();
        let mut alpha = vec![0.0; n];
        let mut b = 0.0;
        let output = |alpha: &[f64], b: f64, i: usize| -> f64 {
            alpha
                .iter()
                .zip(targets)
                .zip(&kernel[i])
                .map(|((a, t), k)| a * t * k)
                .sum::<f64>()
                + b
        };

        let mut passes = 0;
        let mut sweeps = 0;
        while passes < self.max_passes && sweeps < 1000 && n > 1 {
            sweeps += 1;
            let mut changed = 0;
            for i in 0..n {
                let e_i = output(&alpha, b, i) - targets[i];
                let violates = (targets[i] * e_i < -self.tol && alpha[i] < self.c)
                    || (targets[i] * e_i > self.tol && alpha[i] > 0.0);
                if !violates {
                    continue;
                }

                let mut j = rng.random_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let e_j = output(&alpha, b, j) - targets[j];
                let (a_i_old, a_j_old) = (alpha[i], alpha[j]);
                let (lo, hi) = if targets[i] != targets[j] {
                    ((a_j_old - a_i_old).max(0.0), (self.c + a_j_old - a_i_old).min(self.c))
                } else {
                    ((a_i_old + a_j_old - self.c).max(0.0), (a_i_old + a_j_old).min(self.c))
                };
                if hi - lo < 1e-12 {
                    continue;
                }
                let eta = 2.0 * kernel[i][j] - kernel[i][i] - kernel[j][j];
                if eta >= 0.0 {
                    continue;
                }

                alpha[j] = (a_j_old - targets[j] * (e_i - e_j) / eta).clamp(lo, hi);
                if (alpha[j] - a_j_old).abs() < 1e-5 {
                    continue;
                }
                alpha[i] = a_i_old + targets[i] * targets[j] * (a_j_old - alpha[j]);

                let d_i = targets[i] * (alpha[i] - a_i_old);
                let d_j = targets[j] * (alpha[j] - a_j_old);
                let b1 = b - e_i - d_i * kernel[i][i] - d_j * kernel[i][j];
                let b2 = b - e_j - d_i * kernel[i][j] - d_j * kernel[j][j];
                b = if alpha[i] > 0.0 && alpha[i] < self.c {
                    b1
                } else if alpha[j] > 0.0 && alpha[j] < self.c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };
                changed += 1;
            }
            passes = if changed == 0 { passes + 1 } else { 0 };
        }

        let (support, coef) = alpha
            .iter()
            .zip(targets)
            .enumerate()
            .filter(|(_, (a, _))| **a > 1e-8)
            .map(|(i, (a, t))| (i, a * t))
            .unzip();
        BinaryMachine {
            support,
            coef,
            bias: b,
        }
    }
}

impl Default for KernelSvc {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Classifier for KernelSvc {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let variance = x.variance();
        self.gamma = if variance > 1e-12 {
            1.0 / (x.n_cols().max(1) as f64 * variance)
        } else {
            1.0
        };

        let kernel = gram(x, self.gamma);
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.machines = (0..labels.n_classes())
            .map(|class| {
                let targets: Vec<f64> = labels
                    .indices
                    .iter()
                    .map(|&c| if c == class { 1.0 } else { -1.0 })
                    .collect();
                self.smo(&kernel, &targets, &mut rng)
            })
            .collect();
        self.labels = labels;
        self.train = Some(x.clone());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.train.as_ref().map(FeatureMatrix::n_cols), self.name)?;
        let Some(train) = self.train.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(x.rows()
            .map(|row| {
                let scores: Vec<f64> = self
                    .machines
                    .iter()
                    .map(|m| {
                        m.support
                            .iter()
                            .zip(&m.coef)
                            .map(|(&sv, coef)| coef * rbf(train.row(sv), row, self.gamma))
                            .sum::<f64>()
                            + m.bias
                    })
                    .collect();
                self.labels.decode(argmax(&scores))
            })
            .collect())
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// In-place Cholesky factor `L` with `L * L^T = a`.
fn cholesky(mut a: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    for j in 0..n {
        let diag = a[j][j] - (0..j).map(|k| a[j][k] * a[j][k]).sum::<f64>();
        if diag <= 0.0 {
            return None;
        }
        a[j][j] = diag.sqrt();
        for i in j + 1..n {
            let s = a[i][j] - (0..j).map(|k| a[i][k] * a[j][k]).sum::<f64>();
            a[i][j] = s / a[j][j];
        }
        for k in j + 1..n {
            a[j][k] = 0.0;
        }
    }
    Some(a)
}

/// Solve `L * L^T * x = b` given the Cholesky factor.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut z = vec![0.0; n];
    for i in 0..n {
        let s = b[i] - (0..i).map(|k| l[i][k] * z[k]).sum::<f64>();
        z[i] = s / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let s = z[i] - (i + 1..n).map(|k| l[k][i] * x[k]).sum::<f64>();
        x[i] = s / l[i][i];
    }
    x
}

/// One-vs-rest Gaussian process classifier.
///
/// Each class gets the posterior mean of a GP fitted to `+1/-1` targets
/// with an RBF kernel and Gaussian noise; the largest mean wins.
#[derive(Clone, Debug)]
pub struct GaussianProcessClassifier {
    length_scale: f64,
    noise: f64,
    labels: LabelEncoding,
    train: Option<FeatureMatrix>,
    weights: Vec<Vec<f64>>,
}

impl GaussianProcessClassifier {
    pub fn new(length_scale: f64, noise: f64) -> Self {
        GaussianProcessClassifier {
            length_scale,
            noise,
            labels: LabelEncoding::default(),
            train: None,
            weights: Vec::new(),
        }
    }

    fn gamma(&self) -> f64 {
        0.5 / (self.length_scale * self.length_scale)
    }
}

impl Default for GaussianProcessClassifier {
    fn default() -> Self {
        Self::new(1.0, 1e-2)
    }
}

impl Classifier for GaussianProcessClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[i64]) -> Result<()> {
        check_fit_input(x, y)?;
        let labels = LabelEncoding::fit(y);
        let mut kernel = gram(x, self.gamma());
        for (i, row) in kernel.iter_mut().enumerate() {
            row[i] += self.noise;
        }
        let factor = cholesky(kernel).ok_or_else(|| {
            ClassbenchError::model("GaussianProcessClassifier: kernel matrix is not positive definite")
        })?;

        self.weights = (0..labels.n_classes())
            .map(|class| {
                let targets: Vec<f64> = labels
                    .indices
                    .iter()
                    .map(|&c| if c == class { 1.0 } else { -1.0 })
                    .collect();
                cholesky_solve(&factor, &targets)
            })
            .collect();
        self.labels = labels;
        self.train = Some(x.clone());
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        check_predict_input(x, self.train.as_ref().map(FeatureMatrix::n_cols), self.name())?;
        let Some(train) = self.train.as_ref() else {
            return Ok(Vec::new());
        };
        let gamma = self.gamma();
        Ok(x.rows()
            .map(|row| {
                let k: Vec<f64> = train.rows().map(|t| rbf(t, row, gamma)).collect();
                let means: Vec<f64> = self
                    .weights
                    .iter()
                    .map(|w| w.iter().zip(&k).map(|(a, b)| a * b).sum())
                    .collect();
                self.labels.decode(argmax(&means))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "GaussianProcessClassifier"
    }
}
