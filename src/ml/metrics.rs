//! Classification metrics.
//!
//! Label sets are always the sorted union of the true and predicted labels,
//! so a class that is only ever predicted (never present) still gets a row
//! and a column.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fraction of positions where `y_true` and `y_pred` agree.
///
/// Returns 0.0 for empty input.
pub fn accuracy(y_true: &[i64], y_pred: &[i64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(truth, pred)| truth == pred)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Sorted union of the labels present in either sequence.
pub fn unique_labels(y_true: &[i64], y_pred: &[i64]) -> Vec<i64> {
    let mut labels: Vec<i64> = y_true.iter().chain(y_pred).copied().collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

/// Counts of actual (rows) against predicted (columns) labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<i64>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &[i64], y_pred: &[i64]) -> Self {
        let labels = unique_labels(y_true, y_pred);
        let k = labels.len();
        let mut counts = vec![vec![0; k]; k];
        for (truth, pred) in y_true.iter().zip(y_pred) {
            let row = labels.partition_point(|l| l < truth);
            let col = labels.partition_point(|l| l < pred);
            counts[row][col] += 1;
        }
        ConfusionMatrix { labels, counts }
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn true_positives(&self, i: usize) -> usize {
        self.counts[i][i]
    }

    /// Samples whose actual label is `labels[i]`.
    pub fn support(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    /// Samples predicted as `labels[i]`.
    pub fn predicted(&self, i: usize) -> usize {
        self.counts.iter().map(|row| row[i]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|l| l.to_string().len())
            .chain(self.counts.iter().flatten().map(|c| c.to_string().len()))
            .chain(std::iter::once(6))
            .max()
            .unwrap_or(6);

        write!(f, "{:>width$}", "actual")?;
        for label in &self.labels {
            write!(f, " {label:>width$}")?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "{label:>width$}")?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-label precision, recall, F1 and support.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub label: i64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Per-label scores; undefined ratios are reported as 0.
pub fn class_scores(cm: &ConfusionMatrix) -> Vec<ClassScores> {
    (0..cm.n_labels())
        .map(|i| {
            let tp = cm.true_positives(i);
            let support = cm.support(i);
            let predicted = cm.predicted(i);
            ClassScores {
                label: cm.labels[i],
                precision: ratio(tp, predicted),
                recall: ratio(tp, support),
                f1: ratio(2 * tp, support + predicted),
                support,
            }
        })
        .collect()
}

/// Per-label scores computed straight from label sequences.
pub fn precision_recall_fscore_support(y_true: &[i64], y_pred: &[i64]) -> Vec<ClassScores> {
    class_scores(&confusion_matrix(y_true, y_pred))
}

pub fn confusion_matrix(y_true: &[i64], y_pred: &[i64]) -> ConfusionMatrix {
    ConfusionMatrix::compute(y_true, y_pred)
}

/// How per-label F1 scores are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Average {
    /// Unweighted mean over labels.
    Macro,
    /// Pooled counts over all predictions.
    Micro,
    /// Mean weighted by each label's support.
    Weighted,
}

pub fn f1_score(y_true: &[i64], y_pred: &[i64], average: Average) -> f64 {
    let cm = ConfusionMatrix::compute(y_true, y_pred);
    let scores = class_scores(&cm);
    if scores.is_empty() {
        return 0.0;
    }

    match average {
        Average::Macro => scores.iter().map(|s| s.f1).sum::<f64>() / scores.len() as f64,
        Average::Micro => {
            let tp: usize = (0..cm.n_labels()).map(|i| cm.true_positives(i)).sum();
            let total = cm.total();
            // fp and fn both equal total - tp for single-label data
            ratio(2 * tp, 2 * total)
        }
        Average::Weighted => {
            let support: usize = scores.iter().map(|s| s.support).sum();
            if support == 0 {
                return 0.0;
            }
            scores
                .iter()
                .map(|s| s.f1 * s.support as f64)
                .sum::<f64>()
                / support as f64
        }
    }
}

/// Receiver operating characteristic points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// ROC for binary targets (`positives[i]`) ranked by `scores`.
    ///
    /// One point per distinct score, highest threshold first, starting at
    /// (0, 0) with an infinite threshold. Rates are 0 when a class is
    /// absent.
    pub fn compute(positives: &[bool], scores: &[f64]) -> Self {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let total_pos = positives.iter().filter(|&&p| p).count();
        let total_neg = positives.len() - total_pos;

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![f64::INFINITY];
        let (mut tp, mut fp) = (0usize, 0usize);

        for (rank, &i) in order.iter().enumerate() {
            if positives[i] {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_value = order
                .get(rank + 1)
                .is_none_or(|&next| scores[next] != scores[i]);
            if last_of_value {
                fpr.push(ratio(fp, total_neg));
                tpr.push(ratio(tp, total_pos));
                thresholds.push(scores[i]);
            }
        }

        RocCurve {
            fpr,
            tpr,
            thresholds,
        }
    }

    pub fn auc(&self) -> f64 {
        auc(&self.fpr, &self.tpr)
    }
}

/// ROC of `y_score` against `y_true`, treating `pos_label` as positive.
pub fn roc_curve(y_true: &[i64], y_score: &[f64], pos_label: i64) -> RocCurve {
    let positives: Vec<bool> = y_true.iter().map(|&y| y == pos_label).collect();
    RocCurve::compute(&positives, y_score)
}

/// Area under a curve by the trapezoidal rule.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum::<f64>()
        .abs()
}

/// Precision/recall/F1 table with averaged summary rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

impl ClassificationReport {
    pub fn compute(y_true: &[i64], y_pred: &[i64]) -> Self {
        let cm = ConfusionMatrix::compute(y_true, y_pred);
        let classes = class_scores(&cm);
        let total: usize = classes.iter().map(|c| c.support).sum();
        let n = classes.len().max(1) as f64;

        let mean = |f: fn(&ClassScores) -> f64| classes.iter().map(f).sum::<f64>() / n;
        let weighted = |f: fn(&ClassScores) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| f(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };

        let macro_avg = ClassScores {
            label: 0,
            precision: mean(|c| c.precision),
            recall: mean(|c| c.recall),
            f1: mean(|c| c.f1),
            support: total,
        };
        let weighted_avg = ClassScores {
            label: 0,
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: accuracy(y_true, y_pred),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.to_string().len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}
