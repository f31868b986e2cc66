//! In-depth report for one fitted classifier.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::classifier::{Classifier, check_labels};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::metrics::{
    self, Average, ClassificationReport, ConfusionMatrix, RocCurve, unique_labels,
};

/// ROC of the hard predictions against the larger label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocReport {
    pub positive_label: i64,
    pub curve: RocCurve,
    pub auc: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub classifier: String,
    pub train_acc: f64,
    pub test_acc: f64,
    pub f1_macro: f64,
    pub f1_micro: f64,
    pub f1_weighted: f64,
    pub confusion_matrix: ConfusionMatrix,
    /// `None` unless the test labels hold exactly two classes.
    pub roc: Option<RocReport>,
    pub classification_report: ClassificationReport,
}

impl ModelReport {
    /// Score an already fitted classifier on both splits.
    pub fn compute(
        clf: &dyn Classifier,
        x_train: &FeatureMatrix,
        x_test: &FeatureMatrix,
        y_train: &[i64],
        y_test: &[i64],
    ) -> Result<Self> {
        check_labels(x_train, y_train)?;
        check_labels(x_test, y_test)?;

        let train_pred = clf.predict(x_train)?;
        let test_pred = clf.predict(x_test)?;

        // Binary is decided by the actual labels alone: with a single
        // actual class one of the ROC rates is undefined.
        let labels = unique_labels(y_test, &[]);
        let roc = match labels.as_slice() {
            [_, positive] => {
                let positives: Vec<bool> = y_test.iter().map(|y| y == positive).collect();
                let scores: Vec<f64> = test_pred
                    .iter()
                    .map(|p| if p == positive { 1.0 } else { 0.0 })
                    .collect();
                let curve = RocCurve::compute(&positives, &scores);
                Some(RocReport {
                    positive_label: *positive,
                    auc: curve.auc(),
                    curve,
                })
            }
            _ => {
                warn!(
                    "ROC curve for '{}' skipped: test labels hold {} classes, need exactly 2",
                    clf.name(),
                    labels.len()
                );
                None
            }
        };

        Ok(ModelReport {
            classifier: clf.name().to_string(),
            train_acc: metrics::accuracy(y_train, &train_pred),
            test_acc: metrics::accuracy(y_test, &test_pred),
            f1_macro: metrics::f1_score(y_test, &test_pred, Average::Macro),
            f1_micro: metrics::f1_score(y_test, &test_pred, Average::Micro),
            f1_weighted: metrics::f1_score(y_test, &test_pred, Average::Weighted),
            confusion_matrix: ConfusionMatrix::compute(y_test, &test_pred),
            roc,
            classification_report: ClassificationReport::compute(y_test, &test_pred),
        })
    }
}

const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Counts with a shade character scaled to the largest cell.
fn write_heatmap(f: &mut fmt::Formatter<'_>, cm: &ConfusionMatrix) -> fmt::Result {
    let max = cm.counts.iter().flatten().copied().max().unwrap_or(0);
    let width = cm
        .counts
        .iter()
        .flatten()
        .map(|c| c.to_string().len())
        .chain(cm.labels.iter().map(|l| l.to_string().len()))
        .max()
        .unwrap_or(1);

    write!(f, "{:>w$}", "", w = width + 2)?;
    for label in &cm.labels {
        write!(f, " {label:>w$}  ", w = width)?;
    }
    writeln!(f, "  (predicted)")?;

    for (label, row) in cm.labels.iter().zip(&cm.counts) {
        write!(f, "{label:>w$} |", w = width + 1)?;
        for &count in row {
            let shade = if max == 0 {
                SHADES[0]
            } else {
                SHADES[count * (SHADES.len() - 1) / max]
            };
            write!(f, " {count:>w$} {shade}", w = width)?;
        }
        writeln!(f)?;
    }
    writeln!(f, "(actual)")
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classifier: {}", self.classifier)?;
        writeln!(f, "Train accuracy: {:.4}", self.train_acc)?;
        writeln!(f, "Test accuracy:  {:.4}", self.test_acc)?;
        writeln!(
            f,
            "F1 macro: {:.4}  micro: {:.4}  weighted: {:.4}",
            self.f1_macro, self.f1_micro, self.f1_weighted
        )?;

        writeln!(f)?;
        writeln!(f, "Confusion matrix:")?;
        write_heatmap(f, &self.confusion_matrix)?;

        writeln!(f)?;
        match &self.roc {
            Some(roc) => {
                writeln!(
                    f,
                    "ROC curve (positive label {}, AUC = {:.4}):",
                    roc.positive_label, roc.auc
                )?;
                writeln!(f, "  {:>8} {:>8} {:>10}", "fpr", "tpr", "threshold")?;
                for ((fpr, tpr), threshold) in roc
                    .curve
                    .fpr
                    .iter()
                    .zip(&roc.curve.tpr)
                    .zip(&roc.curve.thresholds)
                {
                    writeln!(f, "  {fpr:>8.4} {tpr:>8.4} {threshold:>10}")?;
                }
                writeln!(f, "  reference: chance diagonal tpr = fpr (AUC = 0.5)")?;
            }
            None => writeln!(f, "ROC curve: not available (not a binary problem)")?,
        }

        writeln!(f)?;
        writeln!(f, "Classification report:")?;
        write!(f, "{}", self.classification_report)
    }
}
