//! Batch and single-model evaluation.
//!
//! [`ModelEvaluator::evaluate_all`] fits every registered classifier on the
//! same train/validation split. A classifier that returns an error or
//! panics is logged and recorded as a [`ClassifierFailure`]; the pass goes
//! on with the next one. With `parallel` enabled the classifiers run on the
//! rayon pool, and outcomes are re-ordered by registry index before
//! anything is logged or tabulated, so both modes give the same output.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ClassbenchError, Result};
use crate::ml::classifier::{Classifier, check_labels};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::metrics::{self, Average, ConfusionMatrix};
use crate::ml::registry::{ClassifierFactory, ClassifierRegistry};

/// One row of the results table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitResultRow {
    pub classifier: String,
    pub train_acc: f64,
    pub test_acc: f64,
    pub f1_weighted: f64,
    pub f1_micro: f64,
    pub f1_macro: f64,
}

/// Result rows in registry order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsTable {
    pub rows: Vec<FitResultRow>,
}

impl ResultsTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FitResultRow> {
        self.rows.iter()
    }

    pub fn get(&self, classifier: &str) -> Option<&FitResultRow> {
        self.rows.iter().find(|row| row.classifier == classifier)
    }

    /// Row with the highest test accuracy; the earliest row wins ties.
    pub fn best(&self) -> Option<&FitResultRow> {
        self.rows.iter().fold(None, |best: Option<&FitResultRow>, row| match best {
            Some(b) if b.test_acc >= row.test_acc => Some(b),
            _ => Some(row),
        })
    }
}

/// Validation confusion matrix of one classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrixRecord {
    pub classifier: String,
    pub matrix: ConfusionMatrix,
}

/// A classifier that errored or panicked during the batch pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierFailure {
    /// 1-based position in the registry.
    pub index: usize,
    pub classifier: String,
    pub error: String,
}

/// Everything produced by one batch pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub results: ResultsTable,
    pub confusion_matrices: Vec<ConfusionMatrixRecord>,
    pub failures: Vec<ClassifierFailure>,
}

/// Outcome of [`ModelEvaluator::evaluate_one`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleEvaluation {
    pub classifier: String,
    pub train_acc: f64,
    pub test_acc: f64,
    pub confusion_matrix: ConfusionMatrix,
}

struct Fitted {
    row: FitResultRow,
    matrix: ConfusionMatrix,
}

type Outcome = std::result::Result<Fitted, String>;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn validate(
    x_train: &FeatureMatrix,
    y_train: &[i64],
    x_val: &FeatureMatrix,
    y_val: &[i64],
) -> Result<()> {
    check_labels(x_train, y_train)?;
    check_labels(x_val, y_val)?;
    if x_train.n_cols() != x_val.n_cols() {
        return Err(ClassbenchError::shape(format!(
            "training data has {} features but validation data has {}",
            x_train.n_cols(),
            x_val.n_cols()
        )));
    }
    Ok(())
}

/// Fit, predict and score one classifier.
fn fit_and_score(
    name: &str,
    clf: &mut dyn Classifier,
    x_train: &FeatureMatrix,
    y_train: &[i64],
    x_val: &FeatureMatrix,
    y_val: &[i64],
) -> Result<Fitted> {
    clf.fit(x_train, y_train)?;
    let predicted = clf.predict(x_val)?;
    let train_acc = clf.score(x_train, y_train)?;

    let row = FitResultRow {
        classifier: name.to_string(),
        train_acc,
        test_acc: metrics::accuracy(y_val, &predicted),
        f1_weighted: metrics::f1_score(y_val, &predicted, Average::Weighted),
        f1_micro: metrics::f1_score(y_val, &predicted, Average::Micro),
        f1_macro: metrics::f1_score(y_val, &predicted, Average::Macro),
    };
    Ok(Fitted {
        row,
        matrix: ConfusionMatrix::compute(y_val, &predicted),
    })
}

/// Runs a registry of classifiers against one split.
#[derive(Clone, Debug)]
pub struct ModelEvaluator {
    registry: ClassifierRegistry,
    parallel: bool,
}

impl ModelEvaluator {
    pub fn new(registry: ClassifierRegistry) -> Self {
        ModelEvaluator {
            registry,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    fn run_isolated(
        name: &str,
        factory: &ClassifierFactory,
        x_train: &FeatureMatrix,
        y_train: &[i64],
        x_val: &FeatureMatrix,
        y_val: &[i64],
    ) -> Outcome {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut clf = factory();
            fit_and_score(name, clf.as_mut(), x_train, y_train, x_val, y_val)
        }));
        debug!("{name} finished in {:.2?}", start.elapsed());

        match outcome {
            Ok(Ok(fitted)) => Ok(fitted),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(panic_message(payload)),
        }
    }

    fn record(evaluation: &mut Evaluation, index: usize, name: &str, outcome: Outcome) {
        match outcome {
            Ok(fitted) => {
                evaluation.confusion_matrices.push(ConfusionMatrixRecord {
                    classifier: name.to_string(),
                    matrix: fitted.matrix,
                });
                evaluation.results.rows.push(fitted.row);
            }
            Err(error) => {
                warn!("\t\t** error in '{name}': {error}");
                evaluation.failures.push(ClassifierFailure {
                    index,
                    classifier: name.to_string(),
                    error,
                });
            }
        }
    }

    /// Fit and score every registered classifier.
    ///
    /// Shape errors in the inputs are returned before any classifier runs;
    /// per-classifier failures end up in [`Evaluation::failures`].
    pub fn evaluate_all(
        &self,
        x_train: &FeatureMatrix,
        y_train: &[i64],
        x_val: &FeatureMatrix,
        y_val: &[i64],
    ) -> Result<Evaluation> {
        validate(x_train, y_train, x_val, y_val)?;
        let entries: Vec<(&str, &ClassifierFactory)> = self.registry.iter().collect();
        let mut evaluation = Evaluation::default();

        if self.parallel {
            let mut outcomes: Vec<(usize, Outcome)> = entries
                .par_iter()
                .enumerate()
                .map(|(i, (name, factory))| {
                    let outcome =
                        Self::run_isolated(name, factory, x_train, y_train, x_val, y_val);
                    (i + 1, outcome)
                })
                .collect();
            outcomes.sort_by_key(|(index, _)| *index);

            for ((index, outcome), (name, _)) in outcomes.into_iter().zip(&entries) {
                info!("\t {index}. --> {name}");
                Self::record(&mut evaluation, index, name, outcome);
            }
        } else {
            for (i, (name, factory)) in entries.iter().enumerate() {
                let index = i + 1;
                info!("\t {index}. --> {name}");
                let outcome = Self::run_isolated(name, factory, x_train, y_train, x_val, y_val);
                Self::record(&mut evaluation, index, name, outcome);
            }
        }

        Ok(evaluation)
    }

    /// Fit one named classifier; errors propagate.
    pub fn evaluate_one(
        &self,
        x_train: &FeatureMatrix,
        y_train: &[i64],
        x_val: &FeatureMatrix,
        y_val: &[i64],
        name: &str,
    ) -> Result<SingleEvaluation> {
        let mut clf = self.registry.create(name)?;
        validate(x_train, y_train, x_val, y_val)?;
        let fitted = fit_and_score(name, clf.as_mut(), x_train, y_train, x_val, y_val)?;
        Ok(SingleEvaluation {
            classifier: name.to_string(),
            train_acc: fitted.row.train_acc,
            test_acc: fitted.row.test_acc,
            confusion_matrix: fitted.matrix,
        })
    }
}

impl Default for ModelEvaluator {
    fn default() -> Self {
        Self::new(ClassifierRegistry::default_roster())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::KNeighborsClassifier;

    struct AlwaysFails;

    impl Classifier for AlwaysFails {
        fn fit(&mut self, _x: &FeatureMatrix, _y: &[i64]) -> Result<()> {
            Err(ClassbenchError::model("cannot fit"))
        }

        fn predict(&self, _x: &FeatureMatrix) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "AlwaysFails"
        }
    }

    struct Panics;

    impl Classifier for Panics {
        fn fit(&mut self, _x: &FeatureMatrix, _y: &[i64]) -> Result<()> {
            panic!("boom");
        }

        fn predict(&self, _x: &FeatureMatrix) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "Panics"
        }
    }

    fn data() -> (FeatureMatrix, Vec<i64>) {
        let x = FeatureMatrix::from_rows(vec![
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![5.0, 5.0],
            vec![5.2, 4.9],
        ])
        .unwrap();
        (x, vec![0, 0, 1, 1])
    }

    fn registry() -> ClassifierRegistry {
        let mut registry = ClassifierRegistry::new();
        registry
            .register("knn", || KNeighborsClassifier::new(1))
            .register("fails", || AlwaysFails)
            .register("panics", || Panics)
            .register("knn3", || KNeighborsClassifier::new(3));
        registry
    }

    #[test]
    fn test_failures_are_isolated() {
        let (x, y) = data();
        let evaluation = ModelEvaluator::new(registry())
            .evaluate_all(&x, &y, &x, &y)
            .unwrap();

        let names: Vec<&str> = evaluation
            .results
            .iter()
            .map(|r| r.classifier.as_str())
            .collect();
        assert_eq!(names, vec!["knn", "knn3"]);
        assert_eq!(evaluation.confusion_matrices.len(), 2);
        assert_eq!(evaluation.failures.len(), 2);
        assert_eq!(evaluation.failures[0].index, 2);
        assert_eq!(evaluation.failures[0].error, "Model error: cannot fit");
        assert_eq!(evaluation.failures[1].error, "panicked: boom");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = data();
        let sequential = ModelEvaluator::new(registry())
            .evaluate_all(&x, &y, &x, &y)
            .unwrap();
        let parallel = ModelEvaluator::new(registry())
            .with_parallel(true)
            .evaluate_all(&x, &y, &x, &y)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_shape_mismatch_is_a_caller_error() {
        let (x, y) = data();
        let evaluator = ModelEvaluator::new(registry());
        assert!(matches!(
            evaluator.evaluate_all(&x, &y[..3], &x, &y),
            Err(ClassbenchError::ShapeMismatch(_))
        ));
        let narrow = FeatureMatrix::zeros(4, 1);
        assert!(evaluator.evaluate_all(&x, &y, &narrow, &y).is_err());
    }

    #[test]
    fn test_evaluate_one() {
        let (x, y) = data();
        let evaluator = ModelEvaluator::new(registry());
        let single = evaluator.evaluate_one(&x, &y, &x, &y, "knn").unwrap();
        assert_eq!(single.train_acc, 1.0);
        assert_eq!(single.confusion_matrix.counts, vec![vec![2, 0], vec![0, 2]]);

        assert!(matches!(
            evaluator.evaluate_one(&x, &y, &x, &y, "svm"),
            Err(ClassbenchError::UnknownClassifier { .. })
        ));
        assert!(evaluator.evaluate_one(&x, &y, &x, &y, "fails").is_err());
    }

    #[test]
    fn test_best_row() {
        let row = |name: &str, acc: f64| FitResultRow {
            classifier: name.to_string(),
            train_acc: acc,
            test_acc: acc,
            f1_weighted: acc,
            f1_micro: acc,
            f1_macro: acc,
        };
        let table = ResultsTable {
            rows: vec![row("a", 0.5), row("b", 0.9), row("c", 0.9)],
        };
        assert_eq!(table.best().map(|r| r.classifier.as_str()), Some("b"));
        assert!(table.get("c").is_some());
    }
}
