//! Integration tests for the classifier roster and the batch evaluator.

use classbench::error::{ClassbenchError, Result};
use classbench::ml::models::{DecisionTreeClassifier, LogisticRegression};
use classbench::ml::{
    Classifier, ClassifierRegistry, FeatureMatrix, ModelEvaluator, ModelReport,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROSTER: [&str; 17] = [
    "KNearestNeighbour",
    "GaussianNaiveBayes",
    "MultinomialNaiveBayes",
    "DecisionTree",
    "RandomForest",
    "ExtraTree",
    "SupportVectorMachine",
    "LogisticRegression",
    "XGBoost",
    "AdaptiveBoost",
    "Nu-SupportVector",
    "LinearSupportVecor",
    "StochasticGradientBoost",
    "GaussianProcessClassifier",
    "BaggingClassifier",
    "GradientBoostingClassifier",
    "LightGradientBoost",
];

/// Two clusters around (1, 8) and (8, 1) with uniform noise, alternating
/// labels. Every feature stays positive.
fn blobs(per_class: usize, seed: u64) -> (FeatureMatrix, Vec<i64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(2 * per_class);
    let mut labels = Vec::with_capacity(2 * per_class);
    for i in 0..2 * per_class {
        let label = (i % 2) as i64;
        let (cx, cy) = if label == 0 { (1.0, 8.0) } else { (8.0, 1.0) };
        rows.push(vec![
            cx + rng.random_range(-0.9..0.9),
            cy + rng.random_range(-0.9..0.9),
        ]);
        labels.push(label);
    }
    (FeatureMatrix::from_rows(rows).unwrap(), labels)
}

#[derive(Default)]
struct AlwaysFails;

impl Classifier for AlwaysFails {
    fn fit(&mut self, _x: &FeatureMatrix, _y: &[i64]) -> Result<()> {
        Err(ClassbenchError::model("cannot fit this data"))
    }

    fn predict(&self, _x: &FeatureMatrix) -> Result<Vec<i64>> {
        Err(ClassbenchError::not_fitted("AlwaysFails"))
    }

    fn name(&self) -> &str {
        "AlwaysFails"
    }
}

#[derive(Default)]
struct Panics;

impl Classifier for Panics {
    fn fit(&mut self, _x: &FeatureMatrix, _y: &[i64]) -> Result<()> {
        panic!("numerical blow-up");
    }

    fn predict(&self, _x: &FeatureMatrix) -> Result<Vec<i64>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "Panics"
    }
}

#[test]
fn test_roster_order_and_names() {
    let registry = ClassifierRegistry::default_roster();
    assert_eq!(registry.names(), ROSTER);
    for name in ROSTER {
        assert_eq!(registry.create(name).unwrap().name(), name);
    }
}

#[test]
fn test_every_classifier_separates_blobs() -> Result<()> {
    let (x_train, y_train) = blobs(60, 1);
    let (x_val, y_val) = blobs(20, 2);

    let evaluation =
        ModelEvaluator::default().evaluate_all(&x_train, &y_train, &x_val, &y_val)?;

    assert!(
        evaluation.failures.is_empty(),
        "failures: {:?}",
        evaluation.failures
    );
    assert_eq!(evaluation.results.len(), ROSTER.len());
    assert_eq!(evaluation.confusion_matrices.len(), ROSTER.len());
    for (row, name) in evaluation.results.iter().zip(ROSTER) {
        assert_eq!(row.classifier, name);
        assert!(row.test_acc >= 0.95, "{name}: test accuracy {}", row.test_acc);
        assert!(row.train_acc >= 0.95, "{name}: train accuracy {}", row.train_acc);
        assert!((0.0..=1.0).contains(&row.f1_macro));
    }
    for record in &evaluation.confusion_matrices {
        assert_eq!(record.matrix.labels, vec![0, 1]);
        assert_eq!(record.matrix.total(), y_val.len());
    }
    Ok(())
}

#[test]
fn test_failing_classifiers_are_isolated() -> Result<()> {
    let (x_train, y_train) = blobs(10, 3);
    let (x_val, y_val) = blobs(5, 4);

    let mut registry = ClassifierRegistry::new();
    registry
        .register("DecisionTree", DecisionTreeClassifier::default)
        .register("AlwaysFails", AlwaysFails::default)
        .register("Panics", Panics::default)
        .register("LogisticRegression", LogisticRegression::default);

    for parallel in [false, true] {
        let evaluation = ModelEvaluator::new(registry.clone())
            .with_parallel(parallel)
            .evaluate_all(&x_train, &y_train, &x_val, &y_val)?;

        let names: Vec<&str> = evaluation
            .results
            .iter()
            .map(|row| row.classifier.as_str())
            .collect();
        assert_eq!(names, ["DecisionTree", "LogisticRegression"]);

        assert_eq!(evaluation.failures.len(), 2);
        assert_eq!(evaluation.failures[0].index, 2);
        assert_eq!(evaluation.failures[0].classifier, "AlwaysFails");
        assert!(evaluation.failures[0].error.contains("cannot fit this data"));
        assert_eq!(evaluation.failures[1].index, 3);
        assert!(evaluation.failures[1].error.contains("numerical blow-up"));
    }
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let (x_train, y_train) = blobs(30, 5);
    let (x_val, y_val) = blobs(10, 6);

    let sequential = ModelEvaluator::default().evaluate_all(&x_train, &y_train, &x_val, &y_val)?;
    let parallel = ModelEvaluator::default()
        .with_parallel(true)
        .evaluate_all(&x_train, &y_train, &x_val, &y_val)?;

    assert_eq!(sequential, parallel);
    Ok(())
}

#[test]
fn test_shape_mismatch_is_rejected_up_front() {
    let (x_train, y_train) = blobs(5, 7);
    let (x_val, y_val) = blobs(5, 8);

    let err = ModelEvaluator::default()
        .evaluate_all(&x_train, &y_train[1..], &x_val, &y_val)
        .unwrap_err();
    assert!(matches!(err, ClassbenchError::ShapeMismatch(_)));

    let wide = FeatureMatrix::zeros(x_val.n_rows(), 3);
    let err = ModelEvaluator::default()
        .evaluate_all(&x_train, &y_train, &wide, &y_val)
        .unwrap_err();
    assert!(matches!(err, ClassbenchError::ShapeMismatch(_)));
}

#[test]
fn test_evaluate_one() -> Result<()> {
    let (x_train, y_train) = blobs(20, 9);
    let (x_val, y_val) = blobs(10, 10);
    let evaluator = ModelEvaluator::default();

    let single = evaluator.evaluate_one(&x_train, &y_train, &x_val, &y_val, "RandomForest")?;
    assert_eq!(single.classifier, "RandomForest");
    assert!(single.test_acc >= 0.95);
    assert_eq!(single.confusion_matrix.counts.len(), 2);
    assert_eq!(single.confusion_matrix.total(), y_val.len());

    let err = evaluator
        .evaluate_one(&x_train, &y_train, &x_val, &y_val, "Perceptron")
        .unwrap_err();
    assert!(matches!(err, ClassbenchError::UnknownClassifier { ref name } if name == "Perceptron"));
    assert_eq!(err.to_string(), "Unknown classifier name: 'Perceptron'");
    Ok(())
}

#[test]
fn test_confusion_matrix_covers_all_labels() -> Result<()> {
    // Three labels in training, validation only holds two of them.
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..30 {
        let label = (i % 3) as i64;
        let offset = (i / 3) as f64 * 0.05;
        rows.push(vec![label as f64 * 10.0 + offset, 1.0 + offset]);
        labels.push(label);
    }
    let x_train = FeatureMatrix::from_rows(rows)?;
    let x_val = FeatureMatrix::from_rows(vec![vec![0.1, 1.0], vec![20.1, 1.0]])?;
    let y_val = [0, 2];

    let single = ModelEvaluator::default().evaluate_one(
        &x_train,
        &labels,
        &x_val,
        &y_val,
        "DecisionTree",
    )?;
    let k = single.confusion_matrix.labels.len();
    assert!((2..=3).contains(&k));
    assert!(single.confusion_matrix.counts.iter().all(|row| row.len() == k));
    Ok(())
}

#[test]
fn test_model_report_for_binary_problem() -> Result<()> {
    let (x_train, y_train) = blobs(20, 11);
    let (x_test, y_test) = blobs(10, 12);

    let mut clf = ClassifierRegistry::default_roster().create("LogisticRegression")?;
    clf.fit(&x_train, &y_train)?;
    let report = ModelReport::compute(clf.as_ref(), &x_train, &x_test, &y_train, &y_test)?;

    assert_eq!(report.classifier, "LogisticRegression");
    let roc = report.roc.as_ref().expect("binary problems get a ROC curve");
    assert_eq!(roc.positive_label, 1);
    assert!(roc.auc >= 0.95);
    assert_eq!(report.classification_report.classes.len(), 2);

    let text = report.to_string();
    assert!(text.contains("Confusion matrix"));
    assert!(text.contains("AUC"));
    Ok(())
}
