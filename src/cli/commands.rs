//! Command implementations for the classbench CLI.

use std::fs;
use std::time::Instant;

use chrono::Utc;
use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::ClassbenchConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::experiment::{self, PreparedData};
use crate::ml::{ClassifierRegistry, ModelEvaluator, ModelReport};

/// Execute a CLI command.
pub fn execute_command(args: ClassbenchArgs) -> Result<()> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Clean(clean_args) => clean_text(clean_args, &config, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, config, &args),
        Command::EvaluateOne(one_args) => evaluate_one(one_args, &config, &args),
        Command::Report(report_args) => report(report_args, &config, &args),
        Command::ListClassifiers => list_classifiers(&config, &args),
    }
}

/// The `--config` file, or defaults.
fn load_config(args: &ClassbenchArgs) -> Result<ClassbenchConfig> {
    match &args.config {
        Some(path) => ClassbenchConfig::load(path),
        None => Ok(ClassbenchConfig::default()),
    }
}

/// Clean one text or every line of a file.
fn clean_text(args: &CleanArgs, config: &ClassbenchConfig, cli_args: &ClassbenchArgs) -> Result<()> {
    let mut options = config.cleaner.options.clone();
    if let Some(min) = args.min_word_length {
        options.min_word_length = min;
    }
    options.remove_stopwords |= args.remove_stopwords;
    options.stem |= args.stem;
    options.lemmatize |= args.lemmatize;
    options.as_tokens |= args.tokens;

    let documents: Vec<String> = match (&args.file, &args.text) {
        (Some(path), _) => fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect(),
        (None, Some(text)) => vec![text.clone()],
        (None, None) => Vec::new(),
    };

    let cleaner = config.text_cleaner()?;
    let cleaned = cleaner.clean_all(&documents, &options)?;

    output_result(
        "Text cleaned",
        &CleanOutput {
            documents: documents.len(),
            cleaned,
        },
        cli_args,
    )
}

/// Load, clean, split and vectorize the dataset.
fn load_and_prepare(data: &DatasetArgs, config: &ClassbenchConfig) -> Result<PreparedData> {
    let start = Instant::now();
    let dataset = Dataset::from_path(&data.dataset, &data.text_column, &data.label_column)?;
    info!(
        "loaded {} rows ({} labels) from {}",
        dataset.len(),
        dataset.class_counts().len(),
        data.dataset.display()
    );
    let prepared = experiment::prepare(&dataset, config)?;
    debug!("prepared data in {:?}", start.elapsed());
    Ok(prepared)
}

/// Run the whole (or configured) roster.
fn evaluate(args: &EvaluateArgs, mut config: ClassbenchConfig, cli_args: &ClassbenchArgs) -> Result<()> {
    if !args.classifiers.is_empty() {
        config.evaluator.classifiers = Some(args.classifiers.clone());
    }
    config.evaluator.parallel |= args.parallel;
    let registry = config.registry()?;

    let prepared = load_and_prepare(&args.data, &config)?;
    let start = Instant::now();
    let evaluator = ModelEvaluator::new(registry).with_parallel(config.evaluator.parallel);
    let evaluation = evaluator.evaluate_all(
        &prepared.x_train,
        &prepared.y_train,
        &prepared.x_test,
        &prepared.y_test,
    )?;
    info!(
        "evaluated {} classifiers ({} failed) in {:?}",
        evaluator.registry().len(),
        evaluation.failures.len(),
        start.elapsed()
    );

    output_evaluation(
        &EvaluationSummary {
            evaluated_at: Utc::now(),
            dataset: args.data.dataset.display().to_string(),
            train_rows: prepared.x_train.n_rows(),
            test_rows: prepared.x_test.n_rows(),
            vocabulary_size: prepared.vocabulary_size,
            parallel: config.evaluator.parallel,
            evaluation,
            show_matrices: cli_args.verbose > 0,
        },
        cli_args,
    )
}

/// Fit and score one classifier.
fn evaluate_one(args: &EvaluateOneArgs, config: &ClassbenchConfig, cli_args: &ClassbenchArgs) -> Result<()> {
    let evaluator = ModelEvaluator::default();
    // Fail on an unknown name before touching the dataset.
    evaluator.registry().create(&args.name)?;

    let prepared = load_and_prepare(&args.data, config)?;
    let result = evaluator.evaluate_one(
        &prepared.x_train,
        &prepared.y_train,
        &prepared.x_test,
        &prepared.y_test,
        &args.name,
    )?;

    output_result(
        "Classifier evaluated",
        &SingleEvaluationOutput {
            evaluated_at: Utc::now(),
            dataset: args.data.dataset.display().to_string(),
            result,
        },
        cli_args,
    )
}

/// Fit one classifier and compute its full report.
fn report(args: &EvaluateOneArgs, config: &ClassbenchConfig, cli_args: &ClassbenchArgs) -> Result<()> {
    let registry = ClassifierRegistry::default_roster();
    let mut clf = registry.create(&args.name)?;

    let prepared = load_and_prepare(&args.data, config)?;
    let start = Instant::now();
    clf.fit(&prepared.x_train, &prepared.y_train)?;
    debug!("fitted {} in {:?}", args.name, start.elapsed());

    let report = ModelReport::compute(
        clf.as_ref(),
        &prepared.x_train,
        &prepared.x_test,
        &prepared.y_train,
        &prepared.y_test,
    )?;

    output_result(
        "Report computed",
        &ReportOutput {
            evaluated_at: Utc::now(),
            dataset: args.data.dataset.display().to_string(),
            report,
        },
        cli_args,
    )
}

fn list_classifiers(config: &ClassbenchConfig, cli_args: &ClassbenchArgs) -> Result<()> {
    let registry = config.registry()?;
    output_result(
        "Registered classifiers",
        &ClassifierList {
            classifiers: registry.names().into_iter().map(str::to_string).collect(),
        },
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::ClassbenchError;

    fn reviews() -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "review,sentiment").unwrap();
        for i in 0..12 {
            writeln!(file, "wonderful brilliant acting scene{i},1").unwrap();
            writeln!(file, "terrible boring plot scene{i},0").unwrap();
        }
        file
    }

    fn run(argv: &[&str]) -> Result<()> {
        execute_command(ClassbenchArgs::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_clean_command_runs() {
        run(&["classbench", "clean", "The Movie was AMAZING!!"]).unwrap();
    }

    #[test]
    fn test_lemmatize_without_lexicon_fails() {
        let err = run(&["classbench", "clean", "dogs running", "--lemmatize"]).unwrap_err();
        assert!(matches!(err, ClassbenchError::Resource(_)));
    }

    #[test]
    fn test_evaluate_subset() {
        let file = reviews();
        let path = file.path().to_str().unwrap();
        run(&[
            "classbench",
            "-q",
            "--format",
            "json",
            "evaluate",
            path,
            "--classifiers",
            "DecisionTree,MultinomialNaiveBayes",
        ])
        .unwrap();
    }

    #[test]
    fn test_table_format_runs() {
        let file = reviews();
        let path = file.path().to_str().unwrap();
        run(&[
            "classbench",
            "-q",
            "--format",
            "table",
            "evaluate",
            path,
            "--classifiers",
            "KNearestNeighbour",
        ])
        .unwrap();
        run(&["classbench", "--format", "table", "list-classifiers"]).unwrap();
    }

    #[test]
    fn test_unknown_classifier() {
        let file = reviews();
        let path = file.path().to_str().unwrap();
        let err = run(&["classbench", "evaluate-one", path, "Perceptron"]).unwrap_err();
        assert!(matches!(err, ClassbenchError::UnknownClassifier { .. }));

        let err = run(&["classbench", "evaluate", path, "--classifiers", "Perceptron"]).unwrap_err();
        assert!(matches!(err, ClassbenchError::Config(_)));
    }

    #[test]
    fn test_report_command_runs() {
        let file = reviews();
        let path = file.path().to_str().unwrap();
        run(&["classbench", "report", path, "LogisticRegression"]).unwrap();
    }
}
