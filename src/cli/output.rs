//! Output formatting for CLI commands.

use std::fmt;
use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Cleaned;
use crate::cli::args::{ClassbenchArgs, OutputFormat};
use crate::error::Result;
use crate::ml::{Evaluation, ModelReport, ResultsTable, SingleEvaluation};

/// Result structure for text cleaning.
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanOutput {
    pub documents: usize,
    pub cleaned: Vec<Cleaned>,
}

/// Registered classifier names, in evaluation order.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifierList {
    pub classifiers: Vec<String>,
}

/// Result structure for a batch evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub evaluated_at: DateTime<Utc>,
    pub dataset: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub vocabulary_size: usize,
    pub parallel: bool,
    #[serde(flatten)]
    pub evaluation: Evaluation,
    /// Print the per-classifier confusion matrices in human output.
    #[serde(skip)]
    pub show_matrices: bool,
}

/// Result structure for a single-classifier evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct SingleEvaluationOutput {
    pub evaluated_at: DateTime<Utc>,
    pub dataset: String,
    #[serde(flatten)]
    pub result: SingleEvaluation,
}

/// Result structure for a full model report.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportOutput {
    pub evaluated_at: DateTime<Utc>,
    pub dataset: String,
    #[serde(flatten)]
    pub report: ModelReport,
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &ClassbenchArgs) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Csv => output_csv(result),
        OutputFormat::Table => output_table(result),
    }
}

/// Output an evaluation; CSV gets one record per results table row.
pub fn output_evaluation(summary: &EvaluationSummary, args: &ClassbenchArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            for row in summary.evaluation.results.iter() {
                writer.serialize(row)?;
            }
            writer.flush()?;
            Ok(())
        }
        OutputFormat::Table => {
            print!("{}", format_results_table(&summary.evaluation.results));
            Ok(())
        }
        _ => output_result("Evaluation finished", summary, args),
    }
}

/// Output in human-readable format.
fn output_human<T: fmt::Display>(message: &str, result: &T, args: &ClassbenchArgs) -> Result<()> {
    if args.verbose > 0 {
        println!("{message}");
        println!();
    }
    print!("{result}");
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ClassbenchArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Output in CSV format.
fn output_csv<T: Serialize>(result: &T) -> Result<()> {
    let value = serde_json::to_value(result)?;

    match value {
        serde_json::Value::Object(obj) => {
            println!("key,value");
            for (key, value) in obj {
                let formatted_csv_value = format_csv_value(&value);
                println!("{key},{formatted_csv_value}");
            }
        }
        _ => {
            println!("value");
            let formatted_csv_value = format_csv_value(&value);
            println!("{formatted_csv_value}");
        }
    }

    Ok(())
}

/// Output in table format: top-level fields as aligned `field | value` rows.
fn output_table<T: Serialize>(result: &T) -> Result<()> {
    let value = serde_json::to_value(result)?;
    let rows: Vec<(String, String)> = match value {
        serde_json::Value::Object(obj) => obj
            .iter()
            .map(|(key, val)| (key.clone(), format_value(val)))
            .collect(),
        other => vec![("value".to_string(), format_value(&other))],
    };
    print!("{}", format_key_value_table(&rows));
    Ok(())
}

fn format_key_value_table(rows: &[(String, String)]) -> String {
    let width = rows
        .iter()
        .map(|(key, _)| key.len())
        .chain(std::iter::once("field".len()))
        .max()
        .unwrap_or(5);
    let mut out = format!("| {:<width$} | value\n", "field");
    out.push_str(&format!("|-{}-|------\n", "-".repeat(width)));
    for (key, value) in rows {
        out.push_str(&format!("| {key:<width$} | {value}\n"));
    }
    out
}

/// Fixed-width rendering of the results table, one line per classifier.
fn format_results_table(results: &ResultsTable) -> String {
    const HEADERS: [&str; 6] = [
        "classifier",
        "train_acc",
        "test_acc",
        "f1_weighted",
        "f1_micro",
        "f1_macro",
    ];
    let name_width = results
        .iter()
        .map(|row| row.classifier.len())
        .chain(std::iter::once(HEADERS[0].len()))
        .max()
        .unwrap_or(HEADERS[0].len());

    let mut out = format!("| {:<name_width$} |", HEADERS[0]);
    for header in &HEADERS[1..] {
        out.push_str(&format!(" {header:>11} |"));
    }
    out.push('\n');
    out.push_str(&format!("|{}|", "-".repeat(name_width + 2)));
    for _ in &HEADERS[1..] {
        out.push_str(&format!("{}|", "-".repeat(13)));
    }
    out.push('\n');

    for row in results.iter() {
        out.push_str(&format!("| {:<name_width$} |", row.classifier));
        for metric in [row.train_acc, row.test_acc, row.f1_weighted, row.f1_micro, row.f1_macro] {
            out.push_str(&format!(" {metric:>11.4} |"));
        }
        out.push('\n');
    }
    out
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Format a JSON value for CSV output.
fn format_csv_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                let escaped = s.replace('"', "\"\"");
                format!("\"{escaped}\"")
            } else {
                s.clone()
            }
        }
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join("; ");
            format!("\"[{formatted_values}]\"")
        }
        serde_json::Value::Object(_) => "\"[object]\"".to_string(),
        serde_json::Value::Null => "".to_string(),
    }
}

impl fmt::Display for CleanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cleaned in &self.cleaned {
            match cleaned {
                Cleaned::Text(text) => writeln!(f, "{text}")?,
                Cleaned::Tokens(tokens) => writeln!(f, "[{}]", tokens.join(", "))?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for ClassifierList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.classifiers.iter().enumerate() {
            writeln!(f, "{:>3}. {name}", i + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation Results:")?;
        writeln!(f, "═══════════════════")?;
        writeln!(f, "Dataset: {}", self.dataset)?;
        writeln!(
            f,
            "Rows: {} train / {} test, {} features",
            self.train_rows, self.test_rows, self.vocabulary_size
        )?;
        writeln!(f, "Evaluated at: {}", self.evaluated_at.to_rfc3339())?;
        writeln!(f)?;

        let results = &self.evaluation.results;
        let width = results
            .iter()
            .map(|row| row.classifier.len())
            .chain(std::iter::once("Classifier".len()))
            .max()
            .unwrap_or(10);
        writeln!(
            f,
            "{:<width$}  {:>9}  {:>8}  {:>11}  {:>8}  {:>8}",
            "Classifier", "Train acc", "Test acc", "F1 weighted", "F1 micro", "F1 macro"
        )?;
        writeln!(f, "{}", "─".repeat(width + 54))?;
        for row in results.iter() {
            writeln!(
                f,
                "{:<width$}  {:>9.4}  {:>8.4}  {:>11.4}  {:>8.4}  {:>8.4}",
                row.classifier, row.train_acc, row.test_acc, row.f1_weighted, row.f1_micro, row.f1_macro
            )?;
        }

        if let Some(best) = results.best() {
            writeln!(f)?;
            writeln!(f, "Best test accuracy: {} ({:.4})", best.classifier, best.test_acc)?;
        }

        if !self.evaluation.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures:")?;
            writeln!(f, "─────────")?;
            for failure in &self.evaluation.failures {
                writeln!(f, "{:>3}. {}: {}", failure.index, failure.classifier, failure.error)?;
            }
        }

        if self.show_matrices {
            for record in &self.evaluation.confusion_matrices {
                writeln!(f)?;
                writeln!(f, "Confusion matrix: {}", record.classifier)?;
                write!(f, "{}", record.matrix)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SingleEvaluationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classifier: {}", self.result.classifier)?;
        writeln!(f, "Dataset: {}", self.dataset)?;
        writeln!(f, "Train accuracy: {:.4}", self.result.train_acc)?;
        writeln!(f, "Test accuracy:  {:.4}", self.result.test_acc)?;
        writeln!(f)?;
        writeln!(f, "Confusion matrix:")?;
        write!(f, "{}", self.result.confusion_matrix)
    }
}

impl fmt::Display for ReportOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {}", self.dataset)?;
        write!(f, "{}", self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::evaluate::{ClassifierFailure, FitResultRow};

    fn summary() -> EvaluationSummary {
        let row = |name: &str, test_acc: f64| FitResultRow {
            classifier: name.to_string(),
            train_acc: 1.0,
            test_acc,
            f1_weighted: test_acc,
            f1_micro: test_acc,
            f1_macro: test_acc,
        };
        EvaluationSummary {
            evaluated_at: Utc::now(),
            dataset: "reviews.csv".to_string(),
            train_rows: 30,
            test_rows: 10,
            vocabulary_size: 12,
            parallel: false,
            evaluation: Evaluation {
                results: ResultsTable {
                    rows: vec![row("DecisionTree", 0.8), row("RandomForest", 0.9)],
                },
                confusion_matrices: Vec::new(),
                failures: vec![ClassifierFailure {
                    index: 3,
                    classifier: "GaussianProcess".to_string(),
                    error: "Model error: not positive definite".to_string(),
                }],
            },
            show_matrices: false,
        }
    }

    #[test]
    fn test_format_csv_value() {
        assert_eq!(
            format_csv_value(&serde_json::Value::String("test".to_string())),
            "test"
        );
        assert_eq!(
            format_csv_value(&serde_json::Value::String("test,with,commas".to_string())),
            "\"test,with,commas\""
        );
        assert_eq!(
            format_csv_value(&serde_json::Value::Number(serde_json::Number::from(42))),
            "42"
        );
        assert_eq!(format_csv_value(&serde_json::Value::Bool(true)), "true");
        assert_eq!(format_csv_value(&serde_json::Value::Null), "");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(
            format_value(&serde_json::Value::String("test".to_string())),
            "test"
        );
        assert_eq!(format_value(&serde_json::json!([1, 2])), "[1, 2]");
        assert_eq!(format_value(&serde_json::Value::Bool(false)), "false");
        assert_eq!(format_value(&serde_json::Value::Null), "null");
    }

    #[test]
    fn test_evaluation_summary_display() {
        let text = summary().to_string();
        assert!(text.contains("DecisionTree"));
        assert!(text.contains("Best test accuracy: RandomForest (0.9000)"));
        assert!(text.contains("3. GaussianProcess: Model error"));
        assert!(!text.contains("Confusion matrix"));
    }

    #[test]
    fn test_evaluation_summary_json_is_flat() {
        let value = serde_json::to_value(summary()).unwrap();
        assert_eq!(value["results"][1]["classifier"], "RandomForest");
        assert_eq!(value["failures"][0]["index"], 3);
        assert!(value.get("show_matrices").is_none());
        assert!(value["evaluated_at"].is_string());
    }

    #[test]
    fn test_clean_output_display() {
        let output = CleanOutput {
            documents: 2,
            cleaned: vec![
                Cleaned::Text("movie was amazing".to_string()),
                Cleaned::Tokens(vec!["big".to_string(), "test".to_string()]),
            ],
        };
        assert_eq!(output.to_string(), "movie was amazing\n[big, test]\n");
    }

    #[test]
    fn test_results_table_is_fixed_width() {
        let table = format_results_table(&summary().evaluation.results);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("| classifier   |"));
        assert!(lines[2].starts_with("| DecisionTree |"));
        assert!(lines[3].contains("      0.9000 |"));
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|line| line.chars().count() == width));
    }

    #[test]
    fn test_key_value_table() {
        let rows = vec![
            ("documents".to_string(), "2".to_string()),
            ("cleaned".to_string(), "[big test]".to_string()),
        ];
        assert_eq!(
            format_key_value_table(&rows),
            "| field     | value\n|-----------|------\n| documents | 2\n| cleaned   | [big test]\n"
        );
    }
}
