//! Command line argument parsing for the classbench CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// classbench - benchmark text classifiers on labelled reviews
#[derive(Parser, Debug, Clone)]
#[command(name = "classbench")]
#[command(about = "Clean review text and benchmark a roster of classifiers on it")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ClassbenchArgs {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE", env = "CLASSBENCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ClassbenchArgs {
    /// Log level: quiet → error, default → info, `-vv` → debug, more → trace.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 | 1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Clean a review text
    Clean(CleanArgs),

    /// Fit and score every classifier of the roster
    Evaluate(EvaluateArgs),

    /// Fit and score a single classifier
    #[command(name = "evaluate-one")]
    EvaluateOne(EvaluateOneArgs),

    /// Fit one classifier and print its full report
    Report(EvaluateOneArgs),

    /// List the registered classifier names
    #[command(name = "list-classifiers")]
    ListClassifiers,
}

/// Arguments for cleaning text
#[derive(Parser, Debug, Clone)]
pub struct CleanArgs {
    /// Text to clean
    #[arg(value_name = "TEXT", required_unless_present = "file")]
    pub text: Option<String>,

    /// Clean every line of a file instead
    #[arg(long, value_name = "FILE", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Drop words shorter than this
    #[arg(long)]
    pub min_word_length: Option<usize>,

    /// Remove English stopwords
    #[arg(long)]
    pub remove_stopwords: bool,

    /// Apply the Porter stemmer
    #[arg(long)]
    pub stem: bool,

    /// Lemmatize (needs `cleaner.lexicon_dir` in the config)
    #[arg(long)]
    pub lemmatize: bool,

    /// Print the token list instead of a joined string
    #[arg(long)]
    pub tokens: bool,
}

/// Dataset location and column names
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// CSV or JSON Lines dataset
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Column (or JSON field) holding the review text
    #[arg(long, default_value = "review")]
    pub text_column: String,

    /// Column (or JSON field) holding the integer label
    #[arg(long, default_value = "sentiment")]
    pub label_column: String,
}

/// Arguments for the batch evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Fit classifiers in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Roster subset to run, in order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub classifiers: Vec<String>,
}

/// Arguments for single-classifier commands
#[derive(Parser, Debug, Clone)]
pub struct EvaluateOneArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Roster name of the classifier
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
    /// CSV output (tables only; other results fall back to key,value)
    Csv,
    /// Fixed-width pipe table (the results table alone for `evaluate`)
    Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_command() {
        let args = ClassbenchArgs::try_parse_from([
            "classbench",
            "clean",
            "The Movie was AMAZING!!",
            "--remove-stopwords",
            "--min-word-length",
            "2",
        ])
        .unwrap();

        if let Command::Clean(clean_args) = args.command {
            assert_eq!(clean_args.text.as_deref(), Some("The Movie was AMAZING!!"));
            assert!(clean_args.remove_stopwords);
            assert_eq!(clean_args.min_word_length, Some(2));
            assert!(!clean_args.stem);
        } else {
            panic!("Expected Clean command");
        }
    }

    #[test]
    fn test_clean_requires_text_or_file() {
        assert!(ClassbenchArgs::try_parse_from(["classbench", "clean"]).is_err());
        assert!(
            ClassbenchArgs::try_parse_from(["classbench", "clean", "--file", "reviews.txt"])
                .is_ok()
        );
    }

    #[test]
    fn test_evaluate_command() {
        let args = ClassbenchArgs::try_parse_from([
            "classbench",
            "evaluate",
            "reviews.csv",
            "--parallel",
            "--classifiers",
            "DecisionTree,RandomForest",
            "--label-column",
            "label",
        ])
        .unwrap();

        if let Command::Evaluate(eval_args) = args.command {
            assert_eq!(eval_args.data.dataset, PathBuf::from("reviews.csv"));
            assert_eq!(eval_args.data.text_column, "review");
            assert_eq!(eval_args.data.label_column, "label");
            assert!(eval_args.parallel);
            assert_eq!(eval_args.classifiers, vec!["DecisionTree", "RandomForest"]);
        } else {
            panic!("Expected Evaluate command");
        }
    }

    #[test]
    fn test_evaluate_one_and_report() {
        let args =
            ClassbenchArgs::try_parse_from(["classbench", "evaluate-one", "r.csv", "ExtraTree"])
                .unwrap();
        assert!(matches!(args.command, Command::EvaluateOne(ref a) if a.name == "ExtraTree"));

        let args =
            ClassbenchArgs::try_parse_from(["classbench", "report", "r.jsonl", "XGBoost"]).unwrap();
        assert!(matches!(args.command, Command::Report(ref a) if a.name == "XGBoost"));
    }

    #[test]
    fn test_log_levels() {
        let level = |argv: &[&str]| ClassbenchArgs::try_parse_from(argv).unwrap().log_level();
        assert_eq!(level(&["classbench", "list-classifiers"]), LevelFilter::Info);
        assert_eq!(level(&["classbench", "-v", "list-classifiers"]), LevelFilter::Info);
        assert_eq!(level(&["classbench", "-vv", "list-classifiers"]), LevelFilter::Debug);
        assert_eq!(level(&["classbench", "-vvv", "list-classifiers"]), LevelFilter::Trace);
        assert_eq!(level(&["classbench", "-q", "list-classifiers"]), LevelFilter::Error);
    }

    #[test]
    fn test_output_format() {
        let args =
            ClassbenchArgs::try_parse_from(["classbench", "--format", "json", "list-classifiers"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
    }
}
