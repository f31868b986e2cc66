//! Labelled review datasets and train/test splitting.
//!
//! Datasets are read from CSV files with a header row or from JSON Lines
//! files (one object per line). Labels must be integers; JSON labels may
//! also be integral floats or numeric strings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClassbenchError, Result};

/// Parallel text and label columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    texts: Vec<String>,
    labels: Vec<i64>,
}

impl Dataset {
    pub fn new(texts: Vec<String>, labels: Vec<i64>) -> Result<Self> {
        if texts.len() != labels.len() {
            return Err(ClassbenchError::dataset(format!(
                "{} texts but {} labels",
                texts.len(),
                labels.len()
            )));
        }
        Ok(Dataset { texts, labels })
    }

    /// Read a CSV file with a header row naming the columns.
    pub fn from_csv<P: AsRef<Path>>(path: P, text_column: &str, label_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                ClassbenchError::dataset(format!(
                    "column '{name}' not found in {}",
                    path.display()
                ))
            })
        };
        let text_idx = column(text_column)?;
        let label_idx = column(label_column)?;

        let mut texts = Vec::new();
        let mut labels = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let text = record.get(text_idx).ok_or_else(|| {
                ClassbenchError::dataset(format!("line {line}: missing '{text_column}' field"))
            })?;
            let label = record.get(label_idx).ok_or_else(|| {
                ClassbenchError::dataset(format!("line {line}: missing '{label_column}' field"))
            })?;
            texts.push(text.to_string());
            labels.push(parse_label(label, line)?);
        }

        debug!("loaded {} rows from {}", texts.len(), path.display());
        Self::new(texts, labels)
    }

    /// Read a JSON Lines file; blank lines are skipped.
    pub fn from_jsonl<P: AsRef<Path>>(path: P, text_field: &str, label_field: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let mut texts = Vec::new();
        let mut labels = Vec::new();
        for (i, line) in content.lines().enumerate() {
            let line_no = i as u64 + 1;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)?;
            let text = value
                .get(text_field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ClassbenchError::dataset(format!(
                        "line {line_no}: '{text_field}' is missing or not a string"
                    ))
                })?;
            let label = match value.get(label_field) {
                Some(Value::Number(n)) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .ok_or_else(|| {
                        ClassbenchError::dataset(format!(
                            "line {line_no}: label {n} is not an integer"
                        ))
                    })?,
                Some(Value::String(s)) => parse_label(s, line_no)?,
                _ => {
                    return Err(ClassbenchError::dataset(format!(
                        "line {line_no}: '{label_field}' is missing"
                    )));
                }
            };
            texts.push(text.to_string());
            labels.push(label);
        }

        debug!("loaded {} rows from {}", texts.len(), path.display());
        Self::new(texts, labels)
    }

    /// Dispatch on the extension: `.jsonl`, `.ndjson` and `.json` are JSON
    /// Lines, anything else is CSV.
    pub fn from_path<P: AsRef<Path>>(path: P, text: &str, label: &str) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl" | "ndjson" | "json") => Self::from_jsonl(path, text, label),
            _ => Self::from_csv(path, text, label),
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            texts: indices.iter().map(|&i| self.texts[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Number of rows per label, in label order.
    pub fn class_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

fn parse_label(raw: &str, line: u64) -> Result<i64> {
    raw.trim().parse().map_err(|_| {
        ClassbenchError::dataset(format!("line {line}: label '{raw}' is not an integer"))
    })
}

/// A train/test partition.
#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Seeded shuffle split holding out `test_size` of the rows.
///
/// Without `stratify` the test set has `ceil(test_size * n)` rows. With
/// `stratify` every label contributes `round(test_size * n_label)` rows,
/// so label proportions are kept on both sides.
pub fn train_test_split(dataset: &Dataset, test_size: f64, seed: u64, stratify: bool) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ClassbenchError::invalid_argument(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let (mut train, mut test) = if stratify {
        let mut by_label: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in dataset.labels.iter().enumerate() {
            by_label.entry(label).or_default().push(i);
        }
        let mut train = Vec::new();
        let mut test = Vec::new();
        for indices in by_label.values_mut() {
            indices.shuffle(&mut rng);
            let n_test = (test_size * indices.len() as f64).round() as usize;
            test.extend_from_slice(&indices[..n_test]);
            train.extend_from_slice(&indices[n_test..]);
        }
        (train, test)
    } else {
        let mut indices: Vec<usize> = (0..dataset.len()).collect();
        indices.shuffle(&mut rng);
        let n_test = (test_size * indices.len() as f64).ceil() as usize;
        let train = indices.split_off(n_test.min(indices.len()));
        (train, indices)
    };

    if train.is_empty() || test.is_empty() {
        return Err(ClassbenchError::dataset(format!(
            "cannot split {} rows with test_size {test_size}: one side would be empty",
            dataset.len()
        )));
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    debug!("split {} rows into {} train / {} test", dataset.len(), train.len(), test.len());
    Ok(Split {
        train: dataset.select(&train),
        test: dataset.select(&test),
    })
}
