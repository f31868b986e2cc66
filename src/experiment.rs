//! From a labelled dataset to train/test feature matrices.

use log::info;

use crate::config::ClassbenchConfig;
use crate::dataset::{Dataset, train_test_split};
use crate::error::Result;
use crate::ml::matrix::FeatureMatrix;

/// Vectorized train and test splits.
#[derive(Clone, Debug)]
pub struct PreparedData {
    pub x_train: FeatureMatrix,
    pub y_train: Vec<i64>,
    pub x_test: FeatureMatrix,
    pub y_test: Vec<i64>,
    pub vocabulary_size: usize,
}

/// Clean every text, split, then fit the vectorizer on the training side
/// only and transform both sides with it.
pub fn prepare(dataset: &Dataset, config: &ClassbenchConfig) -> Result<PreparedData> {
    let cleaner = config.text_cleaner()?;
    let cleaned: Vec<String> = cleaner
        .clean_all(dataset.texts(), &config.cleaner.options)?
        .into_iter()
        .map(|c| c.into_text())
        .collect();
    let cleaned = Dataset::new(cleaned, dataset.labels().to_vec())?;

    let split = &config.split;
    let split = train_test_split(&cleaned, split.test_size, split.seed, split.stratify)?;

    let mut vectorizer = config.vectorizer();
    let x_train = vectorizer.fit_transform(split.train.texts())?;
    let x_test = vectorizer.transform(split.test.texts())?;
    info!(
        "prepared {} train / {} test rows with {} {} features",
        x_train.n_rows(),
        x_test.n_rows(),
        vectorizer.vocabulary_size(),
        vectorizer.name()
    );

    Ok(PreparedData {
        x_train,
        y_train: split.train.labels().to_vec(),
        x_test,
        y_test: split.test.labels().to_vec(),
        vocabulary_size: vectorizer.vocabulary_size(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_shapes() {
        let texts: Vec<String> = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    format!("wonderful great acting number{i}")
                } else {
                    format!("awful boring plot number{i}")
                }
            })
            .collect();
        let labels = (0..20).map(|i| (i % 2) as i64).collect();
        let dataset = Dataset::new(texts, labels).unwrap();

        let prepared = prepare(&dataset, &ClassbenchConfig::default()).unwrap();
        assert_eq!(prepared.x_train.n_rows(), 14);
        assert_eq!(prepared.x_test.n_rows(), 6);
        assert_eq!(prepared.y_train.len(), 14);
        assert_eq!(prepared.x_train.n_cols(), prepared.vocabulary_size);
        assert_eq!(prepared.x_test.n_cols(), prepared.vocabulary_size);
    }
}
