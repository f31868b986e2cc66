//! Integration tests for review text cleaning.

use std::fs;
use std::io::Write;

use classbench::analysis::{CleanOptions, Cleaned, TextCleaner, clean};
use classbench::config::ClassbenchConfig;
use classbench::error::{ClassbenchError, Result};
use tempfile::{NamedTempFile, tempdir};

const REVIEWS: &[&str] = &[
    "The Movie was AMAZING!!",
    "a big test",
    "I didn't like it<br /><br />10/10 would NOT watch again...",
    "Ünïcödé café scenes, déjà vu",
    "",
    "   \t  ",
    "Loved the acting; hated the ending.",
];

#[test]
fn test_known_outputs() -> Result<()> {
    let options = CleanOptions::default();
    assert_eq!(
        clean("The Movie was AMAZING!!", &options)?.into_text(),
        "the movie was amazing"
    );
    assert_eq!(clean("a big test", &options)?.into_text(), "big test");
    Ok(())
}

#[test]
fn test_every_word_meets_min_length() -> Result<()> {
    for min_word_length in [1, 3, 5] {
        let options = CleanOptions {
            min_word_length,
            ..CleanOptions::default()
        };
        for review in REVIEWS {
            for word in clean(review, &options)?.into_tokens() {
                assert!(
                    word.chars().count() >= min_word_length,
                    "'{word}' shorter than {min_word_length}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_output_is_lowercase_ascii_letters() -> Result<()> {
    let options = CleanOptions {
        min_word_length: 1,
        ..CleanOptions::default()
    };
    for review in REVIEWS {
        let text = clean(review, &options)?.into_text();
        assert!(
            text.chars().all(|c| c.is_ascii_lowercase() || c == ' '),
            "unexpected character in '{text}'"
        );
        assert!(!text.contains("  "));
        assert_eq!(text.trim(), text);
    }
    Ok(())
}

#[test]
fn test_cleaning_is_idempotent() -> Result<()> {
    let options = CleanOptions {
        remove_stopwords: true,
        ..CleanOptions::default()
    };
    for review in REVIEWS {
        let once = clean(review, &options)?.into_text();
        let twice = clean(&once, &options)?.into_text();
        assert_eq!(once, twice);
    }
    Ok(())
}

#[test]
fn test_token_and_text_forms_agree() -> Result<()> {
    let text_options = CleanOptions::default();
    let token_options = CleanOptions {
        as_tokens: true,
        ..CleanOptions::default()
    };
    for review in REVIEWS {
        let text = clean(review, &text_options)?;
        let tokens = clean(review, &token_options)?;
        assert!(matches!(tokens, Cleaned::Tokens(_)));
        assert_eq!(text.into_text(), tokens.into_text());
    }
    Ok(())
}

#[test]
fn test_custom_stopword_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "movie")?;
    writeln!(file, "acting")?;

    let mut config = ClassbenchConfig::default();
    config.cleaner.stopwords_path = Some(file.path().to_path_buf());
    config.cleaner.options.remove_stopwords = true;

    let cleaner = config.text_cleaner()?;
    let cleaned = cleaner.clean("The movie had great acting", &config.cleaner.options)?;
    // The built-in list is replaced, so "the" survives.
    assert_eq!(cleaned.into_text(), "the had great");
    Ok(())
}

#[test]
fn test_lemmatize_with_lexicon_dir() -> Result<()> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("index.noun"),
        "  1 license header line\nmovie n 1 1 @ 1 0 03789946\n",
    )?;
    fs::write(dir.path().join("index.verb"), "run v 1 1 @ 1 0 01926311\n")?;
    fs::write(dir.path().join("index.adj"), "good a 1 1 & 1 0 01123148\n")?;
    fs::write(dir.path().join("verb.exc"), "ran run\n")?;

    let mut config = ClassbenchConfig::default();
    config.cleaner.lexicon_dir = Some(dir.path().to_path_buf());
    config.cleaner.options.lemmatize = true;

    let cleaner = config.text_cleaner()?;
    assert!(cleaner.has_lemmatizer());
    let cleaned = cleaner.clean("Movies ran", &config.cleaner.options)?;
    assert_eq!(cleaned.into_text(), "movie run");
    Ok(())
}

#[test]
fn test_missing_lexicon_file() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("index.noun"), "movie n 1 1\n")?;

    let mut config = ClassbenchConfig::default();
    config.cleaner.lexicon_dir = Some(dir.path().to_path_buf());
    assert!(matches!(
        config.text_cleaner(),
        Err(ClassbenchError::Resource(_))
    ));
    Ok(())
}

#[test]
fn test_clean_all_matches_clean() -> Result<()> {
    let cleaner = TextCleaner::new()?;
    let options = CleanOptions {
        stem: true,
        ..CleanOptions::default()
    };
    let batch = cleaner.clean_all(REVIEWS, &options)?;
    assert_eq!(batch.len(), REVIEWS.len());
    for (review, cleaned) in REVIEWS.iter().zip(batch) {
        assert_eq!(cleaner.clean(review, &options)?, cleaned);
    }
    Ok(())
}
