use regex::Regex;

use super::CharFilter;
use crate::error::{ClassbenchError, Result};

/// Pattern matching letters that survive cleaning.
pub const NON_LETTER_PATTERN: &str = "[^a-zA-Z]";

/// Replaces every match of a regular expression with a fixed string.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| ClassbenchError::Anyhow(anyhow::Error::from(e)))?,
            replacement: replacement.to_string(),
        })
    }

    /// Replace each character outside `[a-zA-Z]` with a single space.
    ///
    /// Digits, punctuation and non-ASCII letters all become word breaks,
    /// so "don't" splits into "don" and "t".
    pub fn non_letters() -> Result<Self> {
        Self::new(NON_LETTER_PATTERN, " ")
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}
