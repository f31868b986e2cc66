//! Length filter implementation.
//!
//! Removes tokens whose character count falls outside `[min, max]`.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that keeps tokens with at least `min` characters and, when a
/// maximum is set, at most `max` characters.
///
/// Length is counted in Unicode scalar values, not bytes.
///
/// # Examples
///
/// ```
/// use classbench::analysis::token_filter::Filter;
/// use classbench::analysis::token_filter::length::LengthFilter;
/// use classbench::analysis::token::Token;
///
/// let filter = LengthFilter::min(3);
/// let tokens = vec![Token::new("it", 0), Token::new("was", 1), Token::new("great", 2)];
/// let result: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
///
/// assert_eq!(result.len(), 2);
/// assert_eq!(result[0].text, "was");
/// ```
#[derive(Clone, Debug)]
pub struct LengthFilter {
    min: usize,
    max: Option<usize>,
}

impl LengthFilter {
    /// Keep tokens with at least `min` characters.
    pub fn min(min: usize) -> Self {
        LengthFilter { min, max: None }
    }

    /// Keep tokens whose length lies in `[min, max]`.
    pub fn range(min: usize, max: usize) -> Self {
        LengthFilter {
            min,
            max: Some(max),
        }
    }

    fn accepts(&self, token: &Token) -> bool {
        let len = token.char_len();
        len >= self.min && self.max.is_none_or(|max| len <= max)
    }
}

impl Filter for LengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens
            .filter(|token| token.is_stopped() || self.accepts(token))
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "length"
    }
}
