//! Heuristic search-query construction from free-text headings.

use std::collections::HashSet;

pub const DEFAULT_QUERY: &str = "machine learning";

/// Words that never narrow a search.
///
/// `or` is listed so that a query joined with `" OR "` extracts back to the
/// same token set.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "in", "on", "for", "with", "of", "and", "to", "from", "using", "or",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Plain space; every keyword must match on engines with implicit AND.
    Space,
    /// `" OR "`; any keyword may match.
    Or,
}

impl Separator {
    fn as_str(self) -> &'static str {
        match self {
            Separator::Space => " ",
            Separator::Or => " OR ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    separator: Separator,
    /// Tokens with this many characters or fewer are dropped.
    min_token_len: usize,
    default_query: String,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self {
            separator: Separator::Space,
            min_token_len: 1,
            default_query: DEFAULT_QUERY.to_string(),
        }
    }
}

impl KeywordExtractor {
    pub fn new(separator: Separator) -> Self {
        Self {
            separator,
            ..Self::default()
        }
    }

    pub fn with_min_token_len(mut self, min_token_len: usize) -> Self {
        self.min_token_len = min_token_len;
        self
    }

    pub fn with_default_query(mut self, default_query: impl Into<String>) -> Self {
        self.default_query = default_query.into();
        self
    }

    pub fn extract(&self, text: &str) -> String {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        let mut seen = HashSet::new();
        let keywords: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|word| !STOPWORDS.contains(word))
            .filter(|word| word.chars().count() > self.min_token_len)
            .filter(|word| seen.insert(*word))
            .collect();

        let query = keywords.join(self.separator.as_str());
        if query.trim().is_empty() {
            self.default_query.clone()
        } else {
            query
        }
    }
}
