//! Ordered, case-insensitively deduplicated token collection

use std::collections::HashSet;

/// Insertion-ordered set of strings compared case-insensitively.
///
/// The first occurrence wins and keeps its original casing; blank tokens are
/// ignored and surrounding whitespace is trimmed.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: Vec<String>,
    seen: HashSet<String>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token; returns `true` if it was new
    pub fn insert(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        if self.seen.insert(token.to_lowercase()) {
            self.tokens.push(token.to_string());
            true
        } else {
            false
        }
    }

    pub fn extend<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            self.insert(token.as_ref());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }
}
