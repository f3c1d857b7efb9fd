//! Retrieval over timestamped transcript lines.

use super::{rank, select, token_set, RetrievalResult};
use crate::text::truncate_chars;

/// Selects the most relevant `[TS] text` lines for a query.
#[derive(Debug, Clone)]
pub struct LineRetriever {
    max_chars: usize,
    max_lines: usize,
    default_lines: usize,
}

impl Default for LineRetriever {
    fn default() -> Self {
        Self {
            max_chars: 9000,
            max_lines: 80,
            default_lines: 100,
        }
    }
}

impl LineRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character budget.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Set the maximum number of selected lines.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Select lines for `query` from newline-separated `lines`.
    ///
    /// A query without meaningful tokens gets the opening lines with zero
    /// overlap, which downstream gates treat as no evidence.
    pub fn retrieve(&self, query: &str, lines: &str) -> RetrievalResult {
        let units: Vec<&str> = lines
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if units.is_empty() {
            return RetrievalResult::default();
        }

        let query_tokens = token_set(query);
        if query_tokens.is_empty() {
            let opening: Vec<&str> = units.iter().take(self.default_lines).copied().collect();
            let joined = opening.join("\n");
            return RetrievalResult {
                excerpt: truncate_chars(&joined, self.max_chars).to_string(),
                max_overlap: 0,
                matched_units: 0,
            };
        }

        let ranked = rank(&query_tokens, &units);
        let Some(best) = ranked.first() else {
            return RetrievalResult::default();
        };
        let max_overlap = best.overlap;

        let selected = select(&ranked, self.max_chars, self.max_lines);
        RetrievalResult {
            excerpt: selected.join("\n"),
            max_overlap,
            matched_units: selected.len(),
        }
    }
}
