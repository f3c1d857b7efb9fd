//! Lexical evidence retrieval over transcripts.
//!
//! Two retrievers share one scoring scheme: the query and each candidate unit
//! are reduced to token sets, a unit scores the size of the intersection, and
//! zero-score units are dropped. Survivors are ranked by score, earlier units
//! first on ties, and accepted greedily until a character or count budget runs
//! out.

mod chunks;
mod lines;

pub use chunks::{split_sentences, ChunkRetriever};
pub use lines::LineRetriever;

use crate::text::char_len;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that carry no retrieval signal.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "is", "are", "to", "in", "of", "for", "on", "with", "this",
    "that", "it", "be", "as", "at", "by", "from", "what", "when", "where", "why", "how",
];

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\W_]+").expect("Invalid regex"));

/// Lowercased alphanumeric tokens, minus stopwords and single characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| char_len(token) > 1 && !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Distinct tokens of `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Excerpt selected for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalResult {
    /// Selected units joined by newlines, in selection order.
    pub excerpt: String,
    /// Highest overlap among scored units (0 when nothing matched).
    pub max_overlap: usize,
    /// Number of units in the excerpt that were selected by score.
    pub matched_units: usize,
}

impl RetrievalResult {
    /// Whether the result carries any lexical evidence.
    pub fn has_evidence(&self) -> bool {
        self.max_overlap > 0 && self.matched_units > 0
    }
}

/// A unit with non-zero overlap and its original position.
#[derive(Debug)]
struct Scored<'a> {
    overlap: usize,
    position: usize,
    text: &'a str,
}

/// Score units against the query tokens, dropping zero-overlap units and
/// ordering by overlap descending then position ascending.
fn rank<'a>(query: &HashSet<String>, units: &[&'a str]) -> Vec<Scored<'a>> {
    let mut scored: Vec<Scored<'a>> = units
        .iter()
        .enumerate()
        .filter_map(|(position, text)| {
            let overlap = token_set(text).intersection(query).count();
            (overlap > 0).then_some(Scored {
                overlap,
                position,
                text,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.overlap.cmp(&a.overlap).then(a.position.cmp(&b.position)));
    scored
}

/// Greedily accept ranked units while `chars + 1` per unit fits the budget.
///
/// Stops at the first unit that would overflow, even if a later, shorter one
/// would still fit.
fn select<'a>(ranked: &[Scored<'a>], max_chars: usize, max_units: usize) -> Vec<&'a str> {
    let mut selected = Vec::new();
    let mut size = 0;
    for unit in ranked {
        let cost = char_len(unit.text) + 1;
        if size + cost > max_chars {
            break;
        }
        selected.push(unit.text);
        size += cost;
        if selected.len() >= max_units {
            break;
        }
    }
    selected
}
