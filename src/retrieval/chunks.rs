//! Retrieval over sentence-like chunks of a plain transcript.

use super::{rank, select, token_set};
use crate::text::truncate_chars;

/// Split text after sentence-ending punctuation followed by whitespace, and
/// at newlines. Pieces are trimmed; empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        let boundary = ch == '\n' || (ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')));
        if boundary {
            pieces.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
        prev = Some(ch);
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Backstop retriever used when line retrieval yields nothing.
#[derive(Debug, Clone)]
pub struct ChunkRetriever {
    max_chars: usize,
    max_chunks: usize,
}

impl Default for ChunkRetriever {
    fn default() -> Self {
        Self {
            max_chars: 7000,
            max_chunks: 18,
        }
    }
}

impl ChunkRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character budget.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Select chunks for `query`. Falls back to the transcript prefix when the
    /// query has no tokens or nothing overlaps.
    pub fn retrieve(&self, query: &str, transcript: &str) -> String {
        let query_tokens = token_set(query);
        if query_tokens.is_empty() {
            return truncate_chars(transcript, self.max_chars).to_string();
        }

        let chunks = split_sentences(transcript);
        let ranked = rank(&query_tokens, &chunks);
        if ranked.is_empty() {
            return truncate_chars(transcript, self.max_chars).to_string();
        }

        select(&ranked, self.max_chars, self.max_chunks).join("\n")
    }
}
