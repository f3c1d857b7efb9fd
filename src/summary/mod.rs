//! Summaries and reports generated from a loaded transcript.
//!
//! Long transcripts are first compressed into per-chunk notes
//! ([`Compressor`]); the digest then feeds either the structured summary,
//! which is validated and repaired into a fixed layout, or one of the
//! free-form reports.

mod compress;
mod reports;
mod structured;

pub use compress::{split_text, Compressor, CHUNK_SIZE, MAX_CHUNKS};
pub use reports::{ReportGenerator, ReportKind};
pub use structured::{fallback_structured_summary, looks_structured_summary, SummaryGenerator};

use crate::transcript::UNKNOWN_TITLE;

/// Timeline markers passed to prompts are capped at this many characters.
const MAX_TIMELINE_CHARS: usize = 4000;

/// The video a summary or report is generated for.
#[derive(Debug, Clone, Copy)]
pub struct VideoContext<'a> {
    pub transcript: &'a str,
    /// Requested output language (normalized before use).
    pub language: &'a str,
    pub timeline: &'a str,
    /// Language the transcript itself is in.
    pub source_language: &'a str,
    pub title: &'a str,
}

impl<'a> VideoContext<'a> {
    /// Context with only a transcript; everything else takes its default.
    pub fn new(transcript: &'a str) -> Self {
        Self {
            transcript,
            language: crate::language::DEFAULT_LANGUAGE,
            timeline: "",
            source_language: "Unknown",
            title: UNKNOWN_TITLE,
        }
    }

    /// Timeline markers as shown to the model.
    fn timeline_for_prompt(&self) -> &'a str {
        let capped = crate::text::truncate_chars(self.timeline.trim(), MAX_TIMELINE_CHARS);
        if capped.is_empty() {
            "Not available"
        } else {
            capped
        }
    }
}
