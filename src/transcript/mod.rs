//! Transcript acquisition and the views derived from it.
//!
//! Every source (YouTube captions, audio transcription) is normalized into
//! [`TranscriptEntry`] values before anything else sees them. From those
//! entries [`TranscriptData`] derives the three views the assistant works with:
//!
//! - `text` - whitespace-normalized full text, capped at [`MAX_TRANSCRIPT_CHARS`]
//! - `timeline` - a strided sample of at most 14 `- HH:MM:SS | snippet` markers
//! - `full_lines` - every entry as `[HH:MM:SS] text`, up to [`MAX_FULL_LINES`]

mod audio;
mod captions;
mod fetcher;
mod video_id;
mod ytdlp;

pub use audio::AudioFallbackSource;
pub(crate) use audio::transcription_request;
pub use captions::{parse_json3, CaptionsSource};
pub use fetcher::{TranscriptFetcher, TranscriptProvider, TranscriptSource};
pub use video_id::{extract_video_id, mentions_video_link};
pub use ytdlp::fetch_video_title;

use crate::error::{Result, VidbriefError};
use crate::text::{char_len, collapse_whitespace, truncate_chars};
use serde::{Deserialize, Serialize};

/// Maximum characters kept from the full transcript text.
pub const MAX_TRANSCRIPT_CHARS: usize = 120_000;
/// Maximum number of entries rendered as timestamped lines.
pub const MAX_FULL_LINES: usize = 5000;
/// Maximum number of timeline markers.
pub const MAX_TIMELINE_MARKERS: usize = 14;
/// Maximum characters of entry text shown per timeline marker.
const MARKER_SNIPPET_CHARS: usize = 110;

/// Title used when no source can provide one.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// A single timestamped transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Spoken text.
    pub text: String,
}

impl TranscriptEntry {
    /// Create a new entry.
    pub fn new(start_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            text: text.into(),
        }
    }
}

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSourceType {
    YoutubeCaptions,
    AudioFallback,
    #[default]
    Unknown,
}

impl std::fmt::Display for TranscriptSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSourceType::YoutubeCaptions => write!(f, "youtube_captions"),
            TranscriptSourceType::AudioFallback => write!(f, "audio_fallback"),
            TranscriptSourceType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Entries produced by one transcript source, before views are derived.
#[derive(Debug, Clone)]
pub struct FetchedTranscript {
    pub entries: Vec<TranscriptEntry>,
    /// Language name or code reported by the source.
    pub source_language: String,
    pub source_type: TranscriptSourceType,
}

/// A transcript with all derived views, ready to be stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptData {
    /// Full text, capped at [`MAX_TRANSCRIPT_CHARS`].
    pub text: String,
    /// Timeline markers, one per line.
    pub timeline: String,
    /// Timestamped lines, one per entry.
    pub full_lines: String,
    pub source_language: String,
    pub video_title: String,
    pub source_type: TranscriptSourceType,
    /// Whether `text` was cut at [`MAX_TRANSCRIPT_CHARS`].
    pub is_truncated: bool,
}

impl TranscriptData {
    /// Derive all views from fetched entries.
    ///
    /// Fails when the entries contain no text at all.
    pub fn from_fetched(fetched: FetchedTranscript, video_title: &str) -> Result<Self> {
        let joined = fetched
            .entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let full_text = collapse_whitespace(&joined);
        if full_text.is_empty() {
            return Err(VidbriefError::TranscriptUnavailable(
                "Empty transcript".to_string(),
            ));
        }
        let (text, is_truncated) = cap_transcript_text(&full_text);

        Ok(Self {
            text,
            timeline: build_timeline_markers(&fetched.entries),
            full_lines: build_full_lines(&fetched.entries, MAX_FULL_LINES),
            source_language: fetched.source_language,
            video_title: video_title.to_string(),
            source_type: fetched.source_type,
            is_truncated,
        })
    }
}

/// Cap transcript text, reporting whether anything was cut.
pub fn cap_transcript_text(text: &str) -> (String, bool) {
    let text = text.trim();
    if char_len(text) <= MAX_TRANSCRIPT_CHARS {
        (text.to_string(), false)
    } else {
        (truncate_chars(text, MAX_TRANSCRIPT_CHARS).to_string(), true)
    }
}

/// Sample every `len / 14`-th entry as a timeline marker.
pub fn build_timeline_markers(entries: &[TranscriptEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let stride = (entries.len() / MAX_TIMELINE_MARKERS).max(1);
    let mut markers = Vec::new();
    for entry in entries.iter().step_by(stride) {
        let text = collapse_whitespace(&entry.text);
        if text.is_empty() {
            continue;
        }
        markers.push(format!(
            "- {} | {}",
            format_timestamp(entry.start_seconds),
            truncate_chars(&text, MARKER_SNIPPET_CHARS)
        ));
        if markers.len() >= MAX_TIMELINE_MARKERS {
            break;
        }
    }
    markers.join("\n")
}

/// Render the first `max_items` entries as `[TS] text` lines.
pub fn build_full_lines(entries: &[TranscriptEntry], max_items: usize) -> String {
    entries
        .iter()
        .take(max_items)
        .filter_map(|entry| {
            let text = collapse_whitespace(&entry.text);
            if text.is_empty() {
                None
            } else {
                Some(format!("[{}] {}", format_timestamp(entry.start_seconds), text))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
