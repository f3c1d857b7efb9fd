//! Per-user conversation state and its persistence.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::error::Result;
use crate::transcript::{TranscriptData, TranscriptSourceType, UNKNOWN_TITLE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Number of question/answer turns kept per user.
pub const MAX_QA_HISTORY: usize = 8;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaTurn {
    pub question: String,
    pub answer: String,
}

impl QaTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Everything remembered about one user between messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// Output language for replies.
    pub language: String,
    /// Capped plain transcript text; empty until a video is loaded.
    pub transcript: String,
    pub timeline: String,
    pub source_language: String,
    pub video_title: String,
    pub transcript_source_type: TranscriptSourceType,
    pub transcript_truncated: bool,
    /// `[TS] text` lines used for grounded answers.
    pub full_lines: String,
    pub qa_history: Vec<QaTurn>,
    pub last_summary: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(crate::language::DEFAULT_LANGUAGE)
    }
}

impl SessionState {
    /// A fresh session with only a language set.
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            transcript: String::new(),
            timeline: String::new(),
            source_language: "Unknown".to_string(),
            video_title: UNKNOWN_TITLE.to_string(),
            transcript_source_type: TranscriptSourceType::Unknown,
            transcript_truncated: false,
            full_lines: String::new(),
            qa_history: Vec::new(),
            last_summary: String::new(),
        }
    }

    /// Whether a video has been loaded.
    pub fn has_transcript(&self) -> bool {
        !self.transcript.is_empty()
    }

    /// Replace every transcript-derived field and forget the previous video's
    /// history and summary.
    pub fn load_video(&mut self, data: TranscriptData) {
        self.transcript = data.text;
        self.timeline = data.timeline;
        self.source_language = data.source_language;
        self.video_title = data.video_title;
        self.transcript_source_type = data.source_type;
        self.transcript_truncated = data.is_truncated;
        self.full_lines = data.full_lines;
        self.qa_history.clear();
        self.last_summary.clear();
    }

    /// Append an answered question, keeping only the most recent turns.
    pub fn record_answer(&mut self, question: &str, answer: &str) {
        self.qa_history.push(QaTurn::new(question, answer));
        if self.qa_history.len() > MAX_QA_HISTORY {
            let excess = self.qa_history.len() - MAX_QA_HISTORY;
            self.qa_history.drain(..excess);
        }
    }
}

/// Persistence for session state, keyed by user identifier.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a user's session, or None if the user has never been seen.
    async fn load(&self, user_id: &str) -> Result<Option<SessionState>>;

    /// Store a user's session, replacing any previous state.
    async fn save(&self, user_id: &str, state: &SessionState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> TranscriptData {
        TranscriptData {
            text: "hello world".to_string(),
            timeline: "- 00:00 | hello world".to_string(),
            full_lines: "[00:00] hello world".to_string(),
            source_language: "en".to_string(),
            video_title: "Demo".to_string(),
            source_type: TranscriptSourceType::YoutubeCaptions,
            is_truncated: true,
        }
    }

    #[test]
    fn test_new_session() {
        let state = SessionState::new("Tamil");
        assert_eq!(state.language, "Tamil");
        assert!(!state.has_transcript());
        assert_eq!(state.video_title, "Unknown Title");
    }

    #[test]
    fn test_load_video_resets_history() {
        let mut state = SessionState::default();
        state.record_answer("q", "a");
        state.last_summary = "old summary".to_string();

        state.load_video(sample_data());
        assert!(state.has_transcript());
        assert!(state.transcript_truncated);
        assert_eq!(state.video_title, "Demo");
        assert!(state.qa_history.is_empty());
        assert!(state.last_summary.is_empty());
        assert_eq!(state.language, "English");
    }

    #[test]
    fn test_history_keeps_last_eight() {
        let mut state = SessionState::default();
        for i in 0..11 {
            state.record_answer(&format!("q{i}"), &format!("a{i}"));
        }
        assert_eq!(state.qa_history.len(), MAX_QA_HISTORY);
        assert_eq!(state.qa_history[0].question, "q3");
        assert_eq!(state.qa_history[7].answer, "a10");
    }

    #[test]
    fn test_deserialize_partial_state() {
        let state: SessionState = serde_json::from_str(r#"{"language": "Hindi"}"#).unwrap();
        assert_eq!(state.language, "Hindi");
        assert!(state.qa_history.is_empty());
        assert_eq!(state.transcript_source_type, TranscriptSourceType::Unknown);
    }
}
