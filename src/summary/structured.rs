//! The structured summary: fixed sections, validated and repaired.

use super::{Compressor, VideoContext};
use crate::config::Prompts;
use crate::error::Result;
use crate::language::normalize_language;
use crate::llm::TextGenerator;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, instrument, warn};

const REQUIRED_HEADERS: [&str; 4] = [
    "Video Title:",
    "5 Key Points:",
    "Important Timestamps:",
    "Core Takeaway:",
];
const TIMESTAMPS_HEADER: &str = "Important Timestamps:";
const MIN_KEY_POINTS: usize = 3;

const NO_EVIDENCE_POINT: &str = "Not enough clear evidence in transcript.";
const NO_TIMESTAMP_BULLET: &str = "Topic - Approx Timestamp not clearly available";
const NO_TAKEAWAY: &str = "Transcript was parsed, but summary details are limited.";

const DRAFT_TEMPERATURE: f32 = 0.2;
const REPAIR_TEMPERATURE: f32 = 0.0;

static KEY_POINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[1-5][.)]\s+").expect("Invalid regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*-\s+.+").expect("Invalid regex"));
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?\b").expect("Invalid regex")
});

/// Whether `text` has the four section headers, at least three numbered key
/// points and a bullet after the timestamps header.
pub fn looks_structured_summary(text: &str) -> bool {
    if text.is_empty() || !REQUIRED_HEADERS.iter().all(|h| text.contains(h)) {
        return false;
    }

    let key_points = KEY_POINT.find_iter(text).count();
    let after_timestamps = text
        .split_once(TIMESTAMPS_HEADER)
        .map(|(_, rest)| rest)
        .unwrap_or(text);

    key_points >= MIN_KEY_POINTS && BULLET.is_match(after_timestamps)
}

/// Build a valid structured summary from a draft without calling the model.
///
/// Long lines become key points, lines with a clock time become timestamp
/// bullets and the first line is the takeaway; gaps are filled with fixed
/// placeholders.
pub fn fallback_structured_summary(draft: &str, video_title: &str) -> String {
    let lines: Vec<&str> = draft
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut key_points: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.chars().count() > 20)
        .take(5)
        .collect();
    key_points.resize(5, NO_EVIDENCE_POINT);

    let mut timestamps: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| TIME_TOKEN.is_match(l))
        .take(3)
        .collect();
    if timestamps.is_empty() {
        timestamps.push(NO_TIMESTAMP_BULLET);
    }

    let takeaway = lines.first().copied().unwrap_or(NO_TAKEAWAY);

    let points: String = key_points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}\n", i + 1, p))
        .collect();
    let bullets = timestamps
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Video Title:\n{}\n5 Key Points:\n{}Important Timestamps:\n{}\nCore Takeaway:\n{}",
        video_title, points, bullets, takeaway
    )
}

/// Generates the structured summary, guaranteeing its layout.
pub struct SummaryGenerator {
    generator: Arc<dyn TextGenerator>,
    compressor: Compressor,
    prompts: Prompts,
}

impl SummaryGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            compressor: Compressor::new(generator.clone(), Prompts::default()),
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.compressor = Compressor::new(self.generator.clone(), prompts.clone());
        self.prompts = prompts;
        self
    }

    /// Draft a summary; if its layout is off, ask for a reformat, and if that
    /// is still off, fall back to [`fallback_structured_summary`].
    ///
    /// Fails only when compression or the draft call fails.
    #[instrument(skip_all, fields(title = %video.title))]
    pub async fn generate(&self, video: &VideoContext<'_>) -> Result<String> {
        let language = normalize_language(video.language);
        let timeline = video.timeline_for_prompt();
        let compact = self.compressor.compress(video).await?;

        let prompt = self.prompts.render_with_custom(
            &self.prompts.summary.draft,
            &[
                ("language", language.as_str()),
                ("source_language", video.source_language),
                ("title", video.title),
                ("timeline", timeline),
                ("transcript", compact.as_str()),
            ],
        );
        let draft = self.generator.generate(&prompt, DRAFT_TEMPERATURE).await?;
        let draft = draft.trim();
        if looks_structured_summary(draft) {
            return Ok(draft.to_string());
        }

        info!("Summary draft is not structured, requesting reformat");
        self.repair(draft, &language, video.title, timeline).await
    }

    async fn repair(&self, draft: &str, language: &str, title: &str, timeline: &str) -> Result<String> {
        let prompt = self.prompts.render_with_custom(
            &self.prompts.summary.repair,
            &[
                ("language", language),
                ("title", title),
                ("timeline", timeline),
                ("draft", draft),
            ],
        );

        match self.generator.generate(&prompt, REPAIR_TEMPERATURE).await {
            Ok(repaired) if looks_structured_summary(repaired.trim()) => {
                Ok(repaired.trim().to_string())
            }
            Ok(_) => {
                debug!("Reformat still unstructured, using fallback layout");
                Ok(fallback_structured_summary(draft, title))
            }
            Err(e) => {
                warn!("Summary reformat failed, using fallback layout: {}", e);
                Ok(fallback_structured_summary(draft, title))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    const VALID: &str = "Video Title:\nGrowth Talk\n5 Key Points:\n1. One\n2. Two\n3. Three\n4. Four\n5. Five\nImportant Timestamps:\n- Pricing - 03:15\nCore Takeaway:\nShip it.";

    fn key_point_count(summary: &str) -> usize {
        KEY_POINT.find_iter(summary).count()
    }

    #[test]
    fn test_accepts_valid_summary() {
        assert!(looks_structured_summary(VALID));
        assert!(looks_structured_summary(
            "Video Title:\nX\n5 Key Points:\n1) a\n2) b\n3) c\nImportant Timestamps:\n  - x\nCore Takeaway:\ny"
        ));
    }

    #[test]
    fn test_rejects_missing_header() {
        for header in REQUIRED_HEADERS {
            let broken = VALID.replace(header, "Something:");
            assert!(!looks_structured_summary(&broken), "missing {header}");
        }
        assert!(!looks_structured_summary(""));
    }

    #[test]
    fn test_rejects_too_few_key_points() {
        let broken = VALID
            .replace("3. Three\n", "")
            .replace("4. Four\n", "")
            .replace("5. Five\n", "");
        assert!(!looks_structured_summary(&broken));
    }

    #[test]
    fn test_rejects_missing_bullet() {
        let broken = VALID.replace("- Pricing - 03:15", "Pricing at 03:15");
        assert!(!looks_structured_summary(&broken));

        // A bullet before the timestamps header does not count.
        let moved = "Video Title:\n- X\n5 Key Points:\n1. a\n2. b\n3. c\nImportant Timestamps:\nnone\nCore Takeaway:\ny";
        assert!(!looks_structured_summary(moved));
    }

    #[test]
    fn test_fallback_from_empty_draft() {
        let summary = fallback_structured_summary("", "Unknown Title");
        assert!(looks_structured_summary(&summary));
        assert_eq!(key_point_count(&summary), 5);
        assert!(summary.contains("1. Not enough clear evidence in transcript."));
        assert!(summary.contains("- Topic - Approx Timestamp not clearly available"));
        assert!(summary.ends_with("Core Takeaway:\nTranscript was parsed, but summary details are limited."));
    }

    #[test]
    fn test_fallback_from_one_line_draft() {
        let summary = fallback_structured_summary("The talk covers pricing at 03:15 in depth", "Demo");
        assert!(looks_structured_summary(&summary));
        assert_eq!(key_point_count(&summary), 5);
        assert!(summary.starts_with("Video Title:\nDemo\n"));
        assert!(summary.contains("1. The talk covers pricing at 03:15 in depth\n2. Not enough"));
        assert!(summary.contains("- The talk covers pricing at 03:15 in depth"));
        assert!(summary.ends_with("Core Takeaway:\nThe talk covers pricing at 03:15 in depth"));
    }

    #[test]
    fn test_fallback_from_ten_line_draft() {
        let draft: String = (1..=10)
            .map(|i| format!("Line number {i} with enough detail, at 0{i}:00\n"))
            .collect();
        let summary = fallback_structured_summary(&draft, "Demo");
        assert!(looks_structured_summary(&summary));
        assert_eq!(key_point_count(&summary), 5);
        assert!(summary.contains("5. Line number 5 with enough detail"));
        assert!(!summary.contains("Line number 6 with"));
        let bullets = summary.lines().filter(|l| l.starts_with("- ")).count();
        assert_eq!(bullets, 3);
    }

    #[tokio::test]
    async fn test_valid_draft_needs_no_repair() {
        let generator = Arc::new(ScriptedGenerator::new().reply(format!("\n{VALID}\n")));
        let summarizer = SummaryGenerator::new(generator.clone());

        let summary = summarizer
            .generate(&VideoContext::new("short transcript"))
            .await
            .unwrap();
        assert_eq!(summary, VALID);
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.calls()[0].temperature, 0.2);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_repaired() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply("A loose paragraph about growth.")
                .reply(VALID),
        );
        let summarizer = SummaryGenerator::new(generator.clone());

        let mut video = VideoContext::new("short transcript");
        video.timeline = "- 00:00 | intro";
        let summary = summarizer.generate(&video).await.unwrap();
        assert_eq!(summary, VALID);

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].temperature, 0.0);
        assert!(calls[1].prompt.contains("Draft Summary:\nA loose paragraph about growth."));
        assert!(calls[1].prompt.contains("Timeline Markers:\n- 00:00 | intro"));
    }

    #[tokio::test]
    async fn test_failed_repair_uses_fallback() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply("Growth came mostly from referrals in 2023.\nPricing moved at 12:30 to usage based.")
                .reply("still not structured"),
        );
        let summarizer = SummaryGenerator::new(generator.clone());

        let mut video = VideoContext::new("short transcript");
        video.title = "Growth Talk";
        let summary = summarizer.generate(&video).await.unwrap();
        assert!(looks_structured_summary(&summary));
        assert!(summary.starts_with("Video Title:\nGrowth Talk\n"));
        assert!(summary.contains("- Pricing moved at 12:30 to usage based."));
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_repair_error_uses_fallback() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply("unstructured")
                .fail("connection reset"),
        );
        let summarizer = SummaryGenerator::new(generator);

        let summary = summarizer
            .generate(&VideoContext::new("short transcript"))
            .await
            .unwrap();
        assert!(looks_structured_summary(&summary));
    }

    #[tokio::test]
    async fn test_draft_error_propagates() {
        let generator = Arc::new(ScriptedGenerator::new().fail("insufficient_quota"));
        let summarizer = SummaryGenerator::new(generator);

        let err = summarizer
            .generate(&VideoContext::new("short transcript"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient_quota"));
    }
}
