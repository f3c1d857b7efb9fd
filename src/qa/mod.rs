//! Transcript-grounded question answering.
//!
//! An answer goes through four steps: the question is rewritten into a
//! self-contained query, timestamped lines are retrieved for it, the model
//! answers from those lines only, and the answer is kept only if it cites a
//! timestamp that was actually shown to the model. Missing evidence on either
//! side of the generation call collapses to [`NO_COVERAGE_REPLY`].

use crate::config::Prompts;
use crate::error::Result;
use crate::language::normalize_language;
use crate::llm::TextGenerator;
use crate::retrieval::{ChunkRetriever, LineRetriever};
use crate::session::QaTurn;
use crate::text::{char_len, truncate_chars};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument, warn};

/// Fixed reply for questions the transcript does not support.
pub const NO_COVERAGE_REPLY: &str = "This topic is not covered in the video.";

/// Transcript prefix used for chunk-mode backstop retrieval.
const MAX_TRANSCRIPT_CHARS: usize = 18_000;
const MAX_SUMMARY_CONTEXT_CHARS: usize = 1800;
const RECENT_QA_TURNS: usize = 4;
const RECENT_QA_CHARS: usize = 1400;

const RESOLVE_TEMPERATURE: f32 = 0.0;
const ANSWER_TEMPERATURE: f32 = 0.1;

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?)\]").expect("Invalid regex")
});

/// Bracketed timestamps (`[03:15]`, `[1:02:03]`) appearing in `text`.
pub fn extract_timestamps(text: &str) -> HashSet<String> {
    CITATION
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Render the most recent turns as `Q: ..\nA: ..` blocks within a character budget.
///
/// Turns with an empty side are skipped; the first block that would overflow
/// ends the listing.
pub fn format_recent_qa(history: &[QaTurn]) -> String {
    let start = history.len().saturating_sub(RECENT_QA_TURNS);
    let mut blocks = Vec::new();
    let mut size = 0;

    for turn in &history[start..] {
        let question = turn.question.trim();
        let answer = turn.answer.trim();
        if question.is_empty() || answer.is_empty() {
            continue;
        }
        let block = format!("Q: {}\nA: {}\n", question, answer);
        let block_len = char_len(&block);
        if size + block_len > RECENT_QA_CHARS {
            break;
        }
        size += block_len;
        blocks.push(block);
    }

    blocks.join("\n").trim().to_string()
}

/// Everything a single question is answered from.
#[derive(Debug, Clone, Copy)]
pub struct Question<'a> {
    pub text: &'a str,
    /// Plain transcript text.
    pub transcript: &'a str,
    /// `[TS] text` lines.
    pub full_lines: &'a str,
    pub language: &'a str,
    pub history: &'a [QaTurn],
    /// Most recent summary, used only to resolve references.
    pub summary_context: &'a str,
}

/// Answers questions strictly from transcript evidence.
pub struct QaEngine {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
    line_retriever: LineRetriever,
    chunk_retriever: ChunkRetriever,
}

impl QaEngine {
    /// Create a new engine with default prompts and retrieval budgets.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
            line_retriever: LineRetriever::new(),
            chunk_retriever: ChunkRetriever::new(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a question, or return [`NO_COVERAGE_REPLY`].
    ///
    /// Only the answer generation itself can fail; a failed rewrite falls back
    /// to the original question.
    #[instrument(skip_all, fields(question = %question.text))]
    pub async fn answer(&self, question: Question<'_>) -> Result<String> {
        let language = normalize_language(question.language);
        let transcript = truncate_chars(question.transcript, MAX_TRANSCRIPT_CHARS);
        let recent_qa = format_recent_qa(question.history);
        let summary_context =
            truncate_chars(question.summary_context.trim(), MAX_SUMMARY_CONTEXT_CHARS);

        let resolved = self
            .resolve_question(question.text, &language, &recent_qa, summary_context)
            .await;

        let lines = self.line_retriever.retrieve(&resolved, question.full_lines);
        let context = if lines.excerpt.is_empty() {
            self.chunk_retriever.retrieve(&resolved, transcript)
        } else {
            lines.excerpt.clone()
        };

        if !lines.has_evidence() {
            debug!(
                "No lexical evidence (max_overlap={}, matched={})",
                lines.max_overlap, lines.matched_units
            );
            return Ok(NO_COVERAGE_REPLY.to_string());
        }

        let history_section = if recent_qa.is_empty() {
            String::new()
        } else {
            format!(
                "\nRecent Q&A Context (for follow-up references only):\n{}\n",
                recent_qa
            )
        };
        let summary_section = if summary_context.is_empty() {
            String::new()
        } else {
            format!("\nRecent Video Summary Context:\n{}\n", summary_context)
        };

        let prompt = self.prompts.render_with_custom(
            &self.prompts.qa.answer,
            &[
                ("no_coverage", NO_COVERAGE_REPLY),
                ("language", language.as_str()),
                ("question", question.text),
                ("resolved_question", resolved.as_str()),
                ("history_section", history_section.as_str()),
                ("summary_section", summary_section.as_str()),
                ("context", context.as_str()),
            ],
        );

        let answer = self.generator.generate(&prompt, ANSWER_TEMPERATURE).await?;
        Ok(Self::enforce_citations(answer.trim(), &lines.excerpt))
    }

    /// Rewrite a follow-up into a self-contained question.
    async fn resolve_question(
        &self,
        question: &str,
        language: &str,
        recent_qa: &str,
        summary_context: &str,
    ) -> String {
        if question.trim().is_empty() {
            return question.to_string();
        }

        let prompt = self.prompts.render_with_custom(
            &self.prompts.qa.resolve,
            &[
                ("language", language),
                ("question", question),
                ("recent_qa", if recent_qa.is_empty() { "None" } else { recent_qa }),
                (
                    "summary_context",
                    if summary_context.is_empty() { "None" } else { summary_context },
                ),
            ],
        );

        match self.generator.generate(&prompt, RESOLVE_TEMPERATURE).await {
            Ok(resolved) if !resolved.trim().is_empty() => {
                let resolved = resolved.trim().to_string();
                if resolved != question {
                    debug!("Resolved question: {}", resolved);
                }
                resolved
            }
            Ok(_) => question.to_string(),
            Err(e) => {
                warn!("Question rewrite failed, using original: {}", e);
                question.to_string()
            }
        }
    }

    /// Keep an answer only if it cites at least one timestamp from the line context.
    fn enforce_citations(answer: &str, line_context: &str) -> String {
        if answer.is_empty() || answer == NO_COVERAGE_REPLY {
            return NO_COVERAGE_REPLY.to_string();
        }

        let cited = extract_timestamps(answer);
        if cited.is_empty() {
            debug!("Answer carried no citations");
            return NO_COVERAGE_REPLY.to_string();
        }

        let available = extract_timestamps(line_context);
        if cited.is_disjoint(&available) {
            debug!("Answer cited {:?}, none present in context", cited);
            return NO_COVERAGE_REPLY.to_string();
        }

        answer.to_string()
    }
}
