//! Free-form reports: deep dive, action points, research brief.
//!
//! These share the compress-then-prompt flow of the summary but have no
//! layout guarantee; whatever the model returns is the report.

use super::{Compressor, VideoContext};
use crate::config::Prompts;
use crate::error::Result;
use crate::language::normalize_language;
use crate::llm::TextGenerator;
use std::sync::Arc;
use tracing::instrument;

const REPORT_TEMPERATURE: f32 = 0.2;

/// Kinds of report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    DeepDive,
    ActionPoints,
    ResearchBrief,
}

impl ReportKind {
    fn template(self, prompts: &Prompts) -> &str {
        match self {
            ReportKind::DeepDive => &prompts.reports.deep_dive,
            ReportKind::ActionPoints => &prompts.reports.action_points,
            ReportKind::ResearchBrief => &prompts.reports.research_brief,
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::DeepDive => write!(f, "deep dive"),
            ReportKind::ActionPoints => write!(f, "action points"),
            ReportKind::ResearchBrief => write!(f, "research brief"),
        }
    }
}

/// Generates reports from a transcript.
pub struct ReportGenerator {
    generator: Arc<dyn TextGenerator>,
    compressor: Compressor,
    prompts: Prompts,
}

impl ReportGenerator {
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

    /// Generate one report. Generation failures propagate.
    #[instrument(skip(self, video), fields(title = %video.title))]
    pub async fn generate(&self, kind: ReportKind, video: &VideoContext<'_>) -> Result<String> {
        let language = normalize_language(video.language);
        let compact = self.compressor.compress(video).await?;

        let prompt = self.prompts.render_with_custom(
            kind.template(&self.prompts),
            &[
                ("language", language.as_str()),
                ("source_language", video.source_language),
                ("title", video.title),
                ("timeline", video.timeline_for_prompt()),
                ("transcript", compact.as_str()),
            ],
        );

        let report = self.generator.generate(&prompt, REPORT_TEMPERATURE).await?;
        Ok(report.trim().to_string())
    }
}
