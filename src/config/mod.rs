//! Configuration module for vidbrief.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QaPrompts, ReportPrompts, SummaryPrompts};
pub use settings::{
    GeneralSettings, LlmSettings, PromptSettings, SessionSettings, Settings,
    TranscriptSettings, OPENROUTER_BASE_URL,
};
