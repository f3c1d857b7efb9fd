//! Prompt templates for vidbrief.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub summary: SummaryPrompts,
    /// Deep-dive, action-point and research-brief reports.
    pub reports: ReportPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    /// Rewrites follow-up questions into self-contained ones.
    pub resolve: String,
    pub answer: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            resolve: r#"You rewrite user follow-up questions for transcript search.

Rules:
- If question is already clear, return it unchanged.
- If question uses references (that/this/it/second point), rewrite into a self-contained question.
- Use recent context only to resolve references, not to add new facts.
- Return exactly one line in {{language}}.

Question:
{{question}}

Recent Q&A:
{{recent_qa}}

Recent Summary:
{{summary_context}}"#
                .to_string(),

            answer: r#"You are a strict multilingual assistant.

Rules:
- Answer only from information grounded in the provided transcript excerpts.
- You may use Recent Q&A Context and Recent Video Summary Context only to resolve references like "that", "this point", or pronouns.
- Do not invent facts not supported by transcript evidence.
- If there is partial evidence, answer with best available evidence and mention uncertainty briefly.
- If answer is not present at all, respond exactly:
"{{no_coverage}}"
- Include 1-2 inline evidence citations using timestamps from transcript lines, e.g. [03:15].
- Keep answer concise and factual.
- Respond strictly in {{language}}.

Original Question:
{{question}}

Resolved Question:
{{resolved_question}}
{{history_section}}{{summary_section}}
Relevant Transcript Excerpts:
{{context}}"#
                .to_string(),
        }
    }
}

/// Prompts for long-input compression and the structured summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Per-chunk notes for long transcripts.
    pub compress: String,
    pub draft: String,
    /// Reformats a draft that failed structural validation.
    pub repair: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            compress: r#"You are a transcript compression assistant.
Respond strictly in {{language}}.
Use only the transcript chunk below.

Video title: {{title}}
Chunk: {{index}}/{{total}}

Return concise notes:
- 6 key facts from this chunk
- 2 notable timestamps/segments if available
- 2 important claims or examples

Transcript Chunk:
{{chunk}}"#
                .to_string(),

            draft: r#"You are a multilingual video-analysis assistant.

Rules:
- Use only the transcript and timeline markers provided.
- Do not invent claims, names, entities, or timestamps.
- If timing is uncertain, mark it as "approx".
- Respond strictly in {{language}}.

Detected transcript language: {{source_language}}
Video title: {{title}}

Output format (exact sections):
Video Title:
5 Key Points:
1.
2.
3.
4.
5.
Important Timestamps:
- Topic - Approx Timestamp
Core Takeaway:

Timeline Markers:
{{timeline}}

Transcript:
{{transcript}}"#
                .to_string(),

            repair: r#"Reformat the draft summary into the exact structure below.
Respond strictly in {{language}}.
Use only draft and timeline markers. Do not invent facts.

Required exact sections and order:
Video Title:
5 Key Points:
1.
2.
3.
4.
5.
Important Timestamps:
- Topic - Approx Timestamp
Core Takeaway:

Video title to use:
{{title}}

Timeline Markers:
{{timeline}}

Draft Summary:
{{draft}}"#
                .to_string(),
        }
    }
}

/// Prompts for the free-form report generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPrompts {
    pub deep_dive: String,
    pub action_points: String,
    pub research_brief: String,
}

impl Default for ReportPrompts {
    fn default() -> Self {
        Self {
            deep_dive: r#"You are a business research assistant.
Respond strictly in {{language}}.
Use only the transcript below. Do not hallucinate.

Create a deep-dive analysis for this video:
Title: {{title}}

Format:
1) Executive Context (3-4 lines)
2) Strategic Insights (5 bullets)
3) Risks / Limitations (3 bullets)
4) Practical Recommendations (5 bullets)
5) One-line Bottom Line

Transcript:
{{transcript}}"#
                .to_string(),

            action_points: r#"You are an execution-focused assistant.
Respond strictly in {{language}}.
Use only the transcript below.

Create concrete action points from this video:
Title: {{title}}

Format:
- Action Item
- Owner Suggestion
- Priority (High/Medium/Low)
- Expected Outcome

Return 8 action items max.

Transcript:
{{transcript}}"#
                .to_string(),

            research_brief: r#"You are a personal AI research assistant for YouTube videos.
Respond strictly in {{language}}.
Use only the provided transcript evidence.

Detected transcript language: {{source_language}}
Video title: {{title}}

Output format:
1) Executive Summary (5-7 lines)
2) Core Insights (8 bullets)
3) Evidence Snapshots (5 bullets with short quote/paraphrase + approx timestamp)
4) Open Questions Worth Investigating (5 bullets)
5) Practical Actions (6 bullets)
6) TL;DR (2 lines)

Timeline Markers:
{{timeline}}

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let reports_path = custom_path.join("reports.toml");
            if reports_path.exists() {
                let content = std::fs::read_to_string(&reports_path)?;
                prompts.reports = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in one pass over the template, so `{{...}}`
    /// text inside a substituted value is kept as-is. Unknown names stay untouched.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.to_string(), value.to_string());
        }
        Self::render(template, &merged)
    }
}
