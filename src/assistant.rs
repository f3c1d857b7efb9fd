//! Message routing for the conversational assistant.
//!
//! One incoming message produces exactly one reply. The user's session is
//! loaded, the message is routed (commands, links, language requests,
//! questions), and the possibly-changed session is saved back.

use crate::config::{Prompts, Settings};
use crate::error::{FailureKind, Result, VidbriefError};
use crate::language::{example_languages, extract_requested_language, normalize_language};
use crate::llm::{OpenAIGenerator, TextGenerator};
use crate::openai::create_client;
use crate::qa::{QaEngine, Question};
use crate::session::{SessionState, SessionStore, SqliteSessionStore};
use crate::summary::{ReportGenerator, ReportKind, SummaryGenerator, VideoContext};
use crate::text::truncate_chars;
use crate::transcript::{
    extract_video_id, mentions_video_link, TranscriptFetcher, TranscriptProvider,
};
use crate::voice::{
    voice_failure_reply, AudioClip, OpenAISpeechToText, OpenAITextToSpeech, Speaker,
    SpeechToText, EMPTY_VOICE_REPLY, VOICE_INPUT_DISABLED,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const LINK_FIRST: &str = "Please send a YouTube link first.";
const TRUNCATION_NOTICE: &str =
    "Transcript is very long. Using a capped transcript window for reliable processing.\n\n";
/// Failure reasons shown to users are cut to this many characters.
const MAX_REASON_CHARS: usize = 700;

const COMMANDS_NEEDING_VIDEO: &[&str] = &["/summary", "/research", "/deepdive", "/actionpoints"];
const INSIGHT_PHRASES: &[&str] = &["research brief", "key insights", "extract insights"];

/// Generating operations, for failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Summary,
    Report(ReportKind),
    Answer,
}

impl Operation {
    /// Prefix used in quota and credential failure replies.
    fn label(self) -> &'static str {
        match self {
            Operation::Summary => "Summary",
            Operation::Report(ReportKind::ResearchBrief) => "Research brief",
            Operation::Report(ReportKind::DeepDive) => "Deepdive",
            Operation::Report(ReportKind::ActionPoints) => "Action points",
            Operation::Answer => "Q&A",
        }
    }

    fn generic_failure(self) -> &'static str {
        match self {
            Operation::Summary => "Summary generation failed.",
            Operation::Report(ReportKind::ResearchBrief) => "Research brief generation failed.",
            Operation::Report(ReportKind::DeepDive) => "Deepdive generation failed.",
            Operation::Report(ReportKind::ActionPoints) => "Action points generation failed.",
            Operation::Answer => "Could not answer the question right now.",
        }
    }

    /// User-facing reply for a failed generation.
    pub fn failure_reply(self, err: &VidbriefError) -> String {
        warn!("{} failed: {}", self.label(), err);
        match err.failure_kind() {
            FailureKind::QuotaExceeded => format!("{} failed: API quota exceeded.", self.label()),
            FailureKind::InvalidCredentials => {
                format!("{} failed: invalid API key/provider setup.", self.label())
            }
            FailureKind::Generic => self.generic_failure().to_string(),
        }
    }
}

/// Welcome text for `/start` and `/help`.
pub fn welcome_text(voice_input: bool) -> String {
    let voice_line = if voice_input {
        "6) Send voice message for speech-to-text"
    } else {
        "6) Voice input is disabled for current API provider. Please send text input."
    };
    format!(
        "Welcome to Global YouTube AI Assistant!\n\n\
         1) Send a YouTube link\n\
         2) Ask questions about that video\n\
         3) Change language: 'summarize in Arabic' or /setlang Arabic\n\
         4) Use /fulltranscript to read full line-by-line transcript\n\
         5) Use /research for deep research brief, /deepdive or /actionpoints for more\n\
         {}\n\n\
         Examples: {}",
        voice_line,
        example_languages().join(", ")
    )
}

fn languages_text() -> String {
    format!(
        "This bot supports any language name/script as output.\n\
         Use: /setlang <language>\n\
         Examples: {}",
        example_languages().join(", ")
    )
}

fn video_context(state: &SessionState) -> VideoContext<'_> {
    VideoContext {
        transcript: &state.transcript,
        language: &state.language,
        timeline: &state.timeline,
        source_language: &state.source_language,
        title: &state.video_title,
    }
}

/// Outcome of a voice message.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceTurn {
    /// What the user said, when transcription produced text.
    pub heard: Option<String>,
    pub reply: String,
}

/// The conversational assistant.
pub struct Assistant {
    transcripts: Arc<dyn TranscriptProvider>,
    sessions: Arc<dyn SessionStore>,
    qa: QaEngine,
    summaries: SummaryGenerator,
    reports: ReportGenerator,
    default_language: String,
    speech_to_text: Option<Arc<dyn SpeechToText>>,
    speaker: Option<Speaker>,
}

impl Assistant {
    /// Create an assistant with default prompts.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        transcripts: Arc<dyn TranscriptProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            transcripts,
            sessions,
            qa: QaEngine::new(generator.clone()),
            summaries: SummaryGenerator::new(generator.clone()),
            reports: ReportGenerator::new(generator),
            default_language: crate::language::DEFAULT_LANGUAGE.to_string(),
            speech_to_text: None,
            speaker: None,
        }
    }

    /// Wire up the production assistant: OpenAI-compatible generation, captions
    /// with audio fallback, and SQLite-backed sessions.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let provider = create_client(settings)?;
        let model = settings.chat_model(provider.base_url.as_deref());
        info!(
            "Using model {} via {}",
            model,
            provider.base_url.as_deref().unwrap_or("api.openai.com")
        );

        let generator = Arc::new(OpenAIGenerator::new(provider.client.clone(), &model));
        let transcripts = Arc::new(TranscriptFetcher::from_settings(settings, Some(&provider)));
        let sessions = Arc::new(SqliteSessionStore::new(&settings.sqlite_path())?);

        let mut assistant = Self::new(generator, transcripts, sessions)
            .with_prompts(prompts)
            .with_default_language(&settings.session.default_language);

        let base_url = provider.base_url.as_deref();
        if settings.voice_input_enabled(base_url) {
            assistant = assistant.with_speech_to_text(Arc::new(OpenAISpeechToText::new(
                provider.client.clone(),
                &settings.stt_model(),
            )));
        }
        if settings.voice_output_enabled(base_url) {
            assistant = assistant.with_speaker(Speaker::new(Arc::new(OpenAITextToSpeech::new(
                provider.client.clone(),
                &settings.tts_model(),
            ))));
        }
        Ok(assistant)
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.qa = self.qa.with_prompts(prompts.clone());
        self.summaries = self.summaries.with_prompts(prompts.clone());
        self.reports = self.reports.with_prompts(prompts);
        self
    }

    /// Accept voice messages through this transcriber.
    pub fn with_speech_to_text(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.speech_to_text = Some(stt);
        self
    }

    /// Speak replies through this speaker.
    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// Whether replies can be spoken.
    pub fn speaks(&self) -> bool {
        self.speaker.is_some()
    }

    /// Spoken version of a reply, when voice output is on and synthesis works.
    pub async fn speak(&self, reply: &str) -> Option<Vec<u8>> {
        match &self.speaker {
            Some(speaker) => speaker.speak(reply).await,
            None => None,
        }
    }

    /// Handle a voice message: transcribe it, then treat the text as a message.
    #[instrument(skip(self, clip), fields(file = %clip.file_name))]
    pub async fn handle_voice(&self, user_id: &str, clip: AudioClip) -> Result<VoiceTurn> {
        let Some(stt) = &self.speech_to_text else {
            return Ok(VoiceTurn {
                heard: None,
                reply: VOICE_INPUT_DISABLED.to_string(),
            });
        };

        let heard = match stt.transcribe(clip).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                return Ok(VoiceTurn {
                    heard: None,
                    reply: voice_failure_reply(&e),
                })
            }
        };
        if heard.is_empty() {
            return Ok(VoiceTurn {
                heard: None,
                reply: EMPTY_VOICE_REPLY.to_string(),
            });
        }

        info!("Voice message for {} transcribed ({} chars)", user_id, heard.chars().count());
        let reply = self.handle_message(user_id, &heard).await?;
        Ok(VoiceTurn {
            heard: Some(heard),
            reply,
        })
    }

    /// Set the language new users start with.
    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = normalize_language(language);
        self
    }

    /// Handle one message from a user and persist their session.
    ///
    /// Only session-store failures are errors; everything else becomes a reply.
    #[instrument(skip(self, text))]
    pub async fn handle_message(&self, user_id: &str, text: &str) -> Result<String> {
        let mut state = self
            .sessions
            .load(user_id)
            .await?
            .unwrap_or_else(|| SessionState::new(&self.default_language));

        let reply = self.respond(&mut state, text).await;
        self.sessions.save(user_id, &state).await?;
        Ok(reply)
    }

    /// Route a message against an already-loaded session.
    pub async fn respond(&self, state: &mut SessionState, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return "Please send text.".to_string();
        }

        let requested = extract_requested_language(text);
        if let Some(language) = &requested {
            state.language = normalize_language(language);
        }
        let lowered = text.to_lowercase();

        if lowered == "/start" || lowered == "/help" {
            return welcome_text(self.speech_to_text.is_some());
        }
        if lowered == "/languages" {
            return languages_text();
        }

        if lowered.starts_with("/setlang") {
            return match text.split_once(char::is_whitespace) {
                Some((_, language)) if !language.trim().is_empty() => {
                    state.language = normalize_language(language);
                    format!("Language set to {}.", state.language)
                }
                _ => "Usage: /setlang <language>".to_string(),
            };
        }

        if lowered.starts_with("/fulltranscript") {
            let lines = state.full_lines.trim();
            return if lines.is_empty() {
                LINK_FIRST.to_string()
            } else {
                lines.to_string()
            };
        }

        let command = COMMANDS_NEEDING_VIDEO
            .iter()
            .find(|c| lowered.starts_with(*c))
            .copied();
        if command.is_some() && !state.has_transcript() {
            return LINK_FIRST.to_string();
        }

        if mentions_video_link(text) {
            return self.load_video(state, text).await;
        }

        match command {
            Some("/summary") => return self.summarize(state).await,
            Some("/research") => return self.report(state, ReportKind::ResearchBrief).await,
            Some("/deepdive") => return self.report(state, ReportKind::DeepDive).await,
            Some("/actionpoints") => return self.report(state, ReportKind::ActionPoints).await,
            _ => {}
        }

        if requested.is_some() && (lowered.contains("summarize") || lowered.contains("summary")) {
            if !state.has_transcript() {
                return format!("Language set to {}. {}", state.language, LINK_FIRST);
            }
            return self.summarize(state).await;
        }

        if requested.is_some() {
            let language = state.language.to_lowercase();
            if lowered == format!("in {}", language) || lowered == format!("language {}", language) {
                return format!("Language set to {}.", state.language);
            }
        }

        if state.has_transcript() {
            if INSIGHT_PHRASES.iter().any(|p| lowered.contains(p)) {
                return self.report(state, ReportKind::ResearchBrief).await;
            }
            return self.answer(state, text).await;
        }

        LINK_FIRST.to_string()
    }

    /// Fetch a linked video's transcript, replace the session's video and summarize it.
    async fn load_video(&self, state: &mut SessionState, text: &str) -> String {
        let Some(video_id) = extract_video_id(text) else {
            return "Invalid YouTube URL.".to_string();
        };

        let data = match self.transcripts.get_transcript_data(&video_id).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Transcript unavailable for {}: {}", video_id, e);
                let reason = e.to_string();
                return format!(
                    "Could not fetch transcript for this video.\n\
                     Try another public video, or install yt-dlp for audio fallback.\n\
                     Reason: {}",
                    truncate_chars(&reason, MAX_REASON_CHARS)
                );
            }
        };

        info!("Loaded video {} ({})", video_id, data.video_title);
        state.load_video(data);

        let result = self.summaries.generate(&video_context(state)).await;
        match result {
            Ok(summary) => {
                state.last_summary = summary.clone();
                if state.transcript_truncated {
                    format!("{}{}", TRUNCATION_NOTICE, summary)
                } else {
                    summary
                }
            }
            Err(e) if e.failure_kind() == FailureKind::QuotaExceeded => {
                warn!("Summary failed: {}", e);
                "Transcript fetched successfully, but summary failed: API quota exceeded."
                    .to_string()
            }
            Err(e) => Operation::Summary.failure_reply(&e),
        }
    }

    async fn summarize(&self, state: &mut SessionState) -> String {
        let result = self.summaries.generate(&video_context(state)).await;
        match result {
            Ok(summary) => {
                state.last_summary = summary.clone();
                summary
            }
            Err(e) => Operation::Summary.failure_reply(&e),
        }
    }

    async fn report(&self, state: &SessionState, kind: ReportKind) -> String {
        let operation = Operation::Report(kind);
        match self.reports.generate(kind, &video_context(state)).await {
            Ok(report) if report.is_empty() => {
                warn!("Empty {} from provider", kind);
                operation.generic_failure().to_string()
            }
            Ok(report) => report,
            Err(e) => operation.failure_reply(&e),
        }
    }

    async fn answer(&self, state: &mut SessionState, text: &str) -> String {
        let question = Question {
            text,
            transcript: &state.transcript,
            full_lines: &state.full_lines,
            language: &state.language,
            history: &state.qa_history,
            summary_context: &state.last_summary,
        };

        let result = self.qa.answer(question).await;
        match result {
            Ok(answer) => {
                state.record_answer(text, &answer);
                answer
            }
            Err(e) => Operation::Answer.failure_reply(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;
    use crate::qa::NO_COVERAGE_REPLY;
    use crate::session::MemorySessionStore;
    use crate::transcript::{TranscriptData, TranscriptSourceType};
    use async_trait::async_trait;

    const LINK: &str = "https://youtu.be/dQw4w9WgXcQ";
    const SUMMARY: &str = "Video Title:\nGrowth Talk\n5 Key Points:\n1. Freemium\n2. Referrals\n3. Hiring\n4. Churn\n5. Focus\nImportant Timestamps:\n- Pricing - 03:15\nCore Takeaway:\nStart free.";

    struct StubTranscripts {
        truncated: bool,
        fail: Option<String>,
    }

    #[async_trait]
    impl TranscriptProvider for StubTranscripts {
        async fn get_transcript_data(&self, _video_id: &str) -> Result<TranscriptData> {
            if let Some(reason) = &self.fail {
                return Err(VidbriefError::TranscriptUnavailable(reason.clone()));
            }
            Ok(TranscriptData {
                text: "The pricing strategy uses a freemium model. Growth came from referrals."
                    .to_string(),
                timeline: "- 03:15 | The pricing strategy uses a freemium model".to_string(),
                full_lines: "[03:15] The pricing strategy uses a freemium model\n\
                             [04:00] Growth came from referrals"
                    .to_string(),
                source_language: "en".to_string(),
                video_title: "Growth Talk".to_string(),
                source_type: TranscriptSourceType::YoutubeCaptions,
                is_truncated: self.truncated,
            })
        }
    }

    fn assistant_with(
        generator: Arc<ScriptedGenerator>,
        transcripts: StubTranscripts,
    ) -> (Assistant, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let assistant = Assistant::new(generator, Arc::new(transcripts), store.clone());
        (assistant, store)
    }

    fn working_transcripts() -> StubTranscripts {
        StubTranscripts {
            truncated: false,
            fail: None,
        }
    }

    #[tokio::test]
    async fn test_empty_message() {
        let (assistant, _) = assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());
        assert_eq!(assistant.handle_message("u", "   ").await.unwrap(), "Please send text.");
    }

    #[tokio::test]
    async fn test_welcome_and_languages() {
        let (assistant, _) = assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());
        let welcome = assistant.handle_message("u", "/start").await.unwrap();
        assert!(welcome.starts_with("Welcome to Global YouTube AI Assistant!"));
        assert!(welcome.contains("Kannada"));

        let languages = assistant.handle_message("u", "/languages").await.unwrap();
        assert!(languages.contains("Use: /setlang <language>"));
    }

    #[tokio::test]
    async fn test_setlang() {
        let (assistant, store) =
            assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());

        assert_eq!(
            assistant.handle_message("u", "/setlang").await.unwrap(),
            "Usage: /setlang <language>"
        );
        assert_eq!(
            assistant.handle_message("u", "/setlang kanada").await.unwrap(),
            "Language set to Kannada."
        );
        let state = store.load("u").await.unwrap().unwrap();
        assert_eq!(state.language, "Kannada");
    }

    #[tokio::test]
    async fn test_needs_video_first() {
        let generator = Arc::new(ScriptedGenerator::new());
        let (assistant, _) = assistant_with(generator.clone(), working_transcripts());

        for message in ["/summary", "/deepdive", "/fulltranscript", "What about pricing?"] {
            assert_eq!(assistant.handle_message("u", message).await.unwrap(), LINK_FIRST);
        }
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_language_requests_without_video() {
        let (assistant, store) =
            assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());

        assert_eq!(
            assistant.handle_message("u", "summarize in Hindi").await.unwrap(),
            "Language set to Hindi. Please send a YouTube link first."
        );
        assert_eq!(
            assistant.handle_message("u", "in Tamil").await.unwrap(),
            "Language set to Tamil."
        );
        assert_eq!(store.load("u").await.unwrap().unwrap().language, "Tamil");
    }

    #[tokio::test]
    async fn test_invalid_link() {
        let (assistant, _) = assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());
        assert_eq!(
            assistant.handle_message("u", "https://youtube.com/watch?v=nope").await.unwrap(),
            "Invalid YouTube URL."
        );
    }

    #[tokio::test]
    async fn test_transcript_failure_reason_is_capped() {
        let transcripts = StubTranscripts {
            truncated: false,
            fail: Some(format!("Captions failed: {}", "x".repeat(2000))),
        };
        let (assistant, _) = assistant_with(Arc::new(ScriptedGenerator::new()), transcripts);

        let reply = assistant.handle_message("u", LINK).await.unwrap();
        assert!(reply.starts_with(
            "Could not fetch transcript for this video.\n\
             Try another public video, or install yt-dlp for audio fallback.\n\
             Reason: Captions failed: "
        ));
        let reason = reply.split("Reason: ").nth(1).unwrap();
        assert_eq!(reason.chars().count(), 700);
    }

    #[tokio::test]
    async fn test_link_then_question() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply(SUMMARY)
                .reply("What about pricing?")
                .reply("Pricing is freemium. [03:15]"),
        );
        let (assistant, store) = assistant_with(generator.clone(), working_transcripts());

        let summary = assistant.handle_message("u", LINK).await.unwrap();
        assert_eq!(summary, SUMMARY);

        let answer = assistant.handle_message("u", "What about pricing?").await.unwrap();
        assert_eq!(answer, "Pricing is freemium. [03:15]");

        let state = store.load("u").await.unwrap().unwrap();
        assert_eq!(state.video_title, "Growth Talk");
        assert_eq!(state.last_summary, SUMMARY);
        assert_eq!(state.qa_history.len(), 1);
        assert_eq!(state.qa_history[0].question, "What about pricing?");

        // The summary is offered to the rewrite step as reference context.
        assert!(generator.calls()[1].prompt.contains("Recent Summary:\nVideo Title:\nGrowth Talk"));
    }

    #[tokio::test]
    async fn test_unsupported_question_is_not_covered() {
        let generator = Arc::new(ScriptedGenerator::new().reply(SUMMARY));
        let (assistant, store) = assistant_with(generator.clone(), working_transcripts());

        assistant.handle_message("u", LINK).await.unwrap();
        let answer = assistant.handle_message("u", "Who is the quarterback?").await.unwrap();
        assert_eq!(answer, NO_COVERAGE_REPLY);
        // Summary draft plus the rewrite call; no answer call.
        assert_eq!(generator.call_count(), 2);
        assert_eq!(store.load("u").await.unwrap().unwrap().qa_history.len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_transcript_notice() {
        let generator = Arc::new(ScriptedGenerator::new().reply(SUMMARY));
        let transcripts = StubTranscripts {
            truncated: true,
            fail: None,
        };
        let (assistant, store) = assistant_with(generator, transcripts);

        let reply = assistant.handle_message("u", LINK).await.unwrap();
        assert_eq!(reply, format!("{}{}", TRUNCATION_NOTICE, SUMMARY));
        assert_eq!(store.load("u").await.unwrap().unwrap().last_summary, SUMMARY);
    }

    #[tokio::test]
    async fn test_link_summary_failures() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .fail("Error code: 429 - insufficient_quota")
                .fail("Incorrect API key provided")
                .fail("timeout"),
        );
        let (assistant, store) = assistant_with(generator, working_transcripts());

        assert_eq!(
            assistant.handle_message("u", LINK).await.unwrap(),
            "Transcript fetched successfully, but summary failed: API quota exceeded."
        );
        assert_eq!(
            assistant.handle_message("u", LINK).await.unwrap(),
            "Summary failed: invalid API key/provider setup."
        );
        assert_eq!(
            assistant.handle_message("u", LINK).await.unwrap(),
            "Summary generation failed."
        );
        // The transcript is kept even though the summary failed.
        assert!(store.load("u").await.unwrap().unwrap().has_transcript());
    }

    #[tokio::test]
    async fn test_report_commands() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply(SUMMARY)
                .reply("Deep dive report")
                .fail("invalid_api_key")
                .fail("rate limit reached")
                .reply("Research brief report"),
        );
        let (assistant, _) = assistant_with(generator.clone(), working_transcripts());
        assistant.handle_message("u", LINK).await.unwrap();

        assert_eq!(assistant.handle_message("u", "/deepdive").await.unwrap(), "Deep dive report");
        assert_eq!(
            assistant.handle_message("u", "/actionpoints").await.unwrap(),
            "Action points failed: invalid API key/provider setup."
        );
        assert_eq!(
            assistant.handle_message("u", "/research").await.unwrap(),
            "Research brief failed: API quota exceeded."
        );
        assert_eq!(
            assistant.handle_message("u", "give me the key insights").await.unwrap(),
            "Research brief report"
        );
    }

    #[tokio::test]
    async fn test_full_transcript_and_new_video_reset() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply(SUMMARY)
                .reply("pricing")
                .reply("Freemium. [03:15]")
                .reply(SUMMARY),
        );
        let (assistant, store) = assistant_with(generator, working_transcripts());

        assistant.handle_message("u", LINK).await.unwrap();
        let lines = assistant.handle_message("u", "/fulltranscript").await.unwrap();
        assert!(lines.starts_with("[03:15] The pricing strategy"));

        assistant.handle_message("u", "pricing?").await.unwrap();
        assert_eq!(store.load("u").await.unwrap().unwrap().qa_history.len(), 1);

        assistant.handle_message("u", LINK).await.unwrap();
        assert!(store.load("u").await.unwrap().unwrap().qa_history.is_empty());
    }

    #[tokio::test]
    async fn test_default_language_for_new_users() {
        let store = Arc::new(MemorySessionStore::new());
        let assistant = Assistant::new(
            Arc::new(ScriptedGenerator::new()),
            Arc::new(working_transcripts()),
            store.clone(),
        )
        .with_default_language("telgu");

        assistant.handle_message("u", "hello").await.unwrap();
        assert_eq!(store.load("u").await.unwrap().unwrap().language, "Telugu");
    }

    #[tokio::test]
    async fn test_voice_message_is_handled_as_text() {
        use crate::voice::testing::FixedSpeechToText;

        let generator = Arc::new(ScriptedGenerator::new().reply(SUMMARY));
        let stt = Arc::new(FixedSpeechToText::hearing(&format!("  {}  ", LINK)));
        let (assistant, store) = assistant_with(generator, working_transcripts());
        let assistant = assistant.with_speech_to_text(stt.clone());

        let turn = assistant
            .handle_voice("u", AudioClip::new("voice.ogg", vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(turn.heard.as_deref(), Some(LINK));
        assert_eq!(turn.reply, SUMMARY);
        assert_eq!(*stt.files.lock().unwrap(), vec!["voice.ogg".to_string()]);
        assert!(store.load("u").await.unwrap().unwrap().has_transcript());
    }

    #[tokio::test]
    async fn test_voice_disabled_empty_and_failing() {
        use crate::voice::testing::FixedSpeechToText;

        let clip = || AudioClip::new("voice.ogg", vec![0]);
        let (assistant, _) = assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());
        let turn = assistant.handle_voice("u", clip()).await.unwrap();
        assert_eq!(turn.reply, VOICE_INPUT_DISABLED);
        assert!(assistant
            .handle_message("u", "/start")
            .await
            .unwrap()
            .contains("Voice input is disabled"));

        let assistant = assistant.with_speech_to_text(Arc::new(FixedSpeechToText::hearing("  ")));
        let turn = assistant.handle_voice("u", clip()).await.unwrap();
        assert_eq!(turn, VoiceTurn { heard: None, reply: EMPTY_VOICE_REPLY.to_string() });
        assert!(assistant
            .handle_message("u", "/help")
            .await
            .unwrap()
            .contains("Send voice message for speech-to-text"));

        let assistant = assistant.with_speech_to_text(Arc::new(FixedSpeechToText::failing(
            "Error code: 429 - insufficient_quota",
        )));
        let turn = assistant.handle_voice("u", clip()).await.unwrap();
        assert!(turn.reply.starts_with("Voice processing is unavailable: API quota exceeded."));
    }

    #[tokio::test]
    async fn test_speak_only_with_speaker() {
        use crate::voice::testing::EchoSpeech;

        let (assistant, _) = assistant_with(Arc::new(ScriptedGenerator::new()), working_transcripts());
        assert!(!assistant.speaks());
        assert!(assistant.speak("hello").await.is_none());

        let assistant = assistant.with_speaker(Speaker::new(Arc::new(EchoSpeech::new())));
        assert!(assistant.speaks());
        assert_eq!(assistant.speak(" hello ").await.unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_failure_reply_classification() {
        let quota = VidbriefError::Generation("Error code: 429".to_string());
        let creds = VidbriefError::Generation("Error code: 401".to_string());
        let other = VidbriefError::Generation("boom".to_string());

        assert_eq!(Operation::Answer.failure_reply(&quota), "Q&A failed: API quota exceeded.");
        assert_eq!(
            Operation::Report(ReportKind::DeepDive).failure_reply(&creds),
            "Deepdive failed: invalid API key/provider setup."
        );
        assert_eq!(
            Operation::Answer.failure_reply(&other),
            "Could not answer the question right now."
        );
    }
}
