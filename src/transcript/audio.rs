//! Audio transcription fallback for videos without captions.

use super::fetcher::TranscriptSource;
use super::ytdlp::{download_audio, fetch_metadata, scratch_dir};
use super::{FetchedTranscript, TranscriptEntry, TranscriptSourceType};
use crate::error::{Result, VidbriefError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AudioInput, AudioResponseFormat, CreateTranscriptionRequest, CreateTranscriptionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Build a speech-to-text request for an in-memory audio file.
pub(crate) fn transcription_request(
    file_name: String,
    bytes: Vec<u8>,
    model: &str,
    format: AudioResponseFormat,
) -> Result<CreateTranscriptionRequest> {
    CreateTranscriptionRequestArgs::default()
        .file(AudioInput::from_vec_u8(file_name, bytes))
        .model(model)
        .response_format(format)
        .build()
        .map_err(|e| VidbriefError::Generation(format!("Failed to build request: {}", e)))
}

/// Downloads the audio track and transcribes it with Whisper.
pub struct AudioFallbackSource {
    client: Client<OpenAIConfig>,
    model: String,
    enabled: bool,
    max_duration_seconds: u32,
    scratch_base: Option<PathBuf>,
}

impl AudioFallbackSource {
    /// Create a new audio fallback source.
    pub fn new(client: Client<OpenAIConfig>, model: &str, enabled: bool, max_duration_seconds: u32) -> Self {
        Self {
            client,
            model: model.to_string(),
            enabled,
            max_duration_seconds,
            scratch_base: None,
        }
    }

    /// Download audio under this directory instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_base = Some(dir);
        self
    }

    async fn transcribe(&self, audio_path: &std::path::Path) -> Result<FetchedTranscript> {
        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = transcription_request(
            file_name,
            file_bytes,
            &self.model,
            AudioResponseFormat::VerboseJson,
        )?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| VidbriefError::Generation(format!("Whisper API error: {}", e)))?;

        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(VidbriefError::TranscriptUnavailable(
                "Empty transcript after audio fallback.".to_string(),
            ));
        }

        let mut entries: Vec<TranscriptEntry> = response
            .segments
            .unwrap_or_default()
            .into_iter()
            .map(|s| TranscriptEntry::new(s.start as f64, s.text))
            .collect();
        if entries.is_empty() {
            entries.push(TranscriptEntry::new(0.0, text));
        }

        let language = if response.language.is_empty() {
            "Unknown".to_string()
        } else {
            response.language
        };

        Ok(FetchedTranscript {
            entries,
            source_language: language,
            source_type: TranscriptSourceType::AudioFallback,
        })
    }
}

#[async_trait]
impl TranscriptSource for AudioFallbackSource {
    fn label(&self) -> &'static str {
        "Audio fallback"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        if !self.enabled {
            return Err(VidbriefError::Config(
                "Audio fallback disabled for current API provider.".to_string(),
            ));
        }

        let metadata = fetch_metadata(video_id).await?;
        if let Some(duration) = metadata.duration {
            if duration > self.max_duration_seconds as f64 {
                return Err(VidbriefError::InvalidInput(
                    "Video is too long for fallback transcription.".to_string(),
                ));
            }
        }

        let dir = scratch_dir(self.scratch_base.as_deref())?;
        let audio_path = download_audio(video_id, dir.path()).await?;
        info!("Transcribing audio for {}", video_id);
        let fetched = self.transcribe(&audio_path).await;

        if let Err(e) = dir.close() {
            warn!("Failed to clean up audio directory: {}", e);
        }
        fetched
    }
}
