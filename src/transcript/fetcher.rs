//! Ordered transcript acquisition.

use super::ytdlp::fetch_video_title;
use super::{AudioFallbackSource, CaptionsSource, FetchedTranscript, TranscriptData};
use crate::config::Settings;
use crate::error::{Result, VidbriefError};
use crate::openai::ProviderClient;
use async_trait::async_trait;
use tracing::{info, instrument, warn};

/// One way of obtaining a transcript for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Human-readable name used in failure reports ("Captions").
    fn label(&self) -> &'static str;

    /// Fetch timestamped entries for a video.
    async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript>;
}

/// Anything that can turn a video ID into a fully derived transcript.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn get_transcript_data(&self, video_id: &str) -> Result<TranscriptData>;
}

/// Tries each source in order until one yields a non-empty transcript.
pub struct TranscriptFetcher {
    sources: Vec<Box<dyn TranscriptSource>>,
    resolve_titles: bool,
}

impl TranscriptFetcher {
    /// Create a fetcher over the given sources, tried in order.
    pub fn new(sources: Vec<Box<dyn TranscriptSource>>) -> Self {
        Self {
            sources,
            resolve_titles: true,
        }
    }

    /// Captions first, then audio transcription when a provider client is available.
    pub fn from_settings(settings: &Settings, provider: Option<&ProviderClient>) -> Self {
        let scratch = settings.temp_dir();
        let mut sources: Vec<Box<dyn TranscriptSource>> = vec![Box::new(
            CaptionsSource::new(settings.transcript.preferred_languages.clone())
                .with_scratch_dir(scratch.clone()),
        )];

        if let Some(provider) = provider {
            let enabled = settings.audio_fallback_enabled(provider.base_url.as_deref());
            sources.push(Box::new(
                AudioFallbackSource::new(
                    provider.client.clone(),
                    &settings.stt_model(),
                    enabled,
                    settings.transcript.max_audio_duration_seconds,
                )
                .with_scratch_dir(scratch),
            ));
        }

        Self::new(sources)
    }

    /// Skip the network title lookup (titles become "Unknown Title").
    pub fn without_title_lookup(mut self) -> Self {
        self.resolve_titles = false;
        self
    }

    async fn title_for(&self, video_id: &str) -> String {
        if self.resolve_titles {
            fetch_video_title(video_id).await
        } else {
            super::UNKNOWN_TITLE.to_string()
        }
    }
}

#[async_trait]
impl TranscriptProvider for TranscriptFetcher {
    #[instrument(skip(self))]
    async fn get_transcript_data(&self, video_id: &str) -> Result<TranscriptData> {
        let title = self.title_for(video_id).await;
        let mut failures = Vec::new();

        for source in &self.sources {
            let attempt = match source.fetch(video_id).await {
                Ok(fetched) => TranscriptData::from_fetched(fetched, &title),
                Err(e) => Err(e),
            };

            match attempt {
                Ok(data) => {
                    info!(
                        "Transcript for {} obtained via {} ({} chars)",
                        video_id,
                        source.label(),
                        data.text.chars().count()
                    );
                    return Ok(data);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", source.label(), video_id, e);
                    failures.push(format!("{} failed: {}", source.label(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("No transcript sources configured".to_string());
        }
        Err(VidbriefError::TranscriptUnavailable(format!(
            "{}.",
            failures.join(". ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{TranscriptEntry, TranscriptSourceType};

    struct FailingSource(&'static str, &'static str);

    #[async_trait]
    impl TranscriptSource for FailingSource {
        fn label(&self) -> &'static str {
            self.0
        }

        async fn fetch(&self, _video_id: &str) -> Result<FetchedTranscript> {
            Err(VidbriefError::ToolFailed(self.1.to_string()))
        }
    }

    struct FixedSource(Vec<TranscriptEntry>);

    #[async_trait]
    impl TranscriptSource for FixedSource {
        fn label(&self) -> &'static str {
            "Fixed"
        }

        async fn fetch(&self, _video_id: &str) -> Result<FetchedTranscript> {
            Ok(FetchedTranscript {
                entries: self.0.clone(),
                source_language: "en".to_string(),
                source_type: TranscriptSourceType::AudioFallback,
            })
        }
    }

    #[test]
    fn test_from_settings_source_order() {
        let settings = Settings::default();
        let captions_only = TranscriptFetcher::from_settings(&settings, None);
        let labels: Vec<_> = captions_only.sources.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Captions"]);

        let provider = ProviderClient {
            client: async_openai::Client::with_config(
                async_openai::config::OpenAIConfig::new().with_api_key("test"),
            ),
            base_url: None,
        };
        let both = TranscriptFetcher::from_settings(&settings, Some(&provider));
        let labels: Vec<_> = both.sources.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Captions", "Audio fallback"]);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_source() {
        let fetcher = TranscriptFetcher::new(vec![
            Box::new(FailingSource("Captions", "no subtitles")),
            Box::new(FixedSource(vec![TranscriptEntry::new(3.0, "hello there")])),
        ])
        .without_title_lookup();

        let data = fetcher.get_transcript_data("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(data.text, "hello there");
        assert_eq!(data.source_type, TranscriptSourceType::AudioFallback);
        assert_eq!(data.video_title, "Unknown Title");
    }

    #[tokio::test]
    async fn test_reports_every_failure() {
        let fetcher = TranscriptFetcher::new(vec![
            Box::new(FailingSource("Captions", "no subtitles")),
            Box::new(FailingSource("Audio fallback", "yt-dlp missing")),
        ])
        .without_title_lookup();

        let err = fetcher.get_transcript_data("dQw4w9WgXcQ").await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Captions failed:"));
        assert!(message.contains("no subtitles"));
        assert!(message.contains("Audio fallback failed:"));
        assert!(message.contains("yt-dlp missing"));
    }

    #[tokio::test]
    async fn test_empty_transcript_counts_as_failure() {
        let fetcher = TranscriptFetcher::new(vec![Box::new(FixedSource(vec![
            TranscriptEntry::new(0.0, "   "),
        ]))])
        .without_title_lookup();

        let err = fetcher.get_transcript_data("dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.to_string().contains("Fixed failed: Empty transcript"));
    }
}
