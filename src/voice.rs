//! Voice messages in, spoken replies out.
//!
//! Incoming audio is transcribed and then handled exactly like a typed message.
//! Spoken replies are best effort: a synthesis failure never fails the text reply.

use crate::error::{FailureKind, Result, VidbriefError};
use crate::text::truncate_chars;
use crate::transcript::transcription_request;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AudioResponseFormat, CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice,
};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Longest reply text sent to speech synthesis.
pub const MAX_TTS_CHARS: usize = 2000;

/// Reply when voice messages are turned off.
pub const VOICE_INPUT_DISABLED: &str =
    "Voice input is disabled for current API provider. Please send text input.";

/// Reply when a voice message transcribes to nothing.
pub const EMPTY_VOICE_REPLY: &str = "Please send text or a voice message.";

/// An audio file received from a user.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// File name; its extension tells the provider the audio format.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a clip from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("voice.ogg")
            .to_string();
        Ok(Self { file_name, bytes })
    }
}

/// Speech-to-text for voice messages.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, clip: AudioClip) -> Result<String>;
}

/// Text-to-speech for spoken replies.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text`, returning encoded audio (mp3).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Whisper-style transcription through an OpenAI-compatible provider.
pub struct OpenAISpeechToText {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAISpeechToText {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SpeechToText for OpenAISpeechToText {
    #[instrument(skip(self, clip), fields(model = %self.model, file = %clip.file_name, bytes = clip.bytes.len()))]
    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        let request =
            transcription_request(clip.file_name, clip.bytes, &self.model, AudioResponseFormat::Json)?;
        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| VidbriefError::Generation(e.to_string()))?;
        debug!("Transcribed voice message ({} chars)", response.text.len());
        Ok(response.text)
    }
}

/// Speech synthesis through an OpenAI-compatible provider.
pub struct OpenAITextToSpeech {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAITextToSpeech {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextToSpeech for OpenAITextToSpeech {
    #[instrument(skip(self, text), fields(model = %self.model, chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = CreateSpeechRequestArgs::default()
            .model(SpeechModel::Other(self.model.clone()))
            .voice(Voice::Alloy)
            .input(text)
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| VidbriefError::Generation(e.to_string()))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| VidbriefError::Generation(e.to_string()))?;
        Ok(response.bytes.to_vec())
    }
}

/// Text actually sent to synthesis: trimmed and capped, None when empty.
pub fn tts_input(text: &str) -> Option<&str> {
    let capped = truncate_chars(text.trim(), MAX_TTS_CHARS);
    (!capped.is_empty()).then_some(capped)
}

/// User-facing reply for a failed voice transcription.
pub fn voice_failure_reply(err: &VidbriefError) -> String {
    warn!("Voice processing failed: {}", err);
    match err.failure_kind() {
        FailureKind::QuotaExceeded => "Voice processing is unavailable: API quota exceeded.\n\
             Please check billing/usage, or send text input for now."
            .to_string(),
        FailureKind::InvalidCredentials => {
            "Voice processing failed: invalid API key/provider setup.".to_string()
        }
        FailureKind::Generic => "Could not process voice message.".to_string(),
    }
}

/// Turns replies into audio, swallowing synthesis failures.
pub struct Speaker {
    tts: Arc<dyn TextToSpeech>,
}

impl Speaker {
    pub fn new(tts: Arc<dyn TextToSpeech>) -> Self {
        Self { tts }
    }

    /// Speak a reply. None when there is nothing to say or synthesis failed.
    pub async fn speak(&self, reply: &str) -> Option<Vec<u8>> {
        let input = tts_input(reply)?;
        match self.tts.synthesize(input).await {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => None,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::EchoSpeech;
    use super::*;

    #[test]
    fn test_tts_input_caps_and_trims() {
        assert_eq!(tts_input("   "), None);
        assert_eq!(tts_input("  hi  "), Some("hi"));

        let long = "ह".repeat(MAX_TTS_CHARS + 50);
        assert_eq!(tts_input(&long).unwrap().chars().count(), MAX_TTS_CHARS);
    }

    #[tokio::test]
    async fn test_speaker_sends_capped_text() {
        let tts = Arc::new(EchoSpeech::new());
        let speaker = Speaker::new(tts.clone());

        let reply = "a".repeat(MAX_TTS_CHARS * 2);
        let audio = speaker.speak(&reply).await.unwrap();
        assert_eq!(audio.len(), MAX_TTS_CHARS);
        assert!(speaker.speak("  ").await.is_none());
        assert_eq!(tts.inputs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_speaker_swallows_failures() {
        let tts = Arc::new(EchoSpeech {
            fail: true,
            inputs: Default::default(),
        });
        let speaker = Speaker::new(tts);
        assert!(speaker.speak("Core takeaway: start free.").await.is_none());
    }

    #[test]
    fn test_voice_failure_replies() {
        let quota = VidbriefError::Generation("insufficient_quota".to_string());
        assert!(voice_failure_reply(&quota).contains("quota exceeded"));

        let key = VidbriefError::Generation("Incorrect API key provided".to_string());
        assert!(voice_failure_reply(&key).contains("invalid API key"));

        let other = VidbriefError::Generation("connection reset".to_string());
        assert_eq!(voice_failure_reply(&other), "Could not process voice message.");
    }

    #[tokio::test]
    async fn test_clip_from_path_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.m4a");
        std::fs::write(&path, b"fake audio").unwrap();

        let clip = AudioClip::from_path(&path).await.unwrap();
        assert_eq!(clip.file_name, "note.m4a");
        assert_eq!(clip.bytes, b"fake audio");
    }
}
