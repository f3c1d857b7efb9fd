//! Configuration settings for vidbrief.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Base URL used when the API key is an OpenRouter key.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub transcript: TranscriptSettings,
    pub session: SessionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidbrief".to_string(),
            temp_dir: "/tmp/vidbrief".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Text-generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model. None picks a default for the provider.
    pub model: Option<String>,
    /// OpenAI-compatible base URL. `OPENAI_BASE_URL` takes precedence.
    pub base_url: Option<String>,
    /// Speech-to-text model for the audio fallback and voice messages.
    /// `STT_MODEL` takes precedence.
    pub transcription_model: String,
    /// Text-to-speech model for spoken replies. `TTS_MODEL` takes precedence.
    pub tts_model: String,
    /// Speak replies. None follows the provider's audio default.
    pub voice_output: Option<bool>,
    /// Sent as `HTTP-Referer` to OpenRouter. `OPENROUTER_SITE_URL` takes precedence.
    pub openrouter_site_url: Option<String>,
    /// Sent as `X-Title` to OpenRouter. `OPENROUTER_APP_NAME` takes precedence.
    pub openrouter_app_name: Option<String>,
    /// HTTP timeout for provider calls.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            transcription_model: "whisper-1".to_string(),
            tts_model: "gpt-4o-mini-tts".to_string(),
            voice_output: None,
            openrouter_site_url: None,
            openrouter_app_name: None,
            timeout_seconds: 300,
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption language codes, in preference order.
    pub preferred_languages: Vec<String>,
    /// Enable audio transcription when captions are missing.
    /// None follows `voice_input`.
    pub audio_fallback: Option<bool>,
    /// Accept voice messages. None follows the provider's audio default.
    pub voice_input: Option<bool>,
    /// Longest video the audio fallback will download.
    pub max_audio_duration_seconds: u32,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            preferred_languages: ["en", "hi", "ta", "te", "kn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            audio_fallback: None,
            voice_input: None,
            max_audio_duration_seconds: 3 * 60 * 60,
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Path to the SQLite session database.
    pub sqlite_path: String,
    /// Output language for new users.
    pub default_language: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.vidbrief/sessions.db".to_string(),
            default_language: crate::language::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidbrief")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite session database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.session.sqlite_path)
    }

    /// API key from `OPENAI_API_KEY`, falling back to `OPENROUTER_API_KEY`.
    pub fn api_key() -> Option<String> {
        ["OPENAI_API_KEY", "OPENROUTER_API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    /// Effective provider base URL for the given API key.
    pub fn resolve_base_url(&self, api_key: &str) -> Option<String> {
        let from_env = std::env::var("OPENAI_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        from_env
            .or_else(|| self.llm.base_url.clone().filter(|v| !v.is_empty()))
            .or_else(|| {
                api_key
                    .starts_with("sk-or-v1")
                    .then(|| OPENROUTER_BASE_URL.to_string())
            })
    }

    /// Whether the base URL points at OpenRouter.
    pub fn is_openrouter(base_url: Option<&str>) -> bool {
        base_url.is_some_and(|u| u.contains("openrouter.ai"))
    }

    /// Chat model to use with the given base URL. `CHAT_MODEL` takes precedence.
    pub fn chat_model(&self, base_url: Option<&str>) -> String {
        if let Some(model) = env_value("CHAT_MODEL") {
            return model;
        }
        if let Some(model) = self.llm.model.as_ref().filter(|m| !m.is_empty()) {
            return model.clone();
        }
        if Self::is_openrouter(base_url) {
            "openai/gpt-4o-mini".to_string()
        } else {
            "gpt-4o-mini".to_string()
        }
    }

    /// Speech-to-text model.
    pub fn stt_model(&self) -> String {
        env_value("STT_MODEL").unwrap_or_else(|| self.llm.transcription_model.clone())
    }

    /// Text-to-speech model.
    pub fn tts_model(&self) -> String {
        env_value("TTS_MODEL").unwrap_or_else(|| self.llm.tts_model.clone())
    }

    /// Provider-wide audio default: `AUDIO_ENABLED`, else on unless OpenRouter.
    fn audio_enabled(base_url: Option<&str>) -> bool {
        env_flag("AUDIO_ENABLED").unwrap_or(!Self::is_openrouter(base_url))
    }

    /// Whether voice messages are accepted.
    pub fn voice_input_enabled(&self, base_url: Option<&str>) -> bool {
        env_flag("VOICE_INPUT_ENABLED")
            .or(self.transcript.voice_input)
            .unwrap_or_else(|| Self::audio_enabled(base_url))
    }

    /// Whether replies are also spoken.
    pub fn voice_output_enabled(&self, base_url: Option<&str>) -> bool {
        env_flag("VOICE_OUTPUT_ENABLED")
            .or(self.llm.voice_output)
            .unwrap_or_else(|| Self::audio_enabled(base_url))
    }

    /// Whether the audio transcription fallback is enabled for this provider.
    pub fn audio_fallback_enabled(&self, base_url: Option<&str>) -> bool {
        self.transcript
            .audio_fallback
            .unwrap_or_else(|| self.voice_input_enabled(base_url))
    }

    /// OpenRouter attribution headers; empty for other providers.
    pub fn attribution_headers(&self, base_url: Option<&str>) -> Vec<(&'static str, String)> {
        if !Self::is_openrouter(base_url) {
            return Vec::new();
        }
        let site = env_value("OPENROUTER_SITE_URL")
            .or_else(|| self.llm.openrouter_site_url.clone().filter(|v| !v.trim().is_empty()));
        let app = env_value("OPENROUTER_APP_NAME")
            .or_else(|| self.llm.openrouter_app_name.clone().filter(|v| !v.trim().is_empty()));

        let mut headers = Vec::new();
        if let Some(site) = site {
            headers.push(("HTTP-Referer", site.trim().to_string()));
        }
        if let Some(app) = app {
            headers.push(("X-Title", app.trim().to_string()));
        }
        headers
    }
}

/// Trimmed, non-empty environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> Option<bool> {
    env_value(name).and_then(|v| parse_flag(&v))
}

/// Parse `1/true/yes` and `0/false/no`, case-insensitively.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
