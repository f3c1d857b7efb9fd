//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);

            match Settings::api_key() {
                Some(key) => {
                    let base_url = settings.resolve_base_url(&key);
                    Output::kv("Provider", base_url.as_deref().unwrap_or("https://api.openai.com/v1"));
                    Output::kv("Chat model", &settings.chat_model(base_url.as_deref()));
                    let base = base_url.as_deref();
                    Output::kv("Audio fallback", on_off(settings.audio_fallback_enabled(base)));
                    Output::kv("Voice input", on_off(settings.voice_input_enabled(base)));
                    Output::kv("Voice output", on_off(settings.voice_output_enabled(base)));
                }
                None => Output::warning("No API key set (OPENAI_API_KEY or OPENROUTER_API_KEY)."),
            }
        }

        ConfigAction::Path => {
            let path = config_path
                .map(PathBuf::from)
                .unwrap_or_else(Settings::default_config_path);
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
