//! OpenAI-compatible client configuration.

use crate::config::Settings;
use crate::error::{Result, VidbriefError};
use async_openai::{config::OpenAIConfig, Client};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// A configured provider client plus the resolved provider details.
pub struct ProviderClient {
    pub client: Client<OpenAIConfig>,
    /// Base URL in use, None for the default OpenAI endpoint.
    pub base_url: Option<String>,
}

/// Create a provider client from settings and environment.
///
/// Fails when no API key is configured.
pub fn create_client(settings: &Settings) -> Result<ProviderClient> {
    let api_key = Settings::api_key().ok_or_else(|| {
        VidbriefError::Config(
            "No API key found. Set OPENAI_API_KEY or OPENROUTER_API_KEY.".to_string(),
        )
    })?;
    let base_url = settings.resolve_base_url(&api_key);

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(url) = &base_url {
        debug!("Using provider base URL {}", url);
        config = config.with_api_base(url.clone());
    }

    let headers = header_map(&settings.attribution_headers(base_url.as_deref()))?;
    let client = create_client_with_timeout(
        config,
        Duration::from_secs(settings.llm.timeout_seconds),
        headers,
    )?;
    Ok(ProviderClient { client, base_url })
}

/// Create an OpenAI client with a custom timeout and extra default headers.
///
/// Failed calls are not retried: rate limits and server errors surface on the
/// first response.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
    headers: HeaderMap,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()?;
    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry))
}

fn header_map(pairs: &[(&'static str, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| VidbriefError::Config(format!("Invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| VidbriefError::Config(format!("Invalid {} header: {}", name, e)))?;
        headers.insert(header_name, value);
    }
    Ok(headers)
}
