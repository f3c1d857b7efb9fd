//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidbriefError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Anything that can call the text-generation provider.
    Converse,
    /// Fetching a transcript needs yt-dlp.
    FetchTranscript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Converse => check_api_key(),
        Operation::FetchTranscript => check_tool("yt-dlp"),
    }
}

/// Check that an OpenAI or OpenRouter API key is configured.
fn check_api_key() -> Result<()> {
    match Settings::api_key() {
        Some(_) => Ok(()),
        None => Err(VidbriefError::Config(
            "No API key set. Set it with: export OPENAI_API_KEY='sk-...' \
             (or OPENROUTER_API_KEY for OpenRouter)"
                .to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidbriefError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidbriefError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidbriefError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("vidbrief-definitely-missing-tool").unwrap_err();
        assert!(matches!(err, VidbriefError::ToolNotFound(_)));
    }
}
