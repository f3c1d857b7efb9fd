//! yt-dlp and metadata helpers shared by the transcript sources.

use super::UNKNOWN_TITLE;
use crate::error::{Result, VidbriefError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Create a scratch directory for downloads, under `base` when given.
pub(crate) fn scratch_dir(base: Option<&Path>) -> Result<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("vidbrief-");
    match base {
        Some(base) => {
            std::fs::create_dir_all(base)?;
            Ok(builder.tempdir_in(base)?)
        }
        None => Ok(builder.tempdir()?),
    }
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Run yt-dlp with the given arguments, mapping a missing binary to `ToolNotFound`.
pub(crate) async fn run_ytdlp<I, S>(args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let result = Command::new("yt-dlp")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await;

    match result {
        Ok(output) => Ok(output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidbriefError::ToolNotFound("yt-dlp".to_string()))
        }
        Err(e) => Err(VidbriefError::ToolFailed(format!("yt-dlp execution failed: {e}"))),
    }
}

/// The subset of `yt-dlp --dump-json` we care about.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VideoMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Fetch video metadata without downloading anything.
#[instrument]
pub(crate) async fn fetch_metadata(video_id: &str) -> Result<VideoMetadata> {
    let url = watch_url(video_id);
    let output = run_ytdlp(["--dump-json", "--no-download", "--no-warnings", "--no-playlist", url.as_str()])
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidbriefError::ToolFailed(format!(
            "yt-dlp could not read video {}: {}",
            video_id,
            stderr.trim()
        )));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

/// Resolve a video's title: yt-dlp first, then the public oEmbed proxy.
///
/// Never fails; falls back to "Unknown Title".
pub async fn fetch_video_title(video_id: &str) -> String {
    match fetch_metadata(video_id).await {
        Ok(VideoMetadata { title: Some(title), .. }) if !title.is_empty() => return title,
        Ok(_) => debug!("yt-dlp returned no title for {}", video_id),
        Err(e) => debug!("yt-dlp metadata lookup failed: {}", e),
    }

    match fetch_oembed_title(video_id).await {
        Ok(Some(title)) if !title.is_empty() => title,
        Ok(_) => UNKNOWN_TITLE.to_string(),
        Err(e) => {
            debug!("oEmbed title lookup failed: {}", e);
            UNKNOWN_TITLE.to_string()
        }
    }
}

async fn fetch_oembed_title(video_id: &str) -> Result<Option<String>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(8))
        .build()?;
    let response: OEmbedResponse = client
        .get("https://noembed.com/embed")
        .query(&[("url", watch_url(video_id))])
        .send()
        .await?
        .json()
        .await?;
    Ok(response.title)
}

/// Download a video's audio track as MP3 into `output_dir`.
#[instrument(skip(output_dir))]
pub(crate) async fn download_audio(video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let target_path = output_dir.join(format!("{}.mp3", video_id));
    if target_path.exists() {
        info!("Using cached audio file");
        return Ok(target_path);
    }

    info!("Downloading audio for {}", video_id);
    let template = output_dir.join(format!("{}.%(ext)s", video_id));
    let template = template.to_string_lossy().to_string();
    let url = watch_url(video_id);
    let output = run_ytdlp([
        "--format",
        "bestaudio/best",
        "--extract-audio",
        "--audio-format",
        "mp3",
        "--output",
        template.as_str(),
        "--no-playlist",
        "--quiet",
        "--no-warnings",
        url.as_str(),
    ])
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidbriefError::ToolFailed(format!("yt-dlp failed: {}", stderr.trim())));
    }

    if target_path.exists() {
        Ok(target_path)
    } else {
        warn!("yt-dlp finished but {:?} is missing", target_path);
        Err(VidbriefError::ToolFailed(
            "Audio file not found after download".to_string(),
        ))
    }
}
