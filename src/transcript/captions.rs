//! YouTube captions via yt-dlp subtitle downloads.

use super::fetcher::TranscriptSource;
use super::ytdlp::{run_ytdlp, scratch_dir, watch_url};
use super::{FetchedTranscript, TranscriptEntry, TranscriptSourceType};
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Which subtitle track family a download attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackKind {
    Manual,
    Generated,
}

/// Fetches one family of subtitle tracks into a directory.
#[async_trait]
trait SubtitleDownloader: Send + Sync {
    async fn download(
        &self,
        video_id: &str,
        kind: TrackKind,
        languages: &str,
        dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// Subtitle downloads through the yt-dlp binary.
struct YtDlpSubtitles;

#[async_trait]
impl SubtitleDownloader for YtDlpSubtitles {
    async fn download(
        &self,
        video_id: &str,
        kind: TrackKind,
        languages: &str,
        dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let template = dir.join("%(id)s.%(ext)s").to_string_lossy().to_string();
        let url = watch_url(video_id);
        let track_flag = match kind {
            TrackKind::Manual => "--write-subs",
            TrackKind::Generated => "--write-auto-subs",
        };

        let output = run_ytdlp([
            "--skip-download",
            track_flag,
            "--sub-langs",
            languages,
            "--sub-format",
            "json3",
            "--output",
            template.as_str(),
            "--no-playlist",
            "--no-warnings",
            url.as_str(),
        ])
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidbriefError::ToolFailed(format!(
                "yt-dlp subtitle download failed: {}",
                stderr.trim()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json3") {
                files.push(path);
            }
        }
        debug!("{:?} subtitle attempt produced {} files", kind, files.len());
        Ok(files)
    }
}

/// Captions source: uploaded subtitles first, then auto-generated ones.
pub struct CaptionsSource {
    preferred_languages: Vec<String>,
    scratch_base: Option<PathBuf>,
    downloader: Box<dyn SubtitleDownloader>,
}

impl CaptionsSource {
    /// Create a captions source with language codes in preference order.
    pub fn new(preferred_languages: Vec<String>) -> Self {
        Self {
            preferred_languages,
            scratch_base: None,
            downloader: Box::new(YtDlpSubtitles),
        }
    }

    /// Download subtitle files under this directory instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_base = Some(dir);
        self
    }

    /// Pick the downloaded track that best matches the language preference.
    fn pick_track(&self, files: &[PathBuf]) -> Option<(PathBuf, String)> {
        let with_lang: Vec<(PathBuf, String)> = files
            .iter()
            .filter_map(|path| subtitle_language(path).map(|lang| (path.clone(), lang)))
            .collect();

        for preferred in &self.preferred_languages {
            if let Some(found) = with_lang.iter().find(|(_, lang)| lang == preferred) {
                return Some(found.clone());
            }
        }
        let mut rest = with_lang;
        rest.sort_by(|a, b| a.1.cmp(&b.1));
        rest.into_iter().next()
    }
}

/// Language code from a `<id>.<lang>.json3` file name.
fn subtitle_language(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('.').map(|(_, lang)| lang.to_string())
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse a YouTube json3 subtitle document into transcript entries.
///
/// Events without text (window/style events, bare newlines) are dropped.
pub fn parse_json3(content: &str) -> Result<Vec<TranscriptEntry>> {
    let document: Json3Document = serde_json::from_str(content)?;
    let entries = document
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(TranscriptEntry::new(event.start_ms as f64 / 1000.0, text))
            }
        })
        .collect();
    Ok(entries)
}

#[async_trait]
impl TranscriptSource for CaptionsSource {
    fn label(&self) -> &'static str {
        "Captions"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        let preferred = self.preferred_languages.join(",");
        let attempts = [
            (TrackKind::Manual, preferred.as_str()),
            (TrackKind::Generated, preferred.as_str()),
            (TrackKind::Manual, "all"),
        ];

        let mut last_error = None;
        for (kind, languages) in attempts {
            let dir = scratch_dir(self.scratch_base.as_deref())?;
            let files = match self
                .downloader
                .download(video_id, kind, languages, dir.path())
                .await
            {
                Ok(files) => files,
                Err(e) => {
                    warn!("{:?} subtitle attempt for {} failed: {}", kind, video_id, e);
                    last_error = Some(e);
                    continue;
                }
            };
            let Some((path, language)) = self.pick_track(&files) else {
                continue;
            };

            let content = std::fs::read_to_string(&path)?;
            let entries = parse_json3(&content)?;
            if entries.is_empty() {
                continue;
            }

            info!("Using {:?} captions in '{}' ({} entries)", kind, language, entries.len());
            return Ok(FetchedTranscript {
                entries,
                source_language: language,
                source_type: TranscriptSourceType::YoutubeCaptions,
            });
        }

        Err(last_error.unwrap_or_else(|| {
            VidbriefError::TranscriptUnavailable(format!(
                "No captions available for video {}",
                video_id
            ))
        }))
    }
}
