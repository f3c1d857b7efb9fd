//! Transcript command: fetch and print a video's timestamped transcript.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::{Result, VidbriefError};
use crate::openai::create_client;
use crate::transcript::{extract_video_id, TranscriptFetcher, TranscriptProvider};
use tracing::debug;

/// Fetch the transcript for `input` (a URL or bare video ID) and print it.
pub async fn run_transcript(input: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::FetchTranscript) {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    let video_id = extract_video_id(input).ok_or_else(|| {
        VidbriefError::InvalidInput(format!("Could not find a YouTube video in '{}'", input))
    })?;

    // Audio fallback needs a provider; captions alone work without one.
    let provider = match create_client(&settings) {
        Ok(provider) => Some(provider),
        Err(e) => {
            debug!("Audio fallback unavailable: {}", e);
            None
        }
    };
    let fetcher = TranscriptFetcher::from_settings(&settings, provider.as_ref());

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let result = fetcher.get_transcript_data(&video_id).await;
    spinner.finish_and_clear();
    let data = result?;

    Output::header(&data.video_title);
    Output::kv("Video ID", &video_id);
    Output::kv("Source", &data.source_type.to_string());
    Output::kv("Language", &data.source_language);
    if data.is_truncated {
        Output::warning("Transcript text was truncated for analysis.");
    }
    println!();
    println!("{}", data.full_lines);

    Ok(())
}
