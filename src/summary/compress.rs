//! Chunk-and-note compression for long transcripts.

use super::VideoContext;
use crate::config::Prompts;
use crate::error::Result;
use crate::language::normalize_language;
use crate::llm::TextGenerator;
use crate::text::truncate_chars;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Characters per compression chunk.
pub const CHUNK_SIZE: usize = 12_000;
/// Chunks beyond this are discarded.
pub const MAX_CHUNKS: usize = 6;
/// Cap on the joined notes.
const MAX_DIGEST_CHARS: usize = 28_000;
const COMPRESS_TEMPERATURE: f32 = 0.1;

/// Split trimmed text into consecutive `chunk_size`-character slices, at most `max_chunks`.
pub fn split_text(text: &str, chunk_size: usize, max_chunks: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .take(max_chunks)
        .map(|c| c.iter().collect())
        .collect()
}

/// Reduces a transcript to something small enough for one prompt.
pub struct Compressor {
    generator: Arc<dyn TextGenerator>,
    prompts: Prompts,
}

impl Compressor {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Prompts) -> Self {
        Self { generator, prompts }
    }

    /// Return the transcript itself when it fits in one chunk, otherwise
    /// notes for each of the first [`MAX_CHUNKS`] chunks.
    #[instrument(skip_all, fields(title = %video.title))]
    pub async fn compress(&self, video: &VideoContext<'_>) -> Result<String> {
        let chunks = split_text(video.transcript, CHUNK_SIZE, MAX_CHUNKS);
        if chunks.len() <= 1 {
            return Ok(truncate_chars(video.transcript, CHUNK_SIZE).to_string());
        }

        info!("Compressing long transcript in {} chunks", chunks.len());
        let language = normalize_language(video.language);
        let total = chunks.len().to_string();
        let mut notes = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let index = (i + 1).to_string();
            let prompt = self.prompts.render_with_custom(
                &self.prompts.summary.compress,
                &[
                    ("language", language.as_str()),
                    ("title", video.title),
                    ("index", index.as_str()),
                    ("total", total.as_str()),
                    ("chunk", chunk.as_str()),
                ],
            );
            let note = self.generator.generate(&prompt, COMPRESS_TEMPERATURE).await?;
            debug!("Chunk {}/{} compressed to {} chars", index, total, note.len());
            notes.push(note);
        }

        Ok(truncate_chars(&notes.join("\n\n"), MAX_DIGEST_CHARS).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;

    #[test]
    fn test_split_caps_chunk_count() {
        let text = "a".repeat(70_000);
        let chunks = split_text(&text, CHUNK_SIZE, MAX_CHUNKS);
        assert_eq!(chunks.len(), 6);
        assert!(chunks.iter().all(|c| c.len() == CHUNK_SIZE));
    }

    #[test]
    fn test_split_counts_characters() {
        let chunks = split_text("  ಕನ್ನಡabc  ", 3, 10);
        assert_eq!(chunks, vec!["ಕನ್", "ನಡa", "bc"]);
        assert!(split_text("   ", 3, 10).is_empty());
    }

    #[tokio::test]
    async fn test_short_transcript_passes_through() {
        let generator = Arc::new(ScriptedGenerator::new());
        let compressor = Compressor::new(generator.clone(), Prompts::default());

        let transcript = "word ".repeat(1000);
        let out = compressor.compress(&VideoContext::new(&transcript)).await.unwrap();
        assert_eq!(out, transcript);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_transcript_is_compressed_per_chunk() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply("notes one")
                .reply("notes two")
                .reply("notes three"),
        );
        let compressor = Compressor::new(generator.clone(), Prompts::default());

        let transcript = "b".repeat(30_000);
        let mut video = VideoContext::new(&transcript);
        video.language = "tamil";
        video.title = "Growth Talk";

        let out = compressor.compress(&video).await.unwrap();
        assert_eq!(out, "notes one\n\nnotes two\n\nnotes three");

        let calls = generator.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].prompt.contains("Chunk: 2/3"));
        assert!(calls[1].prompt.contains("Respond strictly in Tamil."));
        assert!(calls[0].prompt.contains("Video title: Growth Talk"));
        assert_eq!(calls[2].temperature, 0.1);
    }

    #[tokio::test]
    async fn test_digest_is_capped() {
        let big = "n".repeat(20_000);
        let generator = Arc::new(ScriptedGenerator::new().reply(big.clone()).reply(big));
        let compressor = Compressor::new(generator, Prompts::default());

        let transcript = "c".repeat(20_000);
        let out = compressor.compress(&VideoContext::new(&transcript)).await.unwrap();
        assert_eq!(out.len(), 28_000);
    }
}
