//! vidbrief - A transcript-grounded assistant for YouTube videos
//!
//! Send a YouTube link and vidbrief fetches the transcript, produces a fixed-format
//! summary, and then answers follow-up questions strictly from what the video says,
//! citing timestamps like `[03:15]`.
//!
//! # Overview
//!
//! vidbrief allows you to:
//! - Fetch transcripts from YouTube captions, falling back to audio transcription
//! - Get a structured summary, deep-dive, action points or a research brief
//! - Ask questions answered only from transcript evidence, with citations
//! - Pick the reply language per user (English, Hindi, Tamil, ...)
//! - Send voice messages and get spoken replies
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Video ID extraction, caption and audio sources, derived views
//! - `llm` - Text generation abstraction
//! - `retrieval` - Lexical excerpt selection over transcript lines and chunks
//! - `qa` - Grounded question answering with citation enforcement
//! - `summary` - Compression, structured summaries and reports
//! - `session` - Per-user conversation state and its stores
//! - `voice` - Speech-to-text for voice messages and spoken replies
//! - `assistant` - Message routing that ties everything together
//!
//! # Example
//!
//! ```rust,no_run
//! use vidbrief::assistant::Assistant;
//! use vidbrief::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let assistant = Assistant::from_settings(&settings)?;
//!
//!     let summary = assistant
//!         .handle_message("alice", "https://youtu.be/dQw4w9WgXcQ")
//!         .await?;
//!     println!("{}", summary);
//!
//!     let answer = assistant.handle_message("alice", "What is the main claim?").await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod llm;
pub mod openai;
pub mod qa;
pub mod retrieval;
pub mod session;
pub mod summary;
pub mod text;
pub mod transcript;
pub mod voice;

pub use error::{Result, VidbriefError};
