//! CLI module for vidbrief.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{label_parts, split_reply, Output, MAX_REPLY_CHARS};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vidbrief - Transcript-grounded YouTube assistant
///
/// Send a YouTube link to get a structured summary, then ask questions that are
/// answered only from the video's transcript, with timestamp citations.
#[derive(Parser, Debug)]
#[command(name = "vidbrief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Handle a single message for a user session and print the reply
    Message {
        /// Stable user/session identifier
        #[arg(short, long)]
        user: String,

        /// Incoming message text (a YouTube link, a command or a question)
        #[arg(short, long, required_unless_present = "audio", conflicts_with = "audio")]
        text: Option<String>,

        /// Voice message file to transcribe and handle instead of text
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Also write the spoken reply (mp3) to this file
        #[arg(long)]
        speak: Option<PathBuf>,
    },

    /// Start an interactive chat session
    Chat {
        /// Stable user/session identifier
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Start HTTP chat server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Fetch a video's transcript and print it with timestamps
    Transcript {
        /// YouTube URL or video ID
        input: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
