//! One-shot message command.

use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::{label_parts, split_reply, Output, MAX_REPLY_CHARS};
use crate::config::Settings;
use crate::error::Result;
use crate::voice::AudioClip;
use std::path::Path;

/// Handle a single text or voice message for `user` and print the reply.
///
/// With `speak`, the spoken reply is also written there when voice output is on.
pub async fn run_message(
    user: &str,
    text: Option<&str>,
    audio: Option<&Path>,
    speak: Option<&Path>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Converse) {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    let assistant = Assistant::from_settings(&settings)?;

    let spinner = Output::spinner("Working...");
    let result = match audio {
        Some(path) => match AudioClip::from_path(path).await {
            Ok(clip) => assistant.handle_voice(user, clip).await.map(|turn| {
                if let Some(heard) = &turn.heard {
                    spinner.println(format!("You said: {}", heard));
                }
                turn.reply
            }),
            Err(e) => Err(e),
        },
        None => assistant.handle_message(user, text.unwrap_or_default()).await,
    };
    spinner.finish_and_clear();
    let reply = result?;

    let parts = label_parts(split_reply(&reply, MAX_REPLY_CHARS));
    println!("{}", parts.join("\n\n"));

    if let Some(out) = speak {
        if !assistant.speaks() {
            Output::warning("Voice output is disabled; no audio written.");
        } else if let Some(audio) = assistant.speak(&reply).await {
            tokio::fs::write(out, audio).await?;
            Output::success(&format!("Spoken reply written to {}", out.display()));
        } else {
            Output::warning("Could not synthesize the spoken reply.");
        }
    }

    Ok(())
}
