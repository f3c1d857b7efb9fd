//! Interactive chat command.

use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat loop for one user session.
///
/// Sessions persist between runs, so a loaded video is still available
/// the next time the same user starts chatting.
pub async fn run_chat(user: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Converse) {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    let assistant = Assistant::from_settings(&settings)?;

    println!("\n{}", style("vidbrief chat").bold().cyan());
    println!(
        "{}\n",
        style("Paste a YouTube link, use /help for commands, or 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Working...");
        let result = assistant.handle_message(user, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => Output::reply(&reply),
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Ok(())
}
