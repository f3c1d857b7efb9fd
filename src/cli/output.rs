//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Longest single transport message.
pub const MAX_REPLY_CHARS: usize = 3800;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an assistant reply, split into labelled parts when long.
    pub fn reply(text: &str) {
        for part in label_parts(split_reply(text, MAX_REPLY_CHARS)) {
            println!("\n{} {}\n", style("vidbrief:").cyan().bold(), part);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Split a reply on line boundaries into pieces of at most `max_chars`
/// characters (counting one separator per line).
///
/// Blank lines are kept as a single space; a single line longer than the
/// limit becomes its own oversized piece.
pub fn split_reply(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line = match line.trim_end() {
            "" => " ",
            trimmed => trimmed,
        };
        let line_len = line.chars().count() + 1;
        if !current.is_empty() && current_len + line_len > max_chars {
            chunks.push(current.join("\n"));
            current.clear();
            current_len = 0;
        }
        current.push(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

/// Prefix each piece with `[Part i/n]` when there is more than one.
pub fn label_parts(chunks: Vec<String>) -> Vec<String> {
    let total = chunks.len();
    if total <= 1 {
        return chunks;
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Part {}/{}]\n{}", i + 1, total, chunk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reply_is_one_part() {
        let parts = label_parts(split_reply("  hello\nworld  ", MAX_REPLY_CHARS));
        assert_eq!(parts, vec!["hello\nworld"]);
        assert!(split_reply("   ", MAX_REPLY_CHARS).is_empty());
    }

    #[test]
    fn test_splits_on_line_boundaries() {
        // Each line costs 5 (4 chars + separator).
        let chunks = split_reply("aaaa\nbbbb\n\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb", " \ncccc"]);

        let parts = label_parts(chunks);
        assert_eq!(parts[0], "[Part 1/2]\naaaa\nbbbb");
        assert_eq!(parts[1], "[Part 2/2]\n \ncccc");
    }

    #[test]
    fn test_long_line_is_not_broken() {
        let long = "x".repeat(50);
        let chunks = split_reply(&format!("hi\n{long}\nbye"), 20);
        assert_eq!(chunks, vec!["hi".to_string(), long, "bye".to_string()]);
    }

    #[test]
    fn test_full_transcript_sized_reply() {
        let text: String = (0..2000)
            .map(|i| format!("[00:{:02}] line number {}\n", i % 60, i))
            .collect();
        let chunks = split_reply(&text, MAX_REPLY_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_REPLY_CHARS));
    }
}
