//! YouTube video ID extraction.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"));

static EMBEDDED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://[^\s]+)").expect("Invalid regex"));

/// Loose patterns for inputs the URL parser cannot make sense of.
static FALLBACK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"v=([A-Za-z0-9_-]{11})",
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"youtube\.com/(?:shorts|embed|live)/([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Punctuation that commonly trails a URL pasted into a sentence.
const URL_TRAILING_CHARS: &[char] = &[')', '.', ',', '!', '?', '"', '\''];

fn valid_video_id(value: &str) -> Option<String> {
    let value = value.trim();
    VIDEO_ID.is_match(value).then(|| value.to_string())
}

/// Pull the first http(s) URL out of free text, without trailing punctuation.
fn find_url(text: &str) -> Option<&str> {
    let found = EMBEDDED_URL.captures(text.trim())?.get(1)?.as_str();
    Some(found.trim_end_matches(URL_TRAILING_CHARS))
}

fn from_parsed_url(url: &Url) -> Option<String> {
    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        if let Some(id) = valid_video_id(&v) {
            return Some(id);
        }
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    let parts: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if host.ends_with("youtu.be") {
        if let Some(id) = parts.first().and_then(|p| valid_video_id(p)) {
            return Some(id);
        }
    }

    if let [kind, candidate, ..] = parts.as_slice() {
        if matches!(*kind, "shorts" | "embed" | "live") {
            if let Some(id) = valid_video_id(candidate) {
                return Some(id);
            }
        }
    }

    None
}

/// Extract an 11-character YouTube video ID from a URL or a message containing one.
///
/// Recognizes `watch?v=`, `youtu.be/<id>`, and `/shorts/`, `/embed/`, `/live/` paths.
pub fn extract_video_id(text: &str) -> Option<String> {
    let candidate = find_url(text).unwrap_or_else(|| text.trim());

    if let Ok(url) = Url::parse(candidate) {
        if let Some(id) = from_parsed_url(&url) {
            return Some(id);
        }
    }

    FALLBACK_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(candidate)
            .and_then(|caps| caps.get(1))
            .and_then(|m| valid_video_id(m.as_str()))
    })
}

/// Whether a message looks like it carries a YouTube link.
pub fn mentions_video_link(text: &str) -> bool {
    text.contains("youtube.com") || text.contains("youtu.be")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_url_forms() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=5"), id);
        assert_eq!(extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/live/dQw4w9WgXcQ?si=x"), id);
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            id
        );
    }

    #[test]
    fn test_extract_video_id_in_message() {
        assert_eq!(
            extract_video_id("check this out (https://youtu.be/dQw4w9WgXcQ)!"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_invalid() {
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_mentions_video_link() {
        assert!(mentions_video_link("see https://youtu.be/x"));
        assert!(!mentions_video_link("hello"));
    }
}
