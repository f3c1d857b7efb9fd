//! Output-language handling.
//!
//! Users may name any language; a handful of common spellings and typos are
//! mapped onto a canonical display name, everything else is cleaned up and
//! passed through to the prompts verbatim.

use crate::text::{collapse_whitespace, truncate_chars};
use regex::Regex;
use std::sync::LazyLock;

/// Language used when nothing else has been requested.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Maximum length of a free-form language name.
const MAX_LANGUAGE_CHARS: usize = 40;

/// Characters stripped from both ends of a language name.
const STRIP_CHARS: &[char] = &[' ', '.', ',', ':', ';', '!', '?'];

/// Known spellings, keyed by lowercase alias.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("english", "English"),
    ("hindi", "Hindi"),
    ("kannada", "Kannada"),
    ("kanada", "Kannada"),
    ("tamil", "Tamil"),
    ("telugu", "Telugu"),
    ("telgu", "Telugu"),
    ("french", "French"),
    ("spanish", "Spanish"),
    ("german", "German"),
];

/// Request patterns, tried in priority order.
static REQUEST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:summari[sz]e|summary|answer|respond|reply)\s+(?:in|into)\s+([^\n,.!?;:]{2,50})",
        r"(?i)\b(?:in|into)\s+([^\n,.!?;:]{2,50})",
        r"(?i)\blanguage\s*[:=]?\s*([^\n,.!?;:]{2,50})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Words that end a captured language phrase ("in French for my team").
static PHRASE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:for|with|using|please|and)\b").expect("Invalid regex")
});

fn lookup_alias(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| *canonical)
}

/// Canonicalize a free-form language name.
///
/// Known aliases map to their display form; anything else has its whitespace
/// collapsed, surrounding punctuation removed and is capped at 40 characters.
/// Empty input yields [`DEFAULT_LANGUAGE`]. Applying this twice gives the
/// same result as applying it once.
pub fn normalize_language(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(canonical) = lookup_alias(trimmed) {
        return canonical.to_string();
    }

    let collapsed = collapse_whitespace(trimmed);
    let cleaned = collapsed.trim_matches(STRIP_CHARS);
    if cleaned.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }

    let capped = truncate_chars(cleaned, MAX_LANGUAGE_CHARS).trim_matches(STRIP_CHARS);
    match lookup_alias(capped) {
        Some(canonical) => canonical.to_string(),
        None => capped.to_string(),
    }
}

/// Find a language request inside conversational text, e.g.
/// "summarize in French for me" or "language: Tamil".
pub fn extract_requested_language(text: &str) -> Option<String> {
    let source = text.trim();

    for pattern in REQUEST_PATTERNS.iter() {
        let Some(caps) = pattern.captures(source) else {
            continue;
        };
        let Some(phrase) = caps.get(1) else {
            continue;
        };

        let candidate = collapse_whitespace(phrase.as_str());
        let candidate = candidate.trim_matches(STRIP_CHARS);
        let candidate = PHRASE_BOUNDARY
            .splitn(candidate, 2)
            .next()
            .unwrap_or_default()
            .trim();

        if candidate.is_empty() {
            continue;
        }
        return Some(normalize_language(candidate));
    }

    None
}

/// Canonical names offered as examples in help text.
pub fn example_languages() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = LANGUAGE_ALIASES.iter().map(|(_, c)| *c).collect();
    names.sort_unstable();
    names.dedup();
    names
}
