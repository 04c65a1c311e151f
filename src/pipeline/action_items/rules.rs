//! Rule-based action item extraction.
//!
//! Structural signals first (bullets, numbering, checkboxes, keyword prefixes).
//! Only when no line carries any structural signal does the imperative-sentence
//! heuristic run over the whole text.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{dedupe_case_insensitive, ActionItemExtractor, ActionItemList};

/// Leading list marker: `-`, `*`, `•` or `<digits>.`, followed by required whitespace.
static BULLET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+\.)\s+").unwrap());

/// Sentence terminator followed by whitespace.
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z']+").unwrap());

/// Line prefixes (lowercased) that mark a line as an action.
pub const KEYWORD_PREFIXES: &[&str] = &["todo:", "action:", "next:"];

/// Checkbox tokens, stripped case-sensitively in this order.
const CHECKBOX_MARKERS: &[&str] = &["[ ]", "[todo]"];

/// First words that make a sentence count as a task.
pub const IMPERATIVE_STARTERS: &[&str] = &[
    "add",
    "create",
    "implement",
    "fix",
    "update",
    "write",
    "check",
    "verify",
    "refactor",
    "document",
    "design",
    "investigate",
];

/// Everything `str::splitlines` would break on.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Check whether a single line reads as an action line.
pub fn is_action_line(line: &str) -> bool {
    let stripped = line.trim().to_lowercase();
    if stripped.is_empty() {
        return false;
    }
    if BULLET_PREFIX.is_match(&stripped) {
        return true;
    }
    if KEYWORD_PREFIXES
        .iter()
        .any(|prefix| stripped.starts_with(prefix))
    {
        return true;
    }
    stripped.contains("[ ]") || stripped.contains("[todo]")
}

/// Strip leading bullet/numbering and checkbox tokens, trimming after each strip.
///
/// Repeats until nothing more comes off, so nested markers (`- [todo] [ ] x`)
/// never survive. Keyword prefixes are left in place.
pub fn strip_markers(line: &str) -> &str {
    let mut rest = line.trim();
    loop {
        let before = rest.len();

        if let Some(m) = BULLET_PREFIX.find(rest) {
            rest = rest[m.end()..].trim();
        }
        for marker in CHECKBOX_MARKERS {
            if let Some(stripped) = rest.strip_prefix(marker) {
                rest = stripped.trim();
            }
        }

        if rest.len() == before {
            return rest;
        }
    }
}

/// Split text on `.`, `!` or `?` followed by whitespace. The terminator stays
/// with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BOUNDARY.find_iter(text) {
        // Terminators are single-byte ASCII.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);

    sentences
}

/// Whether the first alphabetic word of `sentence` is a known task verb.
pub fn looks_imperative(sentence: &str) -> bool {
    WORD.find(sentence)
        .map(|first| {
            let first = first.as_str().to_lowercase();
            IMPERATIVE_STARTERS.contains(&first.as_str())
        })
        .unwrap_or(false)
}

/// Deterministic line classifier with an imperative-sentence fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    fn structural_candidates(text: &str) -> Vec<String> {
        text.split(LINE_BREAKS)
            .map(str::trim)
            .filter(|line| !line.is_empty() && is_action_line(line))
            .map(strip_markers)
            .filter(|cleaned| !cleaned.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn imperative_candidates(text: &str) -> Vec<String> {
        split_sentences(text)
            .into_iter()
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty() && looks_imperative(sentence))
            .map(strip_markers)
            .filter(|cleaned| !cleaned.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ActionItemExtractor for RuleBasedExtractor {
    fn extract(&self, text: &str) -> ActionItemList {
        let mut candidates = Self::structural_candidates(text);
        tracing::debug!(candidates = candidates.len(), "classified action lines");

        if candidates.is_empty() {
            candidates = Self::imperative_candidates(text);
            tracing::debug!(
                candidates = candidates.len(),
                "no structural markers, used imperative-sentence fallback"
            );
        }

        dedupe_case_insensitive(candidates)
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
