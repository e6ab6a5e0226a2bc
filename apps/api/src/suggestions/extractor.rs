//! Suggestion extractor: mines gift suggestions out of free-form model output.
//!
//! Generated text is unreliable. The same model may answer with
//! `Gift: X - Description: Y` lines, a numbered list, markdown emphasis, the
//! description on the following line, or simply echo the template back. The
//! extractor is best-effort and never fails: anything it cannot read is skipped.
//! Suggestions are assumed to fit on one line (plus an optional
//! `Description:` line right after it).

use std::sync::OnceLock;

use regex::Regex;

use crate::suggestions::models::{Suggestion, MISSING_DESCRIPTION};

/// Default cap on returned suggestions.
pub const MAX_SUGGESTIONS: usize = 5;

/// Template phrases that mean the model echoed the prompt instead of answering.
const TEMPLATE_PHRASES: &[&str] = &["gift name", "brief description", "name of the gift"];

/// Longest label the generic `<label>: <text>` fallback accepts.
const MAX_FALLBACK_LABEL_CHARS: usize = 80;

static MARKER_PATTERN: OnceLock<Regex> = OnceLock::new();
static DESCRIPTION_PATTERN: OnceLock<Regex> = OnceLock::new();
static NAME_END_PATTERN: OnceLock<Regex> = OnceLock::new();
static NUMBERED_PATTERN: OnceLock<Regex> = OnceLock::new();
static NUMBERED_SEPARATOR_PATTERN: OnceLock<Regex> = OnceLock::new();
static LABELED_LINE_PATTERN: OnceLock<Regex> = OnceLock::new();
static BRACKETED_PATTERN: OnceLock<Regex> = OnceLock::new();

// `Gift:`, `Gift 1:`, `Gift #1:`, `Gift idea:`
fn get_marker_pattern() -> &'static Regex {
    MARKER_PATTERN.get_or_init(|| Regex::new(r"(?i)\bgift(?:\s+idea)?(?:\s*#?\d+)?\s*:").unwrap())
}

fn get_description_pattern() -> &'static Regex {
    DESCRIPTION_PATTERN.get_or_init(|| Regex::new(r"(?i)\bdescription\s*:").unwrap())
}

// A colon, or a dash that follows whitespace (so `Wi-Fi` survives).
fn get_name_end_pattern() -> &'static Regex {
    NAME_END_PATTERN.get_or_init(|| Regex::new(r":|\s[-–—]").unwrap())
}

fn get_numbered_pattern() -> &'static Regex {
    NUMBERED_PATTERN.get_or_init(|| Regex::new(r"^\s*\d{1,3}[.)]\s+(.+)$").unwrap())
}

fn get_numbered_separator_pattern() -> &'static Regex {
    NUMBERED_SEPARATOR_PATTERN.get_or_init(|| Regex::new(r":|\s[-–—]\s").unwrap())
}

fn get_labeled_line_pattern() -> &'static Regex {
    LABELED_LINE_PATTERN.get_or_init(|| Regex::new(r"^\s*([^:]+?)\s*:\s*(.+)$").unwrap())
}

fn get_bracketed_pattern() -> &'static Regex {
    BRACKETED_PATTERN.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap())
}

/// Line-oriented suggestion parser, parameterized by result cap and the
/// description used when none is found.
#[derive(Debug, Clone)]
pub struct SuggestionExtractor {
    max_suggestions: usize,
    missing_description: String,
}

impl Default for SuggestionExtractor {
    fn default() -> Self {
        Self::new(MAX_SUGGESTIONS, MISSING_DESCRIPTION)
    }
}

impl SuggestionExtractor {
    pub fn new(max_suggestions: usize, missing_description: impl Into<String>) -> Self {
        Self {
            max_suggestions,
            missing_description: missing_description.into(),
        }
    }

    /// Extracts at most `max_suggestions` suggestions in order of appearance.
    ///
    /// Marker lines (`Gift: ...`) and numbered lines (`1. Name: text`) are
    /// collected first. Only when neither yields anything is the first generic
    /// `label: text` line used as a single suggestion.
    pub fn extract(&self, text: &str) -> Vec<Suggestion> {
        if self.max_suggestions == 0 {
            return Vec::new();
        }

        let lines: Vec<&str> = text.lines().collect();
        let mut suggestions = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let candidate = if is_marker_line(line) {
                self.parse_marker_line(line, lines.get(index + 1).copied())
            } else {
                parse_numbered_line(line)
            };

            if let Some(suggestion) = candidate {
                suggestions.push(suggestion);
                if suggestions.len() == self.max_suggestions {
                    break;
                }
            }
        }

        if suggestions.is_empty() {
            suggestions.extend(parse_first_labeled_line(&lines));
        }

        suggestions
    }

    fn parse_marker_line(&self, line: &str, next_line: Option<&str>) -> Option<Suggestion> {
        let marker = get_marker_pattern().find(line)?;
        let rest = &line[marker.end()..];

        let (name_segment, inline_description) = match get_description_pattern().find(rest) {
            Some(found) => (&rest[..found.start()], Some(clean(&rest[found.end()..]))),
            None => (rest, None),
        };

        let name = name_before_delimiter(name_segment);
        if name.is_empty() || is_placeholder(name) {
            return None;
        }

        let description = inline_description
            .filter(|d| !d.is_empty())
            .or_else(|| next_line.and_then(description_on_own_line))
            .unwrap_or(self.missing_description.as_str());
        if is_placeholder(description) {
            return None;
        }

        Some(Suggestion::new(name, description))
    }
}

/// Runs the default extractor. Accepts `&str` or `Option<&str>`; an absent
/// completion yields no suggestions.
pub fn extract_suggestions<'a>(text: impl Into<Option<&'a str>>) -> Vec<Suggestion> {
    SuggestionExtractor::default().extract(text.into().unwrap_or_default())
}

fn is_marker_line(line: &str) -> bool {
    get_marker_pattern().is_match(line)
}

fn name_before_delimiter(segment: &str) -> &str {
    let end = get_name_end_pattern()
        .find(segment)
        .map(|m| m.start())
        .unwrap_or(segment.len());
    clean(&segment[..end])
}

/// The text after `Description:` on a line that is not itself a new suggestion.
fn description_on_own_line(line: &str) -> Option<&str> {
    if is_marker_line(line) || get_numbered_pattern().is_match(line) {
        return None;
    }
    let found = get_description_pattern().find(line)?;
    Some(clean(&line[found.end()..])).filter(|d| !d.is_empty())
}

/// `1. Name: text`, `2) Name - text`, `3. Name - Description: text`, or a
/// bare `4. Name`. A missing description stays empty rather than using the
/// sentinel.
fn parse_numbered_line(line: &str) -> Option<Suggestion> {
    let body = get_numbered_pattern().captures(line)?.get(1)?.as_str();

    let (name, description) = match get_description_pattern().find(body) {
        Some(found) => (
            name_before_delimiter(&body[..found.start()]),
            clean(&body[found.end()..]),
        ),
        None => match get_numbered_separator_pattern().find(body) {
            Some(separator) => (
                clean(&body[..separator.start()]),
                clean(&body[separator.end()..]),
            ),
            None => (clean(body), ""),
        },
    };

    if description.starts_with("//") {
        return None;
    }
    if name.is_empty() || is_placeholder(name) || is_placeholder(description) {
        return None;
    }

    Some(Suggestion::new(name, description))
}

/// Last resort when nothing structured was found: the first `label: text`
/// line that is not template residue.
fn parse_first_labeled_line(lines: &[&str]) -> Option<Suggestion> {
    lines
        .iter()
        .filter(|line| !is_marker_line(line) && !get_bracketed_pattern().is_match(line))
        .find_map(|line| {
            let captures = get_labeled_line_pattern().captures(line)?;
            let label = clean(captures.get(1)?.as_str());
            let text = clean(captures.get(2)?.as_str());

            let usable = !label.is_empty()
                && label.chars().count() <= MAX_FALLBACK_LABEL_CHARS
                && !label.eq_ignore_ascii_case("description")
                && !text.is_empty()
                && !text.starts_with("//")
                && !is_placeholder(label)
                && !is_placeholder(text);

            usable.then(|| Suggestion::new(label, text))
        })
}

/// Bracket-enclosed template text or a bare template phrase.
fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    let bracketed = [('[', ']'), ('<', '>'), ('{', '}')]
        .iter()
        .any(|&(open, close)| text.len() >= 2 && text.starts_with(open) && text.ends_with(close));

    bracketed
        || TEMPLATE_PHRASES
            .iter()
            .any(|phrase| text.eq_ignore_ascii_case(phrase))
}

/// Trims whitespace plus markdown emphasis, quotes and stray dashes.
fn clean(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '`' | '"' | '-' | '–' | '—'))
}
