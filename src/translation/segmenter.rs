/*!
 * Token classification and segmentation of block text.
 *
 * A block is split into alternating runs of translatable and protected
 * tokens. Whitespace never changes the classification of a run, so the
 * concatenation of all segments is always the original text.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Abbreviations that are never sent to a provider (compared uppercased)
pub static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AI", "ML", "API", "URL", "PDF", "HTML", "CSS", "JS", "SQL", "JSON", "HTTP", "HTTPS",
        "NASA", "FBI", "CEO", "CTO", "PHD", "MBA", "USA", "UK", "UAE", "CPU", "GPU",
    ]
    .into_iter()
    .collect()
});

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+|\s+").expect("valid token regex"));
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("valid regex"));
static NUMERIC_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\W_]+$").expect("valid regex"));
static URL_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(http|www\.|@|\.com|\.pdf|\.png)").expect("valid regex"));
static ALL_CAPS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_\-.]+$").expect("valid regex"));
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?\d+(\.\d+)*([a-zA-Z]+\d*)?$").expect("valid regex"));

/// A maximal run of tokens sharing one classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment text including the whitespace it absorbed
    pub text: String,
    /// Whether the segment goes to the translation provider
    pub translatable: bool,
}

impl Segment {
    pub fn new(text: impl Into<String>, translatable: bool) -> Self {
        Self {
            text: text.into(),
            translatable,
        }
    }
}

/// Whether a single token must be kept verbatim
pub fn should_skip_translation(token: &str) -> bool {
    let token = token.trim();
    if token.chars().count() < 2 && token != "a" {
        return true;
    }

    let clean = NON_WORD_RE.replace_all(token, "").to_uppercase();
    if ABBREVIATIONS.contains(clean.as_str()) {
        return true;
    }

    NUMERIC_SYMBOL_RE.is_match(token)
        || URL_LIKE_RE.is_match(&token.to_lowercase())
        || ALL_CAPS_RE.is_match(token)
        || VERSION_RE.is_match(token)
}

/// Split `text` into alternating translatable / protected segments.
///
/// Leading whitespace is absorbed by the first segment and whitespace
/// between tokens by the segment that precedes it. Text made only of
/// whitespace yields no segments.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_flag: Option<bool> = None;

    for token in TOKEN_RE.find_iter(text).map(|m| m.as_str()) {
        if token.chars().all(char::is_whitespace) {
            current.push_str(token);
            continue;
        }

        let translatable = !should_skip_translation(token);
        match current_flag {
            Some(flag) if flag != translatable => {
                segments.push(Segment::new(std::mem::take(&mut current), flag));
            }
            _ => {}
        }
        current.push_str(token);
        current_flag = Some(translatable);
    }

    if let Some(flag) = current_flag {
        segments.push(Segment::new(current, flag));
    }

    segments
}
