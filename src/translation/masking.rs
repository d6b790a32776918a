/*!
 * Placeholder masking for protected sub-tokens.
 *
 * Acronyms embedded inside translatable text (`NASA's`, `API-based`) are
 * swapped for placeholders before the text reaches a provider and swapped
 * back afterwards. Placeholders look like `__PT0__`; the prefix gets a salt
 * when the input already contains it, so a placeholder can never match
 * text that was there before masking.
 */

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};

/// Abbreviation-like words that survive inside a translatable segment
static EMBEDDED_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:PhD|[A-Z][A-Z0-9]+)\b").expect("valid regex"));

const PLACEHOLDER_BASE: &str = "__PT";

/// One placeholder and the text it stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskEntry {
    pub placeholder: String,
    pub original: String,
}

/// Placeholders inserted into one piece of text, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskMap {
    entries: Vec<MaskEntry>,
}

impl MaskMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[MaskEntry] {
        &self.entries
    }

    /// Put the original tokens back into `translated`.
    ///
    /// Matching ignores case. Returns `None` when a placeholder is missing
    /// or duplicated, which means the provider damaged it.
    pub fn unmask(&self, translated: &str) -> Option<String> {
        let mut result = translated.to_string();

        for entry in &self.entries {
            let pattern = RegexBuilder::new(&regex::escape(&entry.placeholder))
                .case_insensitive(true)
                .build()
                .ok()?;

            if pattern.find_iter(&result).count() != 1 {
                return None;
            }
            result = pattern
                .replacen(&result, 1, NoExpand(&entry.original))
                .into_owned();
        }

        Some(result)
    }
}

fn choose_prefix(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut salt = 0usize;
    loop {
        let prefix = if salt == 0 {
            PLACEHOLDER_BASE.to_string()
        } else {
            format!("{}{}X", PLACEHOLDER_BASE, salt)
        };
        if !lower.contains(&prefix.to_lowercase()) {
            return prefix;
        }
        salt += 1;
    }
}

/// Replace embedded protected tokens with placeholders
pub fn mask(text: &str) -> (String, MaskMap) {
    if !EMBEDDED_TOKEN_RE.is_match(text) {
        return (text.to_string(), MaskMap::default());
    }

    let prefix = choose_prefix(text);
    let mut map = MaskMap::default();
    let mut masked = String::with_capacity(text.len());
    let mut last = 0;

    for found in EMBEDDED_TOKEN_RE.find_iter(text) {
        let placeholder = format!("{}{}__", prefix, map.entries.len());
        masked.push_str(&text[last..found.start()]);
        masked.push_str(&placeholder);
        map.entries.push(MaskEntry {
            placeholder,
            original: found.as_str().to_string(),
        });
        last = found.end();
    }
    masked.push_str(&text[last..]);

    (masked, map)
}
