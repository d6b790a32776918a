/*!
 * Deterministic post-translation replacements.
 *
 * The table is built once from configuration and shared read-only
 * (`Arc<ModernFixes>`) by every translation call. Reloading means building
 * a new table and swapping the `Arc`.
 */

use crate::app_config::ModernFixRule;
use crate::language_utils;

/// Replacement table keyed by target language
#[derive(Debug, Clone, Default)]
pub struct ModernFixes {
    rules: Vec<ModernFixRule>,
}

impl ModernFixes {
    pub fn new(rules: Vec<ModernFixRule>) -> Self {
        let rules = rules.into_iter().filter(|r| !r.from.is_empty()).collect();
        Self { rules }
    }

    /// Table without any rule
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply, in table order, every rule targeting `target_language` or "*"
    pub fn apply(&self, text: &str, target_language: &str) -> String {
        self.rules
            .iter()
            .filter(|rule| {
                rule.target == "*" || language_utils::language_codes_match(&rule.target, target_language)
            })
            .fold(text.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
    }
}
