use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for ISO language code handling and script-based
/// language detection.
///
/// Codes may be given as ISO 639-1 (2-letter), ISO 639-2/T or ISO 639-2/B
/// (3-letter); everything is normalized before comparison.
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// Bibliographic codes that differ from their terminology counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if part2b_to_part2t(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(part2t) = part2b_to_part2t(&normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part2t))?;

    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => code1.trim().eq_ignore_ascii_case(code2.trim()),
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Languages written entirely within the WinAnsi character set of the
/// standard PDF fonts
const WIN_ANSI_LANGUAGES: &[&str] = &[
    "en", "fr", "de", "es", "it", "pt", "nl", "sv", "da", "no", "nb", "nn", "fi", "is", "ca", "eu", "gl", "ga",
    "af", "sq", "id", "ms", "sw", "la",
];

/// Devanagari-script languages, as ISO 639-1 or 639-2/T codes
const DEVANAGARI_LANGUAGES: &[&str] = &["hi", "mr", "ne", "sa", "mai", "kok", "bho", "new"];

const DEVANAGARI_SAMPLE: &str = "अआकखगनमस्ते";

/// Whether text in `code` can be set in Helvetica without an embedded font
pub fn is_win_ansi_language(code: &str) -> bool {
    normalize_to_part1_or_part2t(code).is_ok_and(|c| WIN_ANSI_LANGUAGES.contains(&c.as_str()))
}

/// Characters a font must cover to show text in `code`, `None` for
/// scripts without a known sample
pub fn script_sample(code: &str) -> Option<&'static str> {
    let code = normalize_to_part1_or_part2t(code).ok()?;
    DEVANAGARI_LANGUAGES
        .contains(&code.as_str())
        .then_some(DEVANAGARI_SAMPLE)
}

/// Outcome of the script-count heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLanguage {
    Hindi,
    English,
    Undetermined,
}

impl DetectedLanguage {
    /// ISO 639-1 code, `None` when undetermined
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Hindi => Some("hi"),
            Self::English => Some("en"),
            Self::Undetermined => None,
        }
    }
}

/// Number of characters inspected by [`detect_language`]
pub const DETECTION_SAMPLE_CHARS: usize = 500;

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Guess the language of `text` by counting Devanagari against ASCII
/// letters in the first 500 characters. Hindi wins only on a strict
/// majority; any ASCII letter otherwise means English.
pub fn detect_language(text: &str) -> DetectedLanguage {
    let sample: String = text.chars().take(DETECTION_SAMPLE_CHARS).collect();
    let sample = sample.trim();
    if sample.is_empty() {
        return DetectedLanguage::Undetermined;
    }

    let devanagari = sample.chars().filter(|c| is_devanagari(*c)).count();
    let latin = sample.chars().filter(|c| c.is_ascii_alphabetic()).count();

    if devanagari > latin {
        DetectedLanguage::Hindi
    } else if latin > 0 {
        DetectedLanguage::English
    } else {
        DetectedLanguage::Undetermined
    }
}
