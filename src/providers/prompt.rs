use crate::language_utils;

/// Rules shared by every translation prompt
const STRICT_RULES: &str = "STRICT RULES:
1. DO NOT translate or transliterate abbreviations or acronyms (e.g., AI, NASA, API, URL)
2. DO NOT translate or transliterate FULLY CAPITALIZED words (e.g., PDF, HTML, FILE, SAVE, ML, JSON) - keep them exactly as written
3. DO NOT modify formatting or punctuation
4. Keep placeholders such as __PT0__ exactly as written
5. Maintain technical terms, brand names, and code terms as-is
6. Respond with ONLY the translation - no extra notes, no formatting";

fn display_name(code: &str) -> String {
    match code.trim().to_lowercase().as_str() {
        "en" | "eng" | "english" => "English".to_string(),
        "hi" | "hin" | "hindi" => "Hindi".to_string(),
        other => language_utils::get_language_name(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Build the instruction prompt for a single segment
pub fn build_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    let source = display_name(source_language);
    let target = display_name(target_language);

    let goal = match (source.as_str(), target.as_str()) {
        ("English", "Hindi") => {
            "Your task is to translate the following English text into accurate, grammatically correct, and natural Hindi.".to_string()
        }
        ("Hindi", "English") => {
            "Your task is to translate the following Hindi text into fluent, natural English.".to_string()
        }
        _ => format!(
            "Your task is to translate the following {} text into natural {}.",
            source, target
        ),
    };

    format!(
        "You are a highly skilled {source}-to-{target} translator.\n\n{goal}\n\n{rules}\n\n{source}: {text}\n\n{target}:",
        source = source,
        target = target,
        goal = goal,
        rules = STRICT_RULES,
        text = text
    )
}

/// Drop a leading "English:" / "Hindi:" style label a model may echo
pub fn strip_label(reply: &str, target_language: &str) -> String {
    let reply = reply.trim();
    let labels = [display_name(target_language), "English".to_string(), "Hindi".to_string()];

    for label in labels {
        let prefix = format!("{}:", label.to_lowercase());
        if reply.to_lowercase().starts_with(&prefix) {
            if let Some((_, rest)) = reply.split_once(':') {
                return rest.trim().to_string();
            }
        }
    }

    reply.to_string()
}
