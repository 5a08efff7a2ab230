use crate::error::{Result, SubtransError};

/// Target languages offered to users, by display name.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "French",
    "Spanish (Spain)",
    "Spanish (Latin America)",
    "German",
    "Italian",
    "Portuguese",
    "Portuguese (Brazil)",
    "Chinese (Mandarin)",
    "Japanese",
    "Korean",
    "Arabic",
    "Russian",
    "Dutch",
    "Turkish",
    "Polish",
    "Swedish",
    "Danish",
    "Norwegian",
    "Finnish",
    "Greek",
    "Hebrew",
    "Hindi",
    "Thai",
    "Vietnamese",
    "Indonesian",
    "Malay",
    "Tagalog",
    "Bengali",
    "Urdu",
    "Punjabi",
    "Tamil",
    "Filipino",
];

/// Resolve user input to the display name used in prompts and file names.
///
/// Display names match case-insensitively and ISO 639-1 codes map to their
/// display name. Anything else is rejected unless `allow_custom` is set, in
/// which case the trimmed input is used verbatim.
pub fn resolve(input: &str, allow_custom: bool) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SubtransError::UnsupportedLanguage("(empty)".to_string()));
    }

    if let Some(name) = SUPPORTED_LANGUAGES
        .iter()
        .find(|name| name.eq_ignore_ascii_case(trimmed))
    {
        return Ok(name.to_string());
    }

    if let Some(name) = code_to_name(trimmed) {
        return Ok(name.to_string());
    }

    if allow_custom {
        Ok(trimmed.to_string())
    } else {
        Err(SubtransError::UnsupportedLanguage(trimmed.to_string()))
    }
}

/// Convert a language code to the display name used in prompts
fn code_to_name(code: &str) -> Option<&'static str> {
    let name = match code.to_lowercase().as_str() {
        "fr" => "French",
        "es" => "Spanish (Spain)",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "pt-br" => "Portuguese (Brazil)",
        "zh" => "Chinese (Mandarin)",
        "ja" => "Japanese",
        "ko" => "Korean",
        "ar" => "Arabic",
        "ru" => "Russian",
        "nl" => "Dutch",
        "tr" => "Turkish",
        "pl" => "Polish",
        "sv" => "Swedish",
        "da" => "Danish",
        "no" => "Norwegian",
        "fi" => "Finnish",
        "el" => "Greek",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "ms" => "Malay",
        "tl" => "Tagalog",
        "bn" => "Bengali",
        "ur" => "Urdu",
        "pa" => "Punjabi",
        "ta" => "Tamil",
        _ => return None,
    };
    Some(name)
}

/// File-name-safe form of a language label, e.g. `Spanish (Spain)` -> `Spanish_Spain`.
pub fn file_label(language: &str) -> String {
    language
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
