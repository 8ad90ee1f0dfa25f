//! Languages accepted by the Google Translate speech endpoint.

use crate::error::{Result, TtsError};

/// Supported language codes and their display names.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bengali"),
    ("bs", "Bosnian"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("gu", "Gujarati"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("iw", "Hebrew"),
    ("ja", "Japanese"),
    ("jw", "Javanese"),
    ("km", "Khmer"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lv", "Latvian"),
    ("ml", "Malayalam"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("my", "Myanmar (Burmese)"),
    ("ne", "Nepali"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("si", "Sinhala"),
    ("sk", "Slovak"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("su", "Sundanese"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tl", "Filipino"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese (Mandarin)"),
    ("zh-CN", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Mandarin/Taiwan)"),
];

/// Resolve a user-supplied language code to the code sent to the endpoint.
///
/// Matching is case-insensitive. Regional variants without their own entry
/// (`en-us`, `pt-BR`) fall back to the base language.
pub fn resolve(code: &str) -> Result<&'static str> {
    let code = code.trim();
    if let Some(known) = lookup(code) {
        return Ok(known);
    }

    code.split(['-', '_'])
        .next()
        .filter(|base| base.len() < code.len())
        .and_then(lookup)
        .ok_or_else(|| TtsError::UnsupportedLanguage(code.to_string()))
}

fn lookup(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(known, _)| *known)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact() {
        assert_eq!(resolve("en").unwrap(), "en");
        assert_eq!(resolve("zh-cn").unwrap(), "zh-CN");
        assert_eq!(resolve(" FR ").unwrap(), "fr");
    }

    #[test]
    fn test_resolve_regional_variant() {
        assert_eq!(resolve("en-us").unwrap(), "en");
        assert_eq!(resolve("pt_BR").unwrap(), "pt");
    }

    #[test]
    fn test_resolve_unknown() {
        assert_eq!(
            resolve("xx"),
            Err(TtsError::UnsupportedLanguage("xx".to_string()))
        );
        assert!(resolve("xx-yy").is_err());
        assert!(resolve("").is_err());
    }
}
