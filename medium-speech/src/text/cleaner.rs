//! Per-line normalization before text is sent to a speech provider.

/// TTS-safe replacement for characters that trip up speech engines.
fn replacement(c: char) -> Option<&'static str> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{2032}' => Some("'"),
        '\u{201c}' | '\u{201d}' | '\u{2033}' | '\u{00ab}' | '\u{00bb}' => Some("\""),
        // Non-breaking hyphen through horizontal bar
        '\u{2011}'..='\u{2015}' => Some("-"),
        '\u{2026}' => Some("..."),
        '\u{00a0}' | '\u{2009}' | '\u{202f}' => Some(" "),
        '\u{200b}'..='\u{200d}' | '\u{feff}' => Some(""),
        _ => None,
    }
}

/// Clean a single line of text for TTS.
///
/// Replaces typographic quotes, dashes and invisible characters, drops
/// control characters, and collapses whitespace runs into single spaces.
/// The result is trimmed and may be empty.
pub fn clean_text(line: &str) -> String {
    let mut replaced = String::with_capacity(line.len());

    for c in line.chars() {
        match replacement(c) {
            Some(r) => replaced.push_str(r),
            None if c == '\t' => replaced.push(' '),
            None if c.is_control() => {}
            None => replaced.push(c),
        }
    }

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
