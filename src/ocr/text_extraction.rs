/// Token extraction from raw recognizer output
///
/// Splits recognized text into lines and words, dropping punctuation and
/// symbols. Duplicates are kept; the assembler deduplicates at the end.
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Characters that may survive extraction: Hangul syllables, Latin letters,
/// digits and whitespace
fn disallowed_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[^\x{AC00}-\x{D7A3}A-Za-z0-9\s]").expect("static token pattern is valid")
    })
}

/// Native-script (Hangul syllable) character
pub fn is_native_char(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// A candidate word and the (zero-based) recognizer line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub source_line: usize,
}

/// Split raw text into cleaned word tokens in recognizer line order
///
/// # Examples
/// ```
/// # use lobby_nickname_ocr::ocr::text_extraction::extract_tokens;
/// let tokens = extract_tokens("  [파티] 로아마스터!\n\nRedDragon  ");
/// let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(words, vec!["파티", "로아마스터", "RedDragon"]);
/// ```
pub fn extract_tokens(raw: &str) -> Vec<Token> {
    // Compose any decomposed jamo so syllables match the allowed range
    let composed: String = raw.nfc().collect();

    composed
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .flat_map(|(source_line, line)| {
            let cleaned = disallowed_chars().replace_all(line, "");
            cleaned
                .split_whitespace()
                .map(|word| Token {
                    text: word.to_string(),
                    source_line,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
