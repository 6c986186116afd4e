/// Nickname validity rules
///
/// A pure predicate over candidate tokens. The same validator re-checks
/// spell-corrected candidates before they replace an original.
use crate::config::NicknameRules;

use super::text_extraction::is_native_char;

/// Applies `NicknameRules` to candidate strings
#[derive(Debug, Clone)]
pub struct NicknameValidator {
    rules: NicknameRules,
    /// Lowercased exclusion words, computed once
    exclusions: Vec<String>,
}

impl Default for NicknameValidator {
    fn default() -> Self {
        Self::new(NicknameRules::default())
    }
}

impl NicknameValidator {
    pub fn new(rules: NicknameRules) -> Self {
        let exclusions = rules
            .exclusion_words
            .iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        Self { rules, exclusions }
    }

    pub fn rules(&self) -> &NicknameRules {
        &self.rules
    }

    /// Check whether `text` looks like a player nickname
    ///
    /// Rules, in order:
    /// - length (in characters) within `[min_length, max_length]`
    /// - only Hangul syllables, ASCII letters and ASCII digits
    /// - not all digits
    /// - pure-Latin tokens at least `min_latin_only_length` long
    /// - no exclusion word contained anywhere (case-insensitive)
    pub fn is_valid(&self, text: &str) -> bool {
        let length = text.chars().count();
        if length < self.rules.min_length || length > self.rules.max_length {
            return false;
        }

        if !text
            .chars()
            .all(|c| is_native_char(c) || c.is_ascii_alphanumeric())
        {
            return false;
        }

        if self.rules.reject_all_digits && text.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        if text.chars().all(|c| c.is_ascii_alphabetic()) && length < self.rules.min_latin_only_length
        {
            return false;
        }

        let lowered = text.to_lowercase();
        !self.exclusions.iter().any(|word| lowered.contains(word.as_str()))
    }

    /// Whether the candidate contains at least one native-script character
    pub fn has_native_chars(text: &str) -> bool {
        text.chars().any(is_native_char)
    }
}
