//! Character-level Unicode classification for Japanese text.

/// Check the full Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF). Includes the prolonged
/// sound mark ー and the middle dot ・, which have no hiragana counterpart.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

/// Fold one katakana character onto hiragana.
///
/// Only ァ..ヶ and the iteration marks ヽヾ have hiragana counterparts; every
/// other character, ー and ・ included, is returned unchanged.
pub fn katakana_to_hiragana_char(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' | '\u{30FD}'..='\u{30FE}' => {
            char::from_u32(c as u32 - 0x60).unwrap_or(c)
        }
        _ => c,
    }
}

/// Check if a string is a kana-only reading (either script, plus ー).
pub fn is_kana_reading(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| is_hiragana(c) || is_katakana(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_katakana_to_hiragana_char() {
        assert_eq!(katakana_to_hiragana_char('キ'), 'き');
        assert_eq!(katakana_to_hiragana_char('ョ'), 'ょ');
        assert_eq!(katakana_to_hiragana_char('ヴ'), 'ゔ');
        assert_eq!(katakana_to_hiragana_char('ヽ'), 'ゝ');
        assert_eq!(katakana_to_hiragana_char('ヾ'), 'ゞ');
        assert_eq!(katakana_to_hiragana_char('a'), 'a');
        assert_eq!(katakana_to_hiragana_char('ひ'), 'ひ');
    }

    #[test]
    fn test_marks_without_counterpart() {
        assert_eq!(katakana_to_hiragana_char('ー'), 'ー');
        assert_eq!(katakana_to_hiragana_char('・'), '・');
    }

    #[test]
    fn test_is_kana_reading() {
        assert!(is_kana_reading("かんじ"));
        assert!(is_kana_reading("らーめん"));
        assert!(is_kana_reading("カタカナ"));
        assert!(!is_kana_reading("漢字"));
        assert!(!is_kana_reading("abc"));
        assert!(!is_kana_reading(""));
    }

    #[test]
    fn test_char_classification() {
        assert!(is_hiragana('あ'));
        assert!(!is_hiragana('ア'));
        assert!(is_katakana('ア'));
        assert!(is_katakana('ー'));
        assert!(!is_katakana('あ'));
    }
}
