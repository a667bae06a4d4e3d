use crate::unicode::katakana_to_hiragana_char;

use super::convert::romaji_to_kana;

/// Re-express `s` in hiragana.
///
/// Runs of ASCII letters are read as romaji (case-insensitively), katakana
/// is folded onto hiragana, and everything else, hiragana included, is
/// copied through. The function is idempotent.
pub fn to_canonical_script(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run = String::new();

    for c in s.chars() {
        if c.is_ascii_alphabetic() {
            run.push(c.to_ascii_lowercase());
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(katakana_to_hiragana_char(c));
    }
    flush_run(&mut out, &mut run);

    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if !run.is_empty() {
        out.push_str(&romaji_to_kana(run));
        run.clear();
    }
}
