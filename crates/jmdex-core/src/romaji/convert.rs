use super::table::RomajiTable;

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'i' | 'u' | 'e' | 'o')
}

/// Doubled consonant ("kk", "pp") or Hepburn "tch" marks a geminate.
fn is_sokuon(first: char, second: char) -> bool {
    (first == second && first != 'n' && !is_vowel(first)) || (first == 't' && second == 'c')
}

/// Convert a run of lowercase ASCII romaji to hiragana.
///
/// Every input character is consumed: sequences with no mapping are emitted
/// unchanged, so `romaji_to_kana(x)` never loses text. A trailing or
/// consonant-preceding "n" becomes "ん".
pub fn romaji_to_kana(romaji: &str) -> String {
    let table = RomajiTable::builtin();
    let mut kana = String::with_capacity(romaji.len() * 3);
    let mut rest = romaji;

    while let Some(first) = rest.chars().next() {
        if let Some((len, mapped)) = table.longest_prefix(rest) {
            kana.push_str(mapped);
            rest = &rest[len..];
            continue;
        }

        let tail = &rest[first.len_utf8()..];
        match tail.chars().next() {
            Some(second) if is_sokuon(first, second) => kana.push('っ'),
            // Every "n" + vowel/"y" syllable is in the table, so an
            // unmatched "n" stands alone.
            _ if first == 'n' => kana.push('ん'),
            _ => kana.push(first),
        }
        rest = tail;
    }

    kana
}
