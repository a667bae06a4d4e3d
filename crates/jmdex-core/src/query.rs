//! Read-side lookups over a built index directory.

use std::path::Path;

use crate::build::CONTROL_LANGUAGES;
use crate::romaji::to_canonical_script;
use crate::store::{check_language, fts_phrase, EntryStore, StoreError, StoredEntry};
use crate::unicode::is_kana_reading;

/// An entry together with its glosses in the attached language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHit {
    pub entry: StoredEntry,
    /// One element per stored translation row, each a list of sense groups.
    pub translations: Vec<Vec<Vec<String>>>,
}

/// Open `<dir>/<entry_store>` read-only with `<dir>/<lang>.db` attached.
///
/// `lang` must be one of the languages the index was last built with, so a
/// translation store left behind by an older pass is never attached.
pub fn open_index(dir: &Path, entry_store: &str, lang: &str) -> Result<EntryStore, StoreError> {
    check_language(lang)?;
    let store = EntryStore::open(&dir.join(entry_store))?;
    if let Some(built) = store.control(CONTROL_LANGUAGES)? {
        if !built.split(' ').any(|l| l == lang) {
            return Err(StoreError::UnknownLanguage(lang.to_string()));
        }
    }
    store.attach_language(dir, lang)?;
    Ok(store)
}

/// Entries whose priority writing is exactly `term`, with their `lang`
/// glosses. Entries without a translation in `lang` are left out.
pub fn lookup_exact_writing(
    store: &EntryStore,
    lang: &str,
    term: &str,
) -> Result<Vec<QueryHit>, StoreError> {
    lookup(store, lang, &format!("{{writingsPrio}} : {}", fts_phrase(term)))
}

/// Entries with a reading equal to `term` once both are in canonical kana,
/// so hiragana, katakana and romaji spellings all find the same entries.
pub fn lookup_reading(store: &EntryStore, lang: &str, term: &str) -> Result<Vec<QueryHit>, StoreError> {
    let kana = to_canonical_script(term);
    lookup(
        store,
        lang,
        &format!("{{readingsPrioKana readingsKana}} : {}", fts_phrase(&kana)),
    )
}

/// Entries with a writing, or a reading when `term` is kana or romaji,
/// containing `term` anywhere.
///
/// A prefix query over a field and its suffix set matches every token that
/// has `term` as a substring.
pub fn lookup_substring(
    store: &EntryStore,
    lang: &str,
    term: &str,
) -> Result<Vec<QueryHit>, StoreError> {
    let kana = to_canonical_script(term);
    let expr = if is_kana_reading(&kana) {
        format!(
            "{{readingsPrioKana readingsKana readingsPrioKanaParts readingsKanaParts}} : {} *",
            fts_phrase(&kana)
        )
    } else {
        format!(
            "{{writingsPrio writings writingsPrioParts writingsParts}} : {} *",
            fts_phrase(term)
        )
    };
    lookup(store, lang, &expr)
}

fn lookup(store: &EntryStore, lang: &str, expr: &str) -> Result<Vec<QueryHit>, StoreError> {
    check_language(lang)?;
    let sql = format!(
        "SELECT DictionaryEntry.seq, json_group_array(json(t.gloss))
            FROM DictionaryEntry
            JOIN {lang}.DictionaryTranslation AS t ON t.seq = DictionaryEntry.seq
            WHERE DictionaryEntry.seq IN
                (SELECT rowid FROM DictionaryIndex WHERE DictionaryIndex MATCH ?1)
            GROUP BY DictionaryEntry.seq
            ORDER BY DictionaryEntry.seq"
    );

    let conn = store.connection()?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([expr], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut hits = Vec::with_capacity(rows.len());
    for (seq, glosses) in rows {
        let translations = serde_json::from_str(&glosses)
            .map_err(|source| StoreError::Gloss { seq, source })?;
        if let Some(entry) = store.load_entry(seq)? {
            hits.push(QueryHit {
                entry,
                translations,
            });
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::build::build_to_directory;
    use crate::entry::{MetadataArray, MetadataKind};
    use crate::settings::Settings;

    const JMDICT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE JMdict [
<!ENTITY n "noun (common) (futsuumeishi)">
]>
<JMdict>
<entry>
<ent_seq>1467640</ent_seq>
<k_ele><keb>猫</keb><ke_pri>ichi1</ke_pri></k_ele>
<r_ele><reb>ねこ</reb><re_pri>ichi1</re_pri></r_ele>
<sense><pos>&n;</pos><gloss>cat</gloss></sense>
<sense><gloss xml:lang="ger">Katze</gloss></sense>
<sense><gloss>geisha</gloss></sense>
</entry>
<entry>
<ent_seq>2</ent_seq>
<k_ele><keb>猫</keb></k_ele>
<r_ele><reb>ネコ</reb></r_ele>
<sense><gloss>cat (rare writing)</gloss></sense>
</entry>
<entry>
<ent_seq>3</ent_seq>
<k_ele><keb>猫舌</keb></k_ele>
<r_ele><reb>ねこじた</reb></r_ele>
<sense><gloss>aversion to very hot food</gloss></sense>
</entry>
</JMdict>
"#;

    fn built() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("JMdict.xml");
        fs::write(&input, JMDICT).unwrap();
        build_to_directory(&input, dir.path(), &Settings::defaults(), None).unwrap();
        dir
    }

    #[test]
    fn test_lookup_exact_priority_writing() {
        let dir = built();
        let store = open_index(dir.path(), "jmdict.db", "eng").unwrap();
        let hits = lookup_exact_writing(&store, "eng", "猫").unwrap();

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.entry.seq, 1467640);
        assert_eq!(
            hit.translations,
            vec![vec![vec!["cat".to_string()]], vec![vec!["geisha".to_string()]]]
        );
        assert_eq!(
            hit.entry.metadata(MetadataKind::Pos),
            &MetadataArray::Groups(vec![vec!["n".to_string()], vec![]])
        );
    }

    #[test]
    fn test_lookup_other_language() {
        let dir = built();
        let store = open_index(dir.path(), "jmdict.db", "ger").unwrap();
        let hits = lookup_exact_writing(&store, "ger", "猫").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].translations, vec![vec![vec!["Katze".to_string()]]]);

        assert!(lookup_exact_writing(&store, "ger", "犬").unwrap().is_empty());
    }

    #[test]
    fn test_lookup_reading_in_any_script() {
        let dir = built();
        let store = open_index(dir.path(), "jmdict.db", "eng").unwrap();
        for term in ["ねこ", "ネコ", "neko", "NEKO"] {
            let seqs: Vec<i64> = lookup_reading(&store, "eng", term)
                .unwrap()
                .iter()
                .map(|hit| hit.entry.seq)
                .collect();
            assert_eq!(seqs, vec![2, 1467640], "term {term}");
        }
    }

    #[test]
    fn test_lookup_substring() {
        let dir = built();
        let store = open_index(dir.path(), "jmdict.db", "eng").unwrap();
        let seqs = |term: &str| -> Vec<i64> {
            lookup_substring(&store, "eng", term)
                .unwrap()
                .iter()
                .map(|hit| hit.entry.seq)
                .collect()
        };
        assert_eq!(seqs("猫舌"), vec![3]);
        assert_eq!(seqs("舌"), vec![3]);
        assert_eq!(seqs("猫"), vec![2, 3, 1467640]);
        assert_eq!(seqs("じた"), vec![3]);
        assert_eq!(seqs("eko"), Vec::<i64>::new());
        assert_eq!(seqs("ko"), vec![2, 3, 1467640]);
    }

    #[test]
    fn test_open_rejects_language_not_built() {
        let dir = built();
        assert!(matches!(
            open_index(dir.path(), "jmdict.db", "fre"),
            Err(StoreError::UnknownLanguage(ref lang)) if lang == "fre"
        ));
    }

    #[test]
    fn test_lookup_rejects_bad_language() {
        let dir = built();
        let store = open_index(dir.path(), "jmdict.db", "eng").unwrap();
        assert!(matches!(
            lookup_exact_writing(&store, "eng; DROP", "猫"),
            Err(StoreError::InvalidLanguage(_))
        ));
        assert!(matches!(
            open_index(dir.path(), "jmdict.db", "EN"),
            Err(StoreError::InvalidLanguage(_))
        ));
    }
}
