//! Index Writer: persists completed records.
//!
//! Each entry becomes one `DictionaryEntry` row carrying its tier fields,
//! their suffix sets and, for readings, the hiragana-canonical forms and
//! their suffix sets. Translations go to the store of their language.

use tracing::{debug, warn};

use crate::build::{BuildError, BuildOptions};
use crate::entry::{Entry, EntryRecord, MetadataKind, Translation};
use crate::romaji::to_canonical_script;
use crate::store::{EntryRow, EntryStore, Inserted, LanguageRegistry};
use crate::suffix::suffix_set;

/// Derive the full store row for `entry`.
pub fn entry_row(entry: &Entry, include_self: bool) -> Result<EntryRow, serde_json::Error> {
    let readings_prio = entry.readings.priority_field();
    let readings = entry.readings.ordinary_field();
    let writings_prio = entry.writings.priority_field();
    let writings = entry.writings.ordinary_field();
    let readings_prio_kana = to_canonical_script(&readings_prio);
    let readings_kana = to_canonical_script(&readings);

    let mut metadata: [Option<String>; 8] = Default::default();
    for (column, kind) in metadata.iter_mut().zip(MetadataKind::ALL) {
        *column = entry.metadata.array(kind).encode()?;
    }

    Ok(EntryRow {
        seq: entry.seq,
        readings_prio_parts: suffix_set(&readings_prio, include_self),
        readings_parts: suffix_set(&readings, include_self),
        writings_prio_parts: suffix_set(&writings_prio, include_self),
        writings_parts: suffix_set(&writings, include_self),
        readings_prio_kana_parts: suffix_set(&readings_prio_kana, include_self),
        readings_kana_parts: suffix_set(&readings_kana, include_self),
        readings_prio,
        readings,
        writings_prio,
        writings,
        readings_prio_kana,
        readings_kana,
        metadata,
    })
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub entries: usize,
    pub skipped_entries: usize,
    pub translations: usize,
    pub skipped_translations: usize,
    /// Translations dropped by the language whitelist.
    pub filtered_translations: usize,
}

pub struct IndexWriter<'a> {
    entries: &'a EntryStore,
    languages: &'a mut LanguageRegistry,
    options: &'a BuildOptions,
    stats: WriteStats,
}

impl<'a> IndexWriter<'a> {
    pub fn new(
        entries: &'a EntryStore,
        languages: &'a mut LanguageRegistry,
        options: &'a BuildOptions,
    ) -> Self {
        Self {
            entries,
            languages,
            options,
            stats: WriteStats::default(),
        }
    }

    pub fn write_record(&mut self, record: &EntryRecord) -> Result<(), BuildError> {
        self.write_entry(&record.entry)?;
        for translation in &record.translations {
            self.write_translation(translation)?;
        }
        Ok(())
    }

    pub fn write_entry(&mut self, entry: &Entry) -> Result<(), BuildError> {
        let row = entry_row(entry, self.options.include_self)?;
        match self.entries.insert_entry(&row)? {
            Inserted::Row => self.stats.entries += 1,
            Inserted::Skipped => {
                warn!(seq = entry.seq, "entry violates a constraint, skipped");
                self.stats.skipped_entries += 1;
            }
        }
        Ok(())
    }

    pub fn write_translation(&mut self, translation: &Translation) -> Result<(), BuildError> {
        let lang = translation.lang.as_str();
        if !self.options.build.wants_language(lang) {
            debug!(seq = translation.seq, lang, "translation filtered");
            self.stats.filtered_translations += 1;
            return Ok(());
        }

        let gloss = translation.gloss_json()?;
        match self.languages.store_for(lang)?.insert(translation.seq, &gloss)? {
            Inserted::Row => self.stats.translations += 1,
            Inserted::Skipped => {
                warn!(seq = translation.seq, lang, "translation violates a constraint, skipped");
                self.stats.skipped_translations += 1;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::entry::{SenseGroupMetadata, SenseMetadata, Tiered};
    use crate::store::StoreError;

    fn entry(seq: i64, writings: &[(&str, bool)], readings: &[(&str, bool)]) -> Entry {
        let mut e = Entry {
            seq,
            writings: Tiered::default(),
            readings: Tiered::default(),
            metadata: SenseMetadata::default(),
        };
        for (w, prio) in writings {
            e.writings.push(w.to_string(), *prio);
        }
        for (r, prio) in readings {
            e.readings.push(r.to_string(), *prio);
        }
        e
    }

    #[test]
    fn test_entry_row_fields() {
        let e = entry(
            1,
            &[("食べる", true), ("喰べる", false)],
            &[("タベル", true), ("くらう", false)],
        );
        let row = entry_row(&e, false).unwrap();
        assert_eq!(row.writings_prio, "食べる");
        assert_eq!(row.writings_prio_parts, "べる る");
        assert_eq!(row.writings, "喰べる");
        assert_eq!(row.readings_prio, "タベル");
        assert_eq!(row.readings_prio_parts, "ベル ル");
        assert_eq!(row.readings_prio_kana, "たべる");
        assert_eq!(row.readings_prio_kana_parts, "べる る");
        assert_eq!(row.readings_kana, "くらう");
        assert!(row.metadata.iter().all(Option::is_none));

        let row = entry_row(&e, true).unwrap();
        assert_eq!(row.writings_prio_parts, "べる る 食べる");
    }

    #[test]
    fn test_entry_row_metadata() {
        let mut e = entry(2, &[], &[("いぬ", false)]);
        let mut group = SenseGroupMetadata::default();
        group.push(MetadataKind::Pos, "n".into());
        e.metadata.push_group(group);
        e.metadata.push_group(SenseGroupMetadata::default());

        let row = entry_row(&e, false).unwrap();
        assert_eq!(row.metadata[0].as_deref(), Some(r#"[["n"],[]]"#));
        assert_eq!(row.metadata[1], None);
    }

    #[test]
    fn test_writer_counts_and_skips() {
        let entries = EntryStore::in_memory().unwrap();
        let mut registry = LanguageRegistry::in_memory();
        let options = BuildOptions::default();
        let mut writer = IndexWriter::new(&entries, &mut registry, &options);

        let record = EntryRecord {
            entry: entry(5, &[("猫", true)], &[("ねこ", true)]),
            translations: vec![
                Translation { seq: 5, lang: "eng".into(), senses: vec![vec!["cat".into()]] },
                Translation { seq: 5, lang: "fre".into(), senses: vec![vec!["chat".into()]] },
            ],
        };
        writer.write_record(&record).unwrap();
        writer.write_entry(&record.entry).unwrap();

        let stats = writer.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.skipped_entries, 1);
        assert_eq!(stats.translations, 2);
        assert_eq!(
            registry.get("fre").unwrap().glosses(5).unwrap(),
            vec![r#"[["chat"]]"#.to_string()]
        );
    }

    #[test]
    fn test_whitelist_does_not_open_other_stores() {
        let entries = EntryStore::in_memory().unwrap();
        let mut registry = LanguageRegistry::in_memory();
        let mut options = BuildOptions::default();
        options.build.languages = vec!["eng".to_string()];
        let mut writer = IndexWriter::new(&entries, &mut registry, &options);

        writer
            .write_translation(&Translation { seq: 1, lang: "ger".into(), senses: vec![] })
            .unwrap();
        assert_eq!(writer.stats().filtered_translations, 1);
        assert!(registry.get("ger").is_none());
    }

    #[test]
    fn test_bad_language_is_an_error() {
        let entries = EntryStore::in_memory().unwrap();
        let mut registry = LanguageRegistry::in_memory();
        let options = BuildOptions::default();
        let mut writer = IndexWriter::new(&entries, &mut registry, &options);
        let err = writer
            .write_translation(&Translation { seq: 1, lang: "x y".into(), senses: vec![] })
            .unwrap_err();
        assert!(matches!(err, BuildError::Store(StoreError::InvalidLanguage(_))));
    }

    fn tiered_strategy() -> impl Strategy<Value = Vec<(String, bool)>> {
        prop::collection::vec(("[ぁ-ん一-龯]{1,4}", any::<bool>()), 0..5)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn stored_tiers_reconstruct_input(
            writings in tiered_strategy(),
            readings in tiered_strategy(),
        ) {
            let mut e = entry(1, &[], &[]);
            for (w, prio) in &writings {
                e.writings.push(w.clone(), *prio);
            }
            for (r, prio) in &readings {
                e.readings.push(r.clone(), *prio);
            }

            let entries = EntryStore::in_memory().unwrap();
            let mut registry = LanguageRegistry::in_memory();
            let options = BuildOptions::default();
            IndexWriter::new(&entries, &mut registry, &options).write_entry(&e).unwrap();

            let stored = entries.load_entry(1).unwrap().unwrap();
            prop_assert_eq!(&stored.writings, &e.writings);
            prop_assert_eq!(&stored.readings, &e.readings);
        }
    }
}
