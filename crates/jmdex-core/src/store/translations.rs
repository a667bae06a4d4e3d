use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::info;

use super::{check_language, fts_phrase, insert_or_skip, Bracket, Inserted, StoreError};

const SCHEMA: &str = "
DROP TABLE IF EXISTS DictionaryTranslationIndex;
DROP TABLE IF EXISTS DictionaryTranslation;

CREATE TABLE DictionaryTranslation (
    seq INTEGER NOT NULL,
    gloss TEXT NOT NULL
);

CREATE INDEX DictionaryTranslation_seq ON DictionaryTranslation (seq);

CREATE VIRTUAL TABLE DictionaryTranslationIndex USING fts5(
    gloss,
    content='DictionaryTranslation'
);
";

/// Glosses of one language, kept in their own `<lang>.db`.
pub struct TranslationStore {
    bracket: Bracket,
}

impl TranslationStore {
    /// `lang` only names the store; it is checked before anything is opened.
    pub fn create(path: &Path, lang: &str) -> Result<Self, StoreError> {
        check_language(lang)?;
        Self::begin(Connection::open(path)?)
    }

    pub fn in_memory(lang: &str) -> Result<Self, StoreError> {
        check_language(lang)?;
        Self::begin(Connection::open_in_memory()?)
    }

    fn begin(conn: Connection) -> Result<Self, StoreError> {
        Ok(Self {
            bracket: Bracket::begin(conn, SCHEMA)?,
        })
    }

    /// Several rows per `seq` are legal: one per flushed sense run.
    pub fn insert(&self, seq: i64, gloss_json: &str) -> Result<Inserted, StoreError> {
        let mut stmt = self
            .bracket
            .conn
            .prepare_cached("INSERT INTO DictionaryTranslation (seq, gloss) VALUES (?1, ?2)")?;
        insert_or_skip(stmt.execute(params![seq, gloss_json]))
    }

    pub fn rebuild_index(&self) -> Result<(), StoreError> {
        self.bracket.conn.execute_batch(
            "INSERT INTO DictionaryTranslationIndex(DictionaryTranslationIndex) VALUES('rebuild')",
        )?;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.bracket.commit()
    }

    /// Gloss payloads stored for `seq`, in insertion order.
    pub fn glosses(&self, seq: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .bracket
            .conn
            .prepare_cached("SELECT gloss FROM DictionaryTranslation WHERE seq = ?1 ORDER BY rowid")?;
        let glosses = stmt
            .query_map([seq], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(glosses)
    }

    /// Entries with a gloss containing `word` as a full-text token.
    pub fn seqs_by_gloss_word(&self, word: &str) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.bracket.committed()?.prepare_cached(
            "SELECT DISTINCT seq FROM DictionaryTranslation WHERE rowid IN
                (SELECT rowid FROM DictionaryTranslationIndex
                    WHERE DictionaryTranslationIndex MATCH ?1)
                ORDER BY seq",
        )?;
        let seqs = stmt
            .query_map([fts_phrase(word)], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(seqs)
    }
}

enum Location {
    Directory(PathBuf),
    Memory,
}

/// Lazily created translation stores, one per language seen in the source.
///
/// Nothing is committed until [`LanguageRegistry::commit`].
pub struct LanguageRegistry {
    location: Location,
    stores: BTreeMap<String, TranslationStore>,
}

impl LanguageRegistry {
    /// Stores go to `<dir>/<lang>.db`.
    pub fn in_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Directory(dir.into()),
            stores: BTreeMap::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            stores: BTreeMap::new(),
        }
    }

    /// The store for `lang`, creating it on first use.
    pub fn store_for(&mut self, lang: &str) -> Result<&mut TranslationStore, StoreError> {
        match self.stores.entry(lang.to_string()) {
            btree_map::Entry::Occupied(e) => Ok(e.into_mut()),
            btree_map::Entry::Vacant(e) => {
                let store = match &self.location {
                    Location::Directory(dir) => {
                        check_language(lang)?;
                        let path = dir.join(format!("{lang}.db"));
                        info!(lang, path = %path.display(), "creating translation store");
                        TranslationStore::create(&path, lang)?
                    }
                    Location::Memory => TranslationStore::in_memory(lang)?,
                };
                Ok(e.insert(store))
            }
        }
    }

    pub fn get(&self, lang: &str) -> Option<&TranslationStore> {
        self.stores.get(lang)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// Rebuild every gloss index, still inside the open transactions.
    pub fn rebuild_indexes(&mut self) -> Result<(), StoreError> {
        for store in self.stores.values_mut() {
            store.rebuild_index()?;
        }
        Ok(())
    }

    /// Commit every store. Call only once all fallible work of the pass is
    /// done, so that a failure can leave at most a COMMIT error behind.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        for store in self.stores.values_mut() {
            store.commit()?;
        }
        Ok(())
    }
}
