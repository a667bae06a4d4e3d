use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use super::{check_language, fts_phrase, insert_or_skip, Bracket, Inserted, StoreError};
use crate::entry::{MetadataArray, MetadataKind, Tiered};

const SCHEMA: &str = "
DROP TABLE IF EXISTS DictionaryIndex;
DROP TABLE IF EXISTS DictionaryEntry;
DROP TABLE IF EXISTS DictionaryEntity;
DROP TABLE IF EXISTS DictionaryControl;

CREATE TABLE DictionaryEntry (
    seq INTEGER PRIMARY KEY,
    readingsPrio TEXT NOT NULL,
    readings TEXT NOT NULL,
    writingsPrio TEXT NOT NULL,
    writings TEXT NOT NULL,
    readingsPrioParts TEXT NOT NULL,
    readingsParts TEXT NOT NULL,
    writingsPrioParts TEXT NOT NULL,
    writingsParts TEXT NOT NULL,
    readingsPrioKana TEXT NOT NULL,
    readingsKana TEXT NOT NULL,
    readingsPrioKanaParts TEXT NOT NULL,
    readingsKanaParts TEXT NOT NULL,
    pos TEXT,
    xref TEXT,
    ant TEXT,
    misc TEXT,
    lsource TEXT,
    dial TEXT,
    s_inf TEXT,
    field TEXT
);

CREATE VIRTUAL TABLE DictionaryIndex USING fts5(
    readingsPrio,
    readings,
    writingsPrio,
    writings,
    readingsPrioParts,
    readingsParts,
    writingsPrioParts,
    writingsParts,
    readingsPrioKana,
    readingsKana,
    readingsPrioKanaParts,
    readingsKanaParts,
    content='DictionaryEntry',
    content_rowid='seq',
    tokenize='ascii'
);

CREATE TABLE DictionaryEntity (
    name TEXT PRIMARY KEY,
    content TEXT NOT NULL
);

CREATE TABLE DictionaryControl (
    control TEXT PRIMARY KEY,
    value TEXT
);
";

const INSERT_ENTRY: &str = "INSERT INTO DictionaryEntry (
    seq, readingsPrio, readings, writingsPrio, writings,
    readingsPrioParts, readingsParts, writingsPrioParts, writingsParts,
    readingsPrioKana, readingsKana, readingsPrioKanaParts, readingsKanaParts,
    pos, xref, ant, misc, lsource, dial, s_inf, field
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
          ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)";

const SELECT_ENTRY: &str = "SELECT readingsPrio, readings, writingsPrio, writings,
    pos, xref, ant, misc, lsource, dial, s_inf, field
    FROM DictionaryEntry WHERE seq = ?1";

/// One `DictionaryEntry` row, fully derived and ready to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRow {
    pub seq: i64,
    pub readings_prio: String,
    pub readings: String,
    pub writings_prio: String,
    pub writings: String,
    pub readings_prio_parts: String,
    pub readings_parts: String,
    pub writings_prio_parts: String,
    pub writings_parts: String,
    pub readings_prio_kana: String,
    pub readings_kana: String,
    pub readings_prio_kana_parts: String,
    pub readings_kana_parts: String,
    /// Encoded metadata columns in [`MetadataKind::ALL`] order, `None` for
    /// SQL NULL.
    pub metadata: [Option<String>; 8],
}

/// A `DictionaryEntry` row read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub seq: i64,
    pub writings: Tiered,
    pub readings: Tiered,
    metadata: Vec<MetadataArray>,
}

impl StoredEntry {
    pub fn metadata(&self, kind: MetadataKind) -> &MetadataArray {
        &self.metadata[kind as usize]
    }
}

/// The entry store: `DictionaryEntry`, its FTS5 index, declared entities and
/// control values.
pub struct EntryStore {
    bracket: Bracket,
}

impl EntryStore {
    /// Open `path` for a rebuild. Existing tables are replaced, but only once
    /// [`EntryStore::commit`] runs.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        info!(path = %path.display(), "creating entry store");
        Self::begin(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::begin(Connection::open_in_memory()?)
    }

    fn begin(conn: Connection) -> Result<Self, StoreError> {
        Ok(Self {
            bracket: Bracket::begin(conn, SCHEMA)?,
        })
    }

    /// Open an already built store for queries.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self {
            bracket: Bracket::read_only(conn),
        })
    }

    pub fn insert_entry(&self, row: &EntryRow) -> Result<Inserted, StoreError> {
        let [pos, xref, ant, misc, lsource, dial, s_inf, field] = &row.metadata;
        let mut stmt = self.bracket.conn.prepare_cached(INSERT_ENTRY)?;
        insert_or_skip(stmt.execute(params![
            row.seq,
            row.readings_prio,
            row.readings,
            row.writings_prio,
            row.writings,
            row.readings_prio_parts,
            row.readings_parts,
            row.writings_prio_parts,
            row.writings_parts,
            row.readings_prio_kana,
            row.readings_kana,
            row.readings_prio_kana_parts,
            row.readings_kana_parts,
            pos,
            xref,
            ant,
            misc,
            lsource,
            dial,
            s_inf,
            field,
        ]))
    }

    pub fn insert_entity(&self, name: &str, content: &str) -> Result<Inserted, StoreError> {
        let mut stmt = self
            .bracket
            .conn
            .prepare_cached("INSERT INTO DictionaryEntity (name, content) VALUES (?1, ?2)")?;
        insert_or_skip(stmt.execute(params![name, content]))
    }

    pub fn set_control(&self, control: &str, value: &str) -> Result<(), StoreError> {
        self.bracket.conn.execute(
            "INSERT OR REPLACE INTO DictionaryControl (control, value) VALUES (?1, ?2)",
            params![control, value],
        )?;
        Ok(())
    }

    /// Repopulate `DictionaryIndex` from `DictionaryEntry` in one step.
    pub fn rebuild_index(&self) -> Result<(), StoreError> {
        debug!("rebuilding DictionaryIndex");
        self.bracket
            .conn
            .execute_batch("INSERT INTO DictionaryIndex(DictionaryIndex) VALUES('rebuild')")?;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.bracket.commit()
    }

    pub fn is_committed(&self) -> bool {
        !self.bracket.open
    }

    /// Committed connection for read queries.
    pub(crate) fn connection(&self) -> Result<&Connection, StoreError> {
        self.bracket.committed()
    }

    pub fn control(&self, control: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .bracket
            .conn
            .query_row(
                "SELECT value FROM DictionaryControl WHERE control = ?1",
                [control],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    pub fn entity(&self, name: &str) -> Result<Option<String>, StoreError> {
        let content = self
            .bracket
            .conn
            .query_row(
                "SELECT content FROM DictionaryEntity WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    /// Entries having `writing` as one of their writings, either tier.
    pub fn seqs_by_writing(&self, writing: &str) -> Result<Vec<i64>, StoreError> {
        self.match_seqs(&format!("{{writingsPrio writings}} : {}", fts_phrase(writing)))
    }

    /// Entries having both `writing` among their writings and `reading`
    /// among their readings.
    pub fn seqs_by_writing_and_reading(
        &self,
        writing: &str,
        reading: &str,
    ) -> Result<Vec<i64>, StoreError> {
        self.match_seqs(&format!(
            "{{writingsPrio writings}} : {} AND {{readingsPrio readings}} : {}",
            fts_phrase(writing),
            fts_phrase(reading)
        ))
    }

    fn match_seqs(&self, expr: &str) -> Result<Vec<i64>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(
            "SELECT rowid FROM DictionaryIndex WHERE DictionaryIndex MATCH ?1 ORDER BY rowid",
        )?;
        let seqs = stmt
            .query_map([expr], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(seqs)
    }

    pub fn load_entry(&self, seq: i64) -> Result<Option<StoredEntry>, StoreError> {
        let raw = self
            .bracket
            .conn
            .query_row(SELECT_ENTRY, [seq], |row| {
                let mut columns = Vec::with_capacity(8);
                for i in 4..12 {
                    columns.push(row.get::<_, Option<String>>(i)?);
                }
                Ok((
                    Tiered::from_fields(&row.get::<_, String>(2)?, &row.get::<_, String>(3)?),
                    Tiered::from_fields(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?),
                    columns,
                ))
            })
            .optional()?;
        let Some((writings, readings, columns)) = raw else {
            return Ok(None);
        };

        let metadata = MetadataKind::ALL
            .into_iter()
            .zip(&columns)
            .map(|(kind, column)| {
                MetadataArray::decode(column.as_deref()).map_err(|source| StoreError::Metadata {
                    seq,
                    column: kind.element(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StoredEntry {
            seq,
            writings,
            readings,
            metadata,
        }))
    }

    /// Attach `<dir>/<lang>.db` under the schema name `lang`.
    pub fn attach_language(&self, dir: &Path, lang: &str) -> Result<(), StoreError> {
        check_language(lang)?;
        let path = dir.join(format!("{lang}.db"));
        // ATTACH is refused inside a transaction.
        self.connection()?.execute(
            &format!("ATTACH DATABASE ?1 AS {lang}"),
            [path.to_string_lossy().into_owned()],
        )?;
        Ok(())
    }
}
