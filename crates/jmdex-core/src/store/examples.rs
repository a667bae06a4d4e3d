use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{insert_or_skip, Bracket, Inserted, StoreError};

const SCHEMA: &str = "
DROP TABLE IF EXISTS Examples;
DROP TABLE IF EXISTS ExamplesIndex;

CREATE TABLE Examples (
    id INTEGER PRIMARY KEY,
    sentence TEXT NOT NULL,
    translation TEXT
);

CREATE TABLE ExamplesIndex (
    id INTEGER NOT NULL,
    seq INTEGER NOT NULL,
    matches INTEGER NOT NULL,
    PRIMARY KEY (id, seq)
);
";

/// Example sentences and their entry references.
pub struct ExampleStore {
    bracket: Bracket,
}

impl ExampleStore {
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        info!(path = %path.display(), "creating example store");
        Self::begin(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::begin(Connection::open_in_memory()?)
    }

    fn begin(conn: Connection) -> Result<Self, StoreError> {
        // journal_mode cannot change inside a transaction.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Ok(Self {
            bracket: Bracket::begin(conn, SCHEMA)?,
        })
    }

    pub fn insert_example(
        &self,
        id: i64,
        sentence: &str,
        translation: &str,
    ) -> Result<Inserted, StoreError> {
        let mut stmt = self.bracket.conn.prepare_cached(
            "INSERT INTO Examples (id, sentence, translation) VALUES (?1, ?2, ?3)",
        )?;
        insert_or_skip(stmt.execute(params![id, sentence, translation]))
    }

    /// `matches` is how many entries the token resolved to.
    pub fn insert_reference(&self, id: i64, seq: i64, matches: usize) -> Result<Inserted, StoreError> {
        let mut stmt = self
            .bracket
            .conn
            .prepare_cached("INSERT INTO ExamplesIndex (id, seq, matches) VALUES (?1, ?2, ?3)")?;
        insert_or_skip(stmt.execute(params![id, seq, matches as i64]))
    }

    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.bracket.commit()
    }

    /// `(sentence, translation)` of example `id`.
    pub fn example(&self, id: i64) -> Result<Option<(String, Option<String>)>, StoreError> {
        let example = self
            .bracket
            .conn
            .query_row(
                "SELECT sentence, translation FROM Examples WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(example)
    }

    /// `(seq, matches)` references of example `id`, by `seq`.
    pub fn references(&self, id: i64) -> Result<Vec<(i64, i64)>, StoreError> {
        let mut stmt = self
            .bracket
            .conn
            .prepare_cached("SELECT seq, matches FROM ExamplesIndex WHERE id = ?1 ORDER BY seq")?;
        let refs = stmt
            .query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(refs)
    }

    pub fn example_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .bracket
            .conn
            .query_row("SELECT COUNT(*) FROM Examples", [], |row| row.get(0))?)
    }
}
