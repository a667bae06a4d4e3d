//! SQLite table stores.
//!
//! Every writable store wraps its connection in a [`Bracket`]: the
//! drop/recreate DDL and all inserts of a pass run inside one
//! `BEGIN IMMEDIATE … COMMIT`. Dropping a store before [`commit`] rolls the
//! file back to whatever it held before the pass started.
//!
//! [`commit`]: EntryStore::commit

mod entries;
mod examples;
mod translations;


use rusqlite::{Connection, ErrorCode};
use tracing::warn;

use crate::settings::is_language_code;

pub use entries::{EntryRow, EntryStore, StoredEntry};
pub use examples::ExampleStore;
pub use translations::{LanguageRegistry, TranslationStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid language code: {0:?}")]
    InvalidLanguage(String),
    #[error("index has no translation store for {0:?}")]
    UnknownLanguage(String),
    #[error("store has not been committed")]
    NotCommitted,
    #[error("entry {seq}: bad gloss payload: {source}")]
    Gloss {
        seq: i64,
        source: serde_json::Error,
    },
    #[error("entry {seq}: bad {column} column: {source}")]
    Metadata {
        seq: i64,
        column: &'static str,
        source: serde_json::Error,
    },
}

/// Outcome of a row insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    Row,
    /// The row violated a table constraint and was not written.
    Skipped,
}

/// Constraint violations become [`Inserted::Skipped`]; anything else is an
/// error.
fn insert_or_skip(result: rusqlite::Result<usize>) -> Result<Inserted, StoreError> {
    match result {
        Ok(_) => Ok(Inserted::Row),
        Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
            Ok(Inserted::Skipped)
        }
        Err(e) => Err(e.into()),
    }
}

/// Reject `lang` unless it is safe as a `<lang>.db` file name and an
/// `ATTACH` alias.
pub(crate) fn check_language(lang: &str) -> Result<(), StoreError> {
    if is_language_code(lang) {
        Ok(())
    } else {
        Err(StoreError::InvalidLanguage(lang.to_string()))
    }
}

/// An FTS5 string literal: `term` as one phrase, quotes doubled.
pub(crate) fn fts_phrase(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

/// A connection and the state of its single write transaction.
struct Bracket {
    conn: Connection,
    open: bool,
}

impl Bracket {
    /// Start the write transaction and run `schema` inside it.
    fn begin(conn: Connection, schema: &str) -> Result<Self, StoreError> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        let bracket = Self { conn, open: true };
        bracket.conn.execute_batch(schema)?;
        Ok(bracket)
    }

    /// A connection that never writes.
    fn read_only(conn: Connection) -> Self {
        Self { conn, open: false }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.open {
            self.conn.execute_batch("COMMIT")?;
            self.open = false;
        }
        Ok(())
    }

    fn committed(&self) -> Result<&Connection, StoreError> {
        if self.open {
            Err(StoreError::NotCommitted)
        } else {
            Ok(&self.conn)
        }
    }
}

impl Drop for Bracket {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback failed");
            }
        }
    }
}
