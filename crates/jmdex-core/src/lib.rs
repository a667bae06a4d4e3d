//! Offline JMdict indexing: dictionary source to SQLite full-text stores,
//! plus example-sentence cross-referencing against the built index.

pub mod accumulator;
pub mod build;
pub mod entry;
pub mod markup;
pub mod query;
pub mod romaji;
pub mod sentences;
pub mod settings;
pub mod store;
pub mod suffix;
pub mod unicode;
pub mod writer;
