//! Romaji-to-kana canonicalization for reading fields.
//!
//! A byte trie built from an embedded TOML table converts runs of ASCII romaji
//! into hiragana, handling sokuon (っ), hatsuon (ん) and yōon (きゃ).
//! Katakana is folded onto hiragana so that either kana script, or romaji,
//! lands on the same canonical form.

mod canonical;
mod convert;
mod table;

pub use canonical::to_canonical_script;
pub use convert::romaji_to_kana;
pub use table::{RomajiTable, RomajiTableError};

pub const DEFAULT_TOML: &str = include_str!("default_romaji.toml");

/// Returns the embedded default romaji table.
pub fn default_toml() -> &'static str {
    DEFAULT_TOML
}
