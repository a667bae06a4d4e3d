use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::Deserialize;

use super::DEFAULT_TOML;

#[derive(Debug, thiserror::Error)]
pub enum RomajiTableError {
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("[mappings] table is empty")]
    Empty,
    #[error("key must be lowercase ASCII letters: {0}")]
    InvalidKey(String),
    #[error("empty kana for key: {0}")]
    EmptyKana(String),
}

#[derive(Deserialize)]
struct TableFile {
    mappings: BTreeMap<String, String>,
}

#[derive(Default)]
struct Node {
    next: HashMap<u8, Node>,
    kana: Option<Box<str>>,
}

/// Romaji spellings keyed byte by byte, answering longest-prefix queries.
pub struct RomajiTable {
    root: Node,
    mappings: usize,
}

impl RomajiTable {
    /// Parse a `[mappings]` TOML document.
    ///
    /// Conversion only ever sees runs of lowercased ASCII letters, so keys
    /// outside that alphabet are rejected rather than silently unreachable.
    pub fn parse(toml_str: &str) -> Result<Self, RomajiTableError> {
        let file: TableFile = toml::from_str(toml_str)?;
        if file.mappings.is_empty() {
            return Err(RomajiTableError::Empty);
        }

        let mut table = Self {
            root: Node::default(),
            mappings: 0,
        };
        for (romaji, kana) in file.mappings {
            if romaji.is_empty() || !romaji.bytes().all(|b| b.is_ascii_lowercase()) {
                return Err(RomajiTableError::InvalidKey(romaji));
            }
            if kana.is_empty() {
                return Err(RomajiTableError::EmptyKana(romaji));
            }
            let mut node = &mut table.root;
            for b in romaji.bytes() {
                node = node.next.entry(b).or_default();
            }
            node.kana = Some(kana.into_boxed_str());
            table.mappings += 1;
        }
        Ok(table)
    }

    /// The embedded default table.
    pub fn builtin() -> &'static RomajiTable {
        static TABLE: OnceLock<RomajiTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            // build.rs checks the file shape; key rules are checked here.
            RomajiTable::parse(DEFAULT_TOML).expect("default romaji table is valid")
        })
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings
    }

    /// Longest mapped prefix of `input` as `(byte length, kana)`.
    pub fn longest_prefix(&self, input: &str) -> Option<(usize, &str)> {
        let mut node = &self.root;
        let mut best = None;
        for (i, b) in input.bytes().enumerate() {
            match node.next.get(&b) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(kana) = &node.kana {
                best = Some((i + 1, &**kana));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_small_table() {
        let table = RomajiTable::parse("[mappings]\na = \"あ\"\nka = \"か\"\n").unwrap();
        assert_eq!(table.mapping_count(), 2);
        assert_eq!(table.longest_prefix("ka"), Some((2, "か")));
        assert_eq!(table.longest_prefix("ki"), None);
    }

    #[test]
    fn test_builtin_table() {
        let table = RomajiTable::builtin();
        assert!(table.mapping_count() > 200, "got {}", table.mapping_count());
        assert_eq!(table.longest_prefix("a"), Some((1, "あ")));
        assert_eq!(table.longest_prefix("sha"), Some((3, "しゃ")));
        assert_eq!(table.longest_prefix("xtu"), Some((3, "っ")));
    }

    #[test]
    fn test_longest_prefix_stops_at_last_mapping() {
        let table = RomajiTable::builtin();
        assert_eq!(table.longest_prefix("shita"), Some((3, "し")));
        assert_eq!(table.longest_prefix("kyakka"), Some((3, "きゃ")));
        assert_eq!(table.longest_prefix("natto"), Some((2, "な")));
    }

    #[test]
    fn test_no_mapping_for_bare_consonants() {
        let table = RomajiTable::builtin();
        assert_eq!(table.longest_prefix("k"), None);
        assert_eq!(table.longest_prefix("n"), None);
        assert_eq!(table.longest_prefix("nn"), None);
        assert_eq!(table.longest_prefix(""), None);
    }

    #[test]
    fn test_error_empty_mappings() {
        let err = RomajiTable::parse("[mappings]\n").err().unwrap();
        assert!(matches!(err, RomajiTableError::Empty));
    }

    #[test]
    fn test_error_invalid_keys() {
        for key in ["\"あ\"", "\"-\"", "\"Ka\""] {
            let err = RomajiTable::parse(&format!("[mappings]\n{key} = \"x\"\n"))
                .err()
                .unwrap();
            assert!(matches!(err, RomajiTableError::InvalidKey(_)), "{key}");
        }
    }

    #[test]
    fn test_error_empty_kana() {
        let err = RomajiTable::parse("[mappings]\na = \"\"\n").err().unwrap();
        assert!(matches!(err, RomajiTableError::EmptyKana(ref key) if key == "a"));
    }

    #[test]
    fn test_error_invalid_toml() {
        let err = RomajiTable::parse("not valid toml {{{").err().unwrap();
        assert!(matches!(err, RomajiTableError::Parse(_)));
    }
}
