//! Example Resolver: second pass over an annotated sentence corpus.
//!
//! The corpus alternates `A:` lines (sentence, tab, English, `#ID=` id) and
//! `B:` lines holding the annotation tokens. Every verified token is looked
//! up in a committed entry store, by writing alone or by writing and
//! reading together. Resolved references go to the example store.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::store::{EntryStore, ExampleStore, Inserted, StoreError};


#[derive(Debug, thiserror::Error)]
pub enum ExampleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: could not parse A line: {content:?}")]
    ALine { line: usize, content: String },

    #[error("line {line}: could not parse B line: {content:?}")]
    BLine { line: usize, content: String },

    #[error("line {line}: no B line following A line")]
    MissingBLine { line: usize },

    #[error("line {line}: invalid example id {id:?}")]
    InvalidId { line: usize, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One annotation token: `writing(reading)[index]{expression}~`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub writing: &'a str,
    pub reading: Option<&'a str>,
    pub index: Option<&'a str>,
    pub expression: Option<&'a str>,
    /// Marked `~`: only these are resolved.
    pub verified: bool,
}

/// The parsed `A:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example<'a> {
    pub id: i64,
    pub sentence: &'a str,
    pub translation: &'a str,
}

/// A token that resolved to more than one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub line: usize,
    pub writing: String,
    pub reading: Option<String>,
    pub contents: String,
    pub matches: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Examples written, i.e. with at least one resolved token.
    pub examples: usize,
    pub references: usize,
    pub unresolved: usize,
    pub ambiguous: Vec<Ambiguity>,
}

fn a_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^A: (?P<japanese>[^\t\n]*)\t(?P<english>[^\n]*)(#ID=(?P<id>[^\s]*))$")
            .expect("A line pattern is valid")
    })
}

fn b_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^B: (?P<contents>.*)$").expect("B line pattern is valid"))
}

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<writing>[^()\[\]{}\s~]+)",
            r"(\((?P<reading>[^()\[\]{}\s]*)\))?",
            r"(\[(?P<index>[^()\[\]{}\s]*)\])?",
            r"(\{(?P<expression>[^()\[\]{}\s]*)\})?",
            r"(?P<verified>~)?\s?",
        ))
        .expect("token pattern is valid")
    })
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str())
}

/// Example ids are written with `_` separators (`1234_5678`); they are
/// stored as the digits read as one integer.
pub fn example_id(raw: &str) -> Option<i64> {
    raw.chars().filter(|&c| c != '_').collect::<String>().parse().ok()
}

/// Parse an `A:` line. `line` is only used for error reporting.
pub fn parse_example(content: &str, line: usize) -> Result<Example<'_>, ExampleError> {
    let caps = a_line().captures(content).ok_or_else(|| ExampleError::ALine {
        line,
        content: content.to_string(),
    })?;
    let raw_id = group(&caps, "id").unwrap_or_default();
    let id = example_id(raw_id).ok_or_else(|| ExampleError::InvalidId {
        line,
        id: raw_id.to_string(),
    })?;
    Ok(Example {
        id,
        sentence: group(&caps, "japanese").unwrap_or_default(),
        translation: group(&caps, "english").unwrap_or_default(),
    })
}

/// Contents of a `B:` line.
pub fn parse_annotation(content: &str, line: usize) -> Result<&str, ExampleError> {
    b_line()
        .captures(content)
        .and_then(|caps| caps.name("contents"))
        .map(|m| m.as_str())
        .ok_or_else(|| ExampleError::BLine {
            line,
            content: content.to_string(),
        })
}

pub fn tokens(contents: &str) -> impl Iterator<Item = Token<'_>> {
    token_pattern().captures_iter(contents).map(|caps| Token {
        writing: group(&caps, "writing").unwrap_or_default(),
        reading: group(&caps, "reading"),
        index: group(&caps, "index"),
        expression: group(&caps, "expression"),
        verified: caps.name("verified").is_some(),
    })
}

/// Entries a token refers to. An empty reading counts as no reading.
pub fn resolve_token(index: &EntryStore, token: &Token<'_>) -> Result<Vec<i64>, StoreError> {
    match token.reading {
        Some(reading) if !reading.is_empty() => {
            index.seqs_by_writing_and_reading(token.writing, reading)
        }
        _ => index.seqs_by_writing(token.writing),
    }
}

/// Resolve every example in `source` against `index` and commit `examples`.
///
/// `index` must already be committed: the dictionary pass has to finish
/// before examples can refer to it.
pub fn resolve_examples<R: BufRead>(
    source: R,
    index: &EntryStore,
    examples: &mut ExampleStore,
) -> Result<ResolveReport, ExampleError> {
    if !index.is_committed() {
        return Err(StoreError::NotCommitted.into());
    }

    let mut report = ResolveReport::default();
    let mut lines = source.lines().enumerate().map(|(i, l)| (i + 1, l));

    while let Some((a_no, a_text)) = lines.next() {
        let a_text = a_text?;
        let a_text = a_text.trim_end_matches('\r');
        if a_text.is_empty() {
            continue;
        }
        let example = parse_example(a_text, a_no)?;

        let (b_no, b_text) = lines.next().ok_or(ExampleError::MissingBLine { line: a_no })?;
        let b_text = b_text?;
        let contents = parse_annotation(b_text.trim_end_matches('\r'), b_no)?;

        resolve_line(index, examples, &example, contents, b_no, &mut report)?;
    }

    examples.commit()?;
    info!(
        examples = report.examples,
        references = report.references,
        unresolved = report.unresolved,
        ambiguous = report.ambiguous.len(),
        "examples resolved"
    );
    Ok(report)
}

fn resolve_line(
    index: &EntryStore,
    examples: &ExampleStore,
    example: &Example<'_>,
    contents: &str,
    line: usize,
    report: &mut ResolveReport,
) -> Result<(), ExampleError> {
    let mut written = false;
    let mut referenced = BTreeSet::new();

    for token in tokens(contents).filter(|t| t.verified) {
        let matches = resolve_token(index, &token)?;
        if matches.is_empty() {
            debug!(line, writing = token.writing, "unresolved token");
            report.unresolved += 1;
            continue;
        }

        if !written {
            written = true;
            match examples.insert_example(example.id, example.sentence, example.translation)? {
                Inserted::Row => report.examples += 1,
                Inserted::Skipped => warn!(id = example.id, line, "duplicate example id"),
            }
        }

        if matches.len() > 1 {
            warn!(line, writing = token.writing, contents, "ambiguous: {}", token.writing);
            report.ambiguous.push(Ambiguity {
                line,
                writing: token.writing.to_string(),
                reading: token.reading.map(str::to_string),
                contents: contents.to_string(),
                matches: matches.clone(),
            });
        }

        for &seq in &matches {
            if !referenced.insert(seq) {
                continue;
            }
            match examples.insert_reference(example.id, seq, matches.len())? {
                Inserted::Row => report.references += 1,
                Inserted::Skipped => warn!(id = example.id, seq, line, "duplicate example reference"),
            }
        }
    }
    Ok(())
}

/// Resolve the corpus at `corpus` against the entry store at `jmdict`,
/// writing `output`.
pub fn resolve_to_file(
    corpus: &Path,
    output: &Path,
    jmdict: &Path,
) -> Result<ResolveReport, ExampleError> {
    let index = EntryStore::open(jmdict)?;
    let source = BufReader::new(File::open(corpus)?);
    let mut examples = ExampleStore::create(output)?;
    info!(corpus = %corpus.display(), output = %output.display(), "resolving examples");
    resolve_examples(source, &index, &mut examples)
}
