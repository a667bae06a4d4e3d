//! Entry accumulation state machine.
//!
//! Consumes element/character events for a JMdict-shaped document and emits
//! one [`EntryRecord`] per closed `<entry>`. All per-entry buffers live inside
//! the current [`State`] and are moved out on flush, so nothing from one
//! entry can leak into the next.

use std::mem;

use tracing::debug;

use crate::entry::{
    Entry, EntryRecord, MetadataKind, SenseGroupMetadata, SenseMetadata, Tiered, Translation,
};
use crate::markup::Attributes;


const ENTRY: &str = "entry";
const ENT_SEQ: &str = "ent_seq";
const K_ELE: &str = "k_ele";
const KEB: &str = "keb";
const KE_PRI: &str = "ke_pri";
const R_ELE: &str = "r_ele";
const REB: &str = "reb";
const RE_PRI: &str = "re_pri";
const SENSE: &str = "sense";
const GLOSS: &str = "gloss";
const POS: &str = "pos";
const LSOURCE: &str = "lsource";

const LANG_ATTR: &str = "xml:lang";
/// JMdict's default for `<lsource>` without `xml:lang`.
const LSOURCE_DEFAULT_LANG: &str = "eng";

/// Structural errors. Any of these aborts the pass.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected <{element}> {state}")]
    UnexpectedOpen {
        element: String,
        state: &'static str,
    },

    #[error("unexpected </{element}> {state}")]
    UnexpectedClose {
        element: String,
        state: &'static str,
    },

    #[error("invalid sequence number: {0:?}")]
    InvalidSequence(String),

    #[error("entry closed without a sequence number")]
    MissingSequence,

    #[error("document ended inside an entry")]
    UnclosedEntry,
}

enum State {
    Idle,
    InEntry(EntryBuffers),
    InSense(EntryBuffers, SenseBuffers),
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            State::Idle => "outside any entry",
            State::InEntry(_) => "inside an entry",
            State::InSense(..) => "inside a sense",
        }
    }
}

#[derive(Default)]
struct EntryBuffers {
    seq: Option<i64>,
    writings: Tiered,
    readings: Tiered,
    metadata: SenseMetadata,
    /// Text of the last `<keb>`/`<reb>`, waiting for its element to close.
    surface: Option<String>,
    /// A priority marker was seen inside the open `<k_ele>`/`<r_ele>`.
    element_priority: bool,
    current_lang: Option<String>,
    sense_array: Vec<Vec<String>>,
    /// Translations already flushed by a language change, in order.
    flushed: Vec<(String, Vec<Vec<String>>)>,
    text: String,
}

impl EntryBuffers {
    fn start_child(&mut self, name: &str) {
        self.text.clear();
        if name == KE_PRI || name == RE_PRI {
            self.element_priority = true;
        }
    }

    fn end_child(&mut self, name: &str) -> Result<(), ParseError> {
        match name {
            ENT_SEQ => {
                let text = mem::take(&mut self.text);
                let seq = text
                    .trim()
                    .parse()
                    .map_err(|_| ParseError::InvalidSequence(text))?;
                self.seq = Some(seq);
            }
            KEB | REB => self.surface = Some(mem::take(&mut self.text)),
            K_ELE => {
                let priority = mem::take(&mut self.element_priority);
                if let Some(surface) = self.surface.take() {
                    self.writings.push(surface, priority);
                }
            }
            R_ELE => {
                let priority = mem::take(&mut self.element_priority);
                if let Some(surface) = self.surface.take() {
                    self.readings.push(surface, priority);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Move the pending sense groups out as a translation for
    /// `current_lang`. No-op when nothing is pending.
    fn flush_translation(&mut self) {
        if self.sense_array.is_empty() {
            return;
        }
        let senses = mem::take(&mut self.sense_array);
        if let Some(lang) = &self.current_lang {
            self.flushed.push((lang.clone(), senses));
        }
    }

    fn finish(mut self) -> Result<EntryRecord, ParseError> {
        let seq = self.seq.ok_or(ParseError::MissingSequence)?;
        self.flush_translation();

        let translations = self
            .flushed
            .into_iter()
            .map(|(lang, senses)| Translation { seq, lang, senses })
            .collect();

        Ok(EntryRecord {
            entry: Entry {
                seq,
                writings: self.writings,
                readings: self.readings,
                metadata: self.metadata,
            },
            translations,
        })
    }
}

#[derive(Default)]
struct SenseBuffers {
    /// Set by the first `<pos>`/`<gloss>`; until then the sense has not
    /// started a group.
    opened: bool,
    glosses: Vec<String>,
    metadata: SenseGroupMetadata,
    lsource_lang: Option<String>,
}

impl SenseBuffers {
    fn end_child(&mut self, name: &str, text: String) {
        if name == GLOSS {
            self.glosses.push(text);
            return;
        }
        let Some(kind) = MetadataKind::from_element(name) else {
            return;
        };
        if kind == MetadataKind::Lsource {
            let lang = self
                .lsource_lang
                .take()
                .unwrap_or_else(|| LSOURCE_DEFAULT_LANG.to_string());
            let value = if text.is_empty() {
                lang
            } else {
                format!("{lang}:{text}")
            };
            self.metadata.push(kind, value);
        } else if !text.is_empty() {
            self.metadata.push(kind, text);
        }
    }
}

/// Turns a stream of element events into [`EntryRecord`]s.
pub struct Accumulator {
    primary_language: String,
    state: State,
}

impl Accumulator {
    /// `primary_language` is the language whose sense groups carry metadata,
    /// and the language of a `<gloss>` without `xml:lang`.
    pub fn new(primary_language: impl Into<String>) -> Self {
        Self {
            primary_language: primary_language.into(),
            state: State::Idle,
        }
    }

    fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    pub fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
        let state = mem::replace(&mut self.state, State::Idle);
        self.state = match (state, name) {
            (State::Idle, ENTRY) => State::InEntry(EntryBuffers::default()),
            // Document root and anything else between entries.
            (State::Idle, _) => State::Idle,
            (state, ENTRY) => return Err(unexpected_open(name, &state)),
            (State::InEntry(mut entry), SENSE) => {
                entry.start_child(name);
                State::InSense(entry, SenseBuffers::default())
            }
            (state @ State::InEntry(_), _)
                if name == GLOSS || MetadataKind::from_element(name).is_some() =>
            {
                return Err(unexpected_open(name, &state));
            }
            (State::InEntry(mut entry), _) => {
                entry.start_child(name);
                State::InEntry(entry)
            }
            (state @ State::InSense(..), SENSE) => return Err(unexpected_open(name, &state)),
            (State::InSense(mut entry, mut sense), _) => {
                entry.start_child(name);
                let gloss_lang = (name == GLOSS)
                    .then(|| attrs.get(LANG_ATTR).unwrap_or(self.primary_language.as_str()));
                if !sense.opened && (name == POS || name == GLOSS) {
                    let lang = gloss_lang.unwrap_or(self.primary_language.as_str());
                    open_group(&mut entry, &mut sense, lang);
                } else if let Some(lang) = gloss_lang {
                    // The group language is fixed by the sense's first child.
                    if entry.current_lang.as_deref() != Some(lang) {
                        debug!(
                            seq = ?entry.seq,
                            lang,
                            group_lang = ?entry.current_lang,
                            "gloss kept in a sense group of another language"
                        );
                    }
                }
                if name == LSOURCE {
                    sense.lsource_lang = attrs.get(LANG_ATTR).map(str::to_string);
                }
                State::InSense(entry, sense)
            }
        };
        Ok(())
    }

    /// Returns the finished record when `name` closes an entry.
    pub fn end_element(&mut self, name: &str) -> Result<Option<EntryRecord>, ParseError> {
        let state = mem::replace(&mut self.state, State::Idle);
        match (state, name) {
            (State::InEntry(entry), ENTRY) => return entry.finish().map(Some),
            (State::InSense(mut entry, sense), SENSE) => {
                self.close_sense(&mut entry, sense);
                self.state = State::InEntry(entry);
            }
            (state, ENTRY | SENSE) => {
                return Err(ParseError::UnexpectedClose {
                    element: name.to_string(),
                    state: state.describe(),
                });
            }
            (State::Idle, _) => {}
            (State::InEntry(mut entry), _) => {
                entry.end_child(name)?;
                self.state = State::InEntry(entry);
            }
            (State::InSense(mut entry, mut sense), _) => {
                let text = mem::take(&mut entry.text);
                sense.end_child(name, text);
                self.state = State::InSense(entry, sense);
            }
        }
        Ok(None)
    }

    pub fn characters(&mut self, text: &str) {
        match &mut self.state {
            State::InEntry(entry) | State::InSense(entry, _) => entry.text.push_str(text),
            State::Idle => {}
        }
    }

    /// Fails if the document ended with an entry still open.
    pub fn end_document(&self) -> Result<(), ParseError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(ParseError::UnclosedEntry)
        }
    }

    fn close_sense(&self, entry: &mut EntryBuffers, sense: SenseBuffers) {
        if !sense.opened {
            debug!(seq = ?entry.seq, "sense without pos or gloss ignored");
            return;
        }
        entry.sense_array.push(sense.glosses);
        if entry.current_lang.as_deref() == Some(self.primary_language.as_str()) {
            entry.metadata.push_group(sense.metadata);
        }
    }
}

/// Start a sense group in `lang`, flushing the pending translation first if
/// the language changed.
fn open_group(entry: &mut EntryBuffers, sense: &mut SenseBuffers, lang: &str) {
    if entry.current_lang.as_deref() != Some(lang) {
        entry.flush_translation();
        entry.current_lang = Some(lang.to_string());
    }
    sense.opened = true;
}

fn unexpected_open(name: &str, state: &State) -> ParseError {
    ParseError::UnexpectedOpen {
        element: name.to_string(),
        state: state.describe(),
    }
}
