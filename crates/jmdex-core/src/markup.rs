//! Structured-markup event source.
//!
//! [`parse_markup`] drives a [`MarkupHandler`] with SAX-style callbacks from a
//! `quick-xml` pull reader. Entities declared in the document's internal
//! DTD subset are reported once through
//! [`MarkupHandler::entity_declared`]; references to them inside character
//! data are replaced by the entity *name* (JMdict encodes part-of-speech and
//! similar codes this way, and the name is the compact code to store).

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::sync::OnceLock;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
}

/// Element attributes in document order, with unescaped values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Receiver for markup events, in document order.
pub trait MarkupHandler {
    type Error: From<MarkupError>;

    fn start_document(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<(), Self::Error>;

    fn end_element(&mut self, name: &str) -> Result<(), Self::Error>;

    fn characters(&mut self, text: &str) -> Result<(), Self::Error>;

    fn entity_declared(&mut self, _name: &str, _content: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Stream `source` through `handler`.
///
/// Empty elements are delivered as a start/end pair. Whitespace-only text
/// between elements is dropped. Mismatched end tags are reported as
/// [`MarkupError::Xml`].
pub fn parse_markup<R: BufRead, H: MarkupHandler>(
    source: R,
    handler: &mut H,
) -> Result<(), H::Error> {
    let mut reader = Reader::from_reader(source);
    let config = reader.config_mut();
    config.trim_text(true);
    config.expand_empty_elements = true;

    let mut entities: HashMap<String, String> = HashMap::new();
    let mut buf = Vec::new();

    handler.start_document()?;
    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(source) => {
                return Err(MarkupError::Xml {
                    position: reader.error_position(),
                    source,
                }
                .into())
            }
        };

        match event {
            Event::DocType(doctype) => {
                let doctype = String::from_utf8_lossy(&doctype);
                for (name, content) in entity_declarations(&doctype) {
                    handler.entity_declared(&name, &content)?;
                    entities.insert(name, content);
                }
            }
            Event::Start(start) => {
                let name = element_name(&start);
                let attrs = read_attributes(&start)?;
                handler.start_element(&name, &attrs)?;
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                handler.end_element(&name)?;
            }
            Event::Text(text) => {
                let resolved = text
                    .unescape_with(|entity| {
                        resolve_predefined_entity(entity).or_else(|| {
                            entities
                                .get_key_value(entity)
                                .map(|(name, _)| name.as_str())
                        })
                    })
                    .map_err(|source| MarkupError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                handler.characters(&resolved)?;
            }
            Event::CData(cdata) => {
                handler.characters(&String::from_utf8_lossy(&cdata))?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    handler.end_document()
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn read_attributes(start: &BytesStart<'_>) -> Result<Attributes, MarkupError> {
    let mut pairs = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| MarkupError::Xml {
                position: 0,
                source,
            })?
            .into_owned();
        pairs.push((key, value));
    }
    Ok(Attributes::new(pairs))
}

/// Internal general-entity declarations (`<!ENTITY name "content">`) in a
/// DOCTYPE body, in declaration order. Parameter entities are skipped.
pub fn entity_declarations(doctype: &str) -> Vec<(String, String)> {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let re = ENTITY.get_or_init(|| {
        Regex::new(r#"<!ENTITY\s+([^\s%"]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
            .expect("entity declaration pattern is valid")
    });

    re.captures_iter(doctype)
        .map(|caps| {
            let content = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_string(), content.to_string())
        })
        .collect()
}
