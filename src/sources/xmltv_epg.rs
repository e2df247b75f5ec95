//! Streaming XMLTV guide parser
//!
//! Only `programme` elements are read: the `channel`/`start`/`stop`
//! attributes and the first `title`, `desc` and `category` children.
//! Everything else in the document is skipped.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::{SourceError, SourceResult};
use crate::models::epg_program::{
    DEFAULT_PROGRAM_CATEGORY, DEFAULT_PROGRAM_DESCRIPTION, DEFAULT_PROGRAM_TITLE,
};
use crate::models::Program;
use crate::utils::time::{TimezonePolicy, parse_xmltv_timestamp};

const FORMAT: &str = "xmltv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Category,
}

impl Field {
    fn from_element(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "desc" => Some(Self::Description),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

/// A `programme` element whose end tag has not been seen yet
#[derive(Debug, Default)]
struct PendingProgramme {
    channel: String,
    start: String,
    stop: Option<String>,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
}

impl PendingProgramme {
    fn from_element(element: &BytesStart) -> Self {
        let mut attrs = parse_attributes(element);
        Self {
            channel: attrs.remove("channel").unwrap_or_default(),
            start: attrs.remove("start").unwrap_or_default(),
            stop: attrs.remove("stop"),
            ..Self::default()
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Category => &mut self.category,
        }
    }

    /// Finish the programme, or None when its time range cannot be read
    fn complete(self, policy: TimezonePolicy) -> Option<Program> {
        let stop = self.stop.as_deref().unwrap_or_default();
        let (start_time, end_time) = match (
            parse_xmltv_timestamp(&self.start, policy),
            parse_xmltv_timestamp(stop, policy),
        ) {
            (Ok(start), Ok(end)) => (start, end),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    "Skipping programme '{}' on channel '{}': {}",
                    self.title.as_deref().unwrap_or(DEFAULT_PROGRAM_TITLE),
                    self.channel,
                    e
                );
                return None;
            }
        };

        Some(Program {
            channel: self.channel,
            start_time,
            end_time,
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_PROGRAM_TITLE.to_string()),
            description: non_empty(self.description.map(|d| d.trim().to_string()))
                .unwrap_or_else(|| DEFAULT_PROGRAM_DESCRIPTION.to_string()),
            category: non_empty(self.category.map(|c| c.trim().to_string()))
                .unwrap_or_else(|| DEFAULT_PROGRAM_CATEGORY.to_string()),
        })
    }
}

/// Text capture for the child element currently open
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

/// Parse a guide document into programmes, in document order
///
/// Programmes whose `start` or `stop` cannot be parsed are skipped with a
/// warning. A document that is not well-formed fails the whole parse.
pub fn parse_guide(content: &str, policy: TimezonePolicy) -> SourceResult<Vec<Program>> {
    let mut reader = Reader::from_str(content);

    let mut programs = Vec::new();
    let mut skipped = 0usize;
    let mut pending: Option<PendingProgramme> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e)?;
                if let Some(active) = capture.as_mut() {
                    active.depth += 1;
                } else if name == "programme" {
                    pending = Some(PendingProgramme::from_element(e));
                } else if let (Some(programme), Some(field)) =
                    (pending.as_mut(), Field::from_element(&name))
                    && programme.slot(field).is_none()
                {
                    capture = Some(Capture {
                        field,
                        depth: 0,
                        text: String::new(),
                    });
                }
            }

            Ok(Event::End(ref e)) => {
                if let Some(mut active) = capture.take() {
                    if active.depth > 0 {
                        active.depth -= 1;
                        capture = Some(active);
                    } else if let Some(programme) = pending.as_mut() {
                        *programme.slot(active.field) = Some(active.text);
                    }
                    continue;
                }

                if e.name().as_ref() == b"programme"
                    && let Some(programme) = pending.take()
                {
                    match programme.complete(policy) {
                        Some(program) => programs.push(program),
                        None => skipped += 1,
                    }
                }
            }

            Ok(Event::Empty(ref e)) => {
                let name = element_name(e)?;
                if capture.is_some() {
                    continue;
                }
                if name == "programme" {
                    match PendingProgramme::from_element(e).complete(policy) {
                        Some(program) => programs.push(program),
                        None => skipped += 1,
                    }
                } else if let (Some(programme), Some(field)) =
                    (pending.as_mut(), Field::from_element(&name))
                {
                    let slot = programme.slot(field);
                    if slot.is_none() {
                        *slot = Some(String::new());
                    }
                }
            }

            Ok(Event::Text(e)) => {
                if let Some(active) = capture.as_mut() {
                    let text = std::str::from_utf8(&e).map_err(|e| {
                        SourceError::format(FORMAT, format!("Invalid UTF-8 in text: {e}"))
                    })?;
                    active.text.push_str(text);
                }
            }

            Ok(Event::CData(e)) => {
                if let Some(active) = capture.as_mut() {
                    let text = std::str::from_utf8(&e).map_err(|e| {
                        SourceError::format(FORMAT, format!("Invalid UTF-8 in CDATA: {e}"))
                    })?;
                    active.text.push_str(text);
                }
            }

            Ok(Event::GeneralRef(e)) => {
                if let Some(active) = capture.as_mut() {
                    let name = std::str::from_utf8(&e).map_err(|e| {
                        SourceError::format(FORMAT, format!("Invalid UTF-8 in entity: {e}"))
                    })?;
                    match resolve_entity(name) {
                        Some(c) => active.text.push(c),
                        None => {
                            active.text.push('&');
                            active.text.push_str(name);
                            active.text.push(';');
                        }
                    }
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(SourceError::format(
                    FORMAT,
                    format!(
                        "XML parsing error at position {}: {e}",
                        reader.error_position()
                    ),
                ));
            }

            _ => {}
        }
    }

    if skipped > 0 {
        warn!("Skipped {} programmes with unreadable start/stop times", skipped);
    }
    debug!("Parsed {} programmes from guide", programs.len());
    Ok(programs)
}

fn element_name(element: &BytesStart) -> SourceResult<String> {
    std::str::from_utf8(element.name().as_ref())
        .map(str::to_string)
        .map_err(|e| SourceError::format(FORMAT, format!("Invalid UTF-8 in XML element name: {e}")))
}

fn parse_attributes(element: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    for attr in element.attributes().flatten() {
        let Ok(key) = std::str::from_utf8(attr.key.as_ref()) else {
            continue;
        };
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(e) => {
                // Unknown entity or bad reference: keep the raw text
                debug!("Attribute '{}' kept unescaped: {}", key, e);
                match std::str::from_utf8(&attr.value) {
                    Ok(raw) => raw.to_string(),
                    Err(_) => continue,
                }
            }
        };
        attrs.insert(key.to_string(), value);
    }
    attrs
}

/// Predefined XML entities and numeric character references
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let reference = name.strip_prefix('#')?;
            let code = match reference.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => reference.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
