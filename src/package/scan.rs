//! Single-pass start-tag scanner over release-page markup.
//!
//! Release pages are scanned for exactly one attribute value, so a full DOM
//! is never built: the reader visits start tags in document order and stops
//! at the first tag matching the target name whose target attribute carries
//! a non-empty value accepted by the optional predicates.

use quick_xml::events::Event;
use quick_xml::Reader;

/// A forward-only scan for one attribute value.
pub struct TagScan<'a> {
    tag: &'a str,
    attribute: &'a str,
    name_predicate: Option<fn(&str) -> bool>,
    value_predicate: Option<fn(&str) -> bool>,
}

impl<'a> TagScan<'a> {
    pub fn new(tag: &'a str, attribute: &'a str) -> Self {
        debug_assert!(!tag.is_empty(), "target tag cannot be empty");
        debug_assert!(!attribute.is_empty(), "target attribute cannot be empty");

        Self {
            tag,
            attribute,
            name_predicate: None,
            value_predicate: None,
        }
    }

    /// Additionally require the attribute name to satisfy a predicate.
    pub fn name_predicate(mut self, predicate: fn(&str) -> bool) -> Self {
        self.name_predicate = Some(predicate);
        self
    }

    /// Additionally require the attribute value to satisfy a predicate.
    pub fn value_predicate(mut self, predicate: fn(&str) -> bool) -> Self {
        self.value_predicate = Some(predicate);
        self
    }

    /// Return the first matching attribute value in document order.
    pub fn first_match(&self, markup: &str) -> Option<String> {
        let mut reader = Reader::from_str(markup);
        // Release pages are HTML, not XML; stay lenient about tag pairing.
        reader.config_mut().check_end_names = false;

        let mut last_error_position = usize::MAX;

        loop {
            match reader.read_event() {
                Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => {
                    if tag.name().as_ref() != self.tag.as_bytes() {
                        continue;
                    }

                    for attribute in tag.attributes().with_checks(false).flatten() {
                        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
                        if key != self.attribute {
                            continue;
                        }

                        let value = String::from_utf8_lossy(&attribute.value).to_string();
                        if value.is_empty() {
                            continue;
                        }
                        if let Some(predicate) = self.name_predicate {
                            if !predicate(&key) {
                                continue;
                            }
                        }
                        if let Some(predicate) = self.value_predicate {
                            if !predicate(&value) {
                                continue;
                            }
                        }

                        return Some(value);
                    }
                }
                Ok(Event::Eof) => return None,
                Ok(_) => continue,
                Err(_) => {
                    // Skip past malformed markup; bail out if the reader
                    // stops making progress.
                    let position = reader.buffer_position() as usize;
                    if position == last_error_position {
                        return None;
                    }
                    last_error_position = position;
                }
            }
        }
    }
}
