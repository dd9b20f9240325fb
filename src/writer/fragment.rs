//! Buffered Fragment Writer
//!
//! Records writer events into an owned `Fragment` instead of touching a
//! document. The fragment is committed afterwards with
//! `XmlTree::insert_fragment`, so a failed emission leaves the target
//! document untouched.

use super::{WriterState, XmlWriter};
use crate::error::WriteError;

/// One buffered event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentEvent {
    StartElement { prefix: String, local_name: String },
    EndElement,
    /// Complete attribute; applies to the innermost open element, or to the
    /// insertion parent when no element is open
    Attribute {
        prefix: String,
        local_name: String,
        value: String,
    },
    Text(String),
}

/// Balanced sequence of writer events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    events: Vec<FragmentEvent>,
}

impl Fragment {
    pub fn events(&self) -> &[FragmentEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Pending attribute being accumulated between start and end
#[derive(Debug)]
struct PendingAttribute {
    prefix: String,
    local_name: String,
    value: String,
}

/// Writer that buffers into a `Fragment`
#[derive(Debug)]
pub struct FragmentWriter {
    events: Vec<FragmentEvent>,
    pending: Option<PendingAttribute>,
    state: WriterState,
}

impl FragmentWriter {
    pub fn new() -> Self {
        FragmentWriter {
            events: Vec::new(),
            pending: None,
            // One base frame: the element the fragment will be inserted under
            state: WriterState::new(1),
        }
    }

    /// Finish buffering, failing if anything is still open
    pub fn into_fragment(self) -> Result<Fragment, WriteError> {
        self.state.finish()?;
        Ok(Fragment {
            events: self.events,
        })
    }
}

impl Default for FragmentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter for FragmentWriter {
    fn write_start_element(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError> {
        self.state.start_element(prefix, local_name)?;
        self.events.push(FragmentEvent::StartElement {
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
        });
        Ok(())
    }

    fn write_end_element(&mut self) -> Result<(), WriteError> {
        self.state.end_element()?;
        self.events.push(FragmentEvent::EndElement);
        Ok(())
    }

    fn write_start_attribute(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError> {
        self.state.start_attribute(prefix, local_name)?;
        self.pending = Some(PendingAttribute {
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            value: String::new(),
        });
        Ok(())
    }

    fn write_end_attribute(&mut self) -> Result<(), WriteError> {
        self.state.end_attribute()?;
        let PendingAttribute {
            prefix,
            local_name,
            value,
        } = self.pending.take().ok_or(WriteError::NoOpenAttribute)?;
        self.events.push(FragmentEvent::Attribute {
            prefix,
            local_name,
            value,
        });
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> Result<(), WriteError> {
        if let Some(pending) = self.pending.as_mut() {
            pending.value.push_str(text);
            return Ok(());
        }
        self.state.text();
        if text.is_empty() {
            return Ok(());
        }
        // Merge adjacent text runs
        if let Some(FragmentEvent::Text(last)) = self.events.last_mut() {
            last.push_str(text);
        } else {
            self.events.push(FragmentEvent::Text(text.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_events() {
        let mut w = FragmentWriter::new();
        w.write_start_element("", "a").unwrap();
        w.write_attribute("", "k", "v").unwrap();
        w.write_string("x").unwrap();
        w.write_string("y").unwrap();
        w.write_end_element().unwrap();
        let fragment = w.into_fragment().unwrap();
        assert_eq!(
            fragment.events(),
            &[
                FragmentEvent::StartElement {
                    prefix: String::new(),
                    local_name: "a".into()
                },
                FragmentEvent::Attribute {
                    prefix: String::new(),
                    local_name: "k".into(),
                    value: "v".into()
                },
                FragmentEvent::Text("xy".into()),
                FragmentEvent::EndElement,
            ]
        );
    }

    #[test]
    fn test_leading_attribute_allowed() {
        let mut w = FragmentWriter::new();
        w.write_attribute("", "k", "v").unwrap();
        let fragment = w.into_fragment().unwrap();
        assert_eq!(fragment.events().len(), 1);
    }

    #[test]
    fn test_unbalanced_rejected() {
        let mut w = FragmentWriter::new();
        w.write_start_element("", "a").unwrap();
        assert_eq!(w.into_fragment(), Err(WriteError::Unclosed(1)));

        let mut w = FragmentWriter::new();
        assert_eq!(w.write_end_element(), Err(WriteError::NoOpenElement));
    }
}
