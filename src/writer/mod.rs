//! Markup Writers
//!
//! The low-level document primitives every emitter goes through:
//! - `TextWriter`: serializes straight to markup text
//! - `FragmentWriter`: buffers a `Fragment` that is later committed into an `XmlTree`
//!
//! Both enforce the structural rule the format imposes: all attributes of an
//! element precede its content.

pub mod escape;
pub mod fragment;
pub mod text;

pub use fragment::{Fragment, FragmentEvent, FragmentWriter};
pub use text::TextWriter;

use crate::error::WriteError;
use crate::xpath::XPathValue;

/// Sink for element, attribute and scalar events
pub trait XmlWriter {
    /// Open an element; content and child elements follow until `write_end_element`
    fn write_start_element(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError>;

    /// Close the innermost open element
    fn write_end_element(&mut self) -> Result<(), WriteError>;

    /// Open an attribute on the innermost open element
    fn write_start_attribute(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError>;

    /// Close the open attribute
    fn write_end_attribute(&mut self) -> Result<(), WriteError>;

    /// Write character data into the open attribute, or as element content
    fn write_string(&mut self, text: &str) -> Result<(), WriteError>;

    /// Write a scalar in its canonical string form
    fn write_value(&mut self, value: &XPathValue) -> Result<(), WriteError> {
        self.write_string(&value.to_string_value())
    }

    /// Write a complete attribute
    fn write_attribute(&mut self, prefix: &str, local_name: &str, value: &str) -> Result<(), WriteError> {
        self.write_start_attribute(prefix, local_name)?;
        self.write_string(value)?;
        self.write_end_attribute()
    }
}

/// Format a prefixed name
pub(crate) fn qualified_name(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}

/// Per-element bookkeeping
#[derive(Debug, Default, Clone, Copy)]
struct Frame {
    has_content: bool,
}

/// Ordering rules shared by the writers
///
/// `base` frames sit below the first element the writer opens. A fragment
/// writer uses one base frame standing for the insertion parent, which is
/// what lets a fragment start with an attribute.
#[derive(Debug)]
pub(crate) struct WriterState {
    frames: Vec<Frame>,
    base: usize,
    in_attribute: bool,
}

impl WriterState {
    pub(crate) fn new(base: usize) -> Self {
        WriterState {
            frames: vec![Frame::default(); base],
            base,
            in_attribute: false,
        }
    }

    pub(crate) fn start_element(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError> {
        if local_name.is_empty() {
            return Err(WriteError::EmptyName);
        }
        if self.in_attribute {
            return Err(WriteError::ElementInsideAttribute {
                name: qualified_name(prefix, local_name),
            });
        }
        if let Some(parent) = self.frames.last_mut() {
            parent.has_content = true;
        }
        self.frames.push(Frame::default());
        Ok(())
    }

    /// Returns whether the closed element had content
    pub(crate) fn end_element(&mut self) -> Result<bool, WriteError> {
        if self.in_attribute {
            return Err(WriteError::OpenAttribute);
        }
        if self.frames.len() <= self.base {
            return Err(WriteError::NoOpenElement);
        }
        Ok(self.frames.pop().map(|f| f.has_content).unwrap_or(false))
    }

    pub(crate) fn start_attribute(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError> {
        if local_name.is_empty() {
            return Err(WriteError::EmptyName);
        }
        if self.in_attribute {
            return Err(WriteError::NestedAttribute {
                name: qualified_name(prefix, local_name),
            });
        }
        let frame = self.frames.last().ok_or(WriteError::NoOpenElement)?;
        if frame.has_content {
            return Err(WriteError::AttributeAfterContent {
                name: qualified_name(prefix, local_name),
            });
        }
        self.in_attribute = true;
        Ok(())
    }

    pub(crate) fn end_attribute(&mut self) -> Result<(), WriteError> {
        if !self.in_attribute {
            return Err(WriteError::NoOpenAttribute);
        }
        self.in_attribute = false;
        Ok(())
    }

    pub(crate) fn text(&mut self) {
        if !self.in_attribute {
            if let Some(frame) = self.frames.last_mut() {
                frame.has_content = true;
            }
        }
    }

    pub(crate) fn in_attribute(&self) -> bool {
        self.in_attribute
    }

    /// Number of elements opened by this writer and not yet closed
    pub(crate) fn open_elements(&self) -> usize {
        self.frames.len() - self.base
    }

    pub(crate) fn finish(&self) -> Result<(), WriteError> {
        if self.in_attribute {
            return Err(WriteError::OpenAttribute);
        }
        match self.open_elements() {
            0 => Ok(()),
            n => Err(WriteError::Unclosed(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_after_content_rejected() {
        let mut state = WriterState::new(0);
        state.start_element("", "a").unwrap();
        state.text();
        let err = state.start_attribute("", "x").unwrap_err();
        assert_eq!(err, WriteError::AttributeAfterContent { name: "x".into() });
    }

    #[test]
    fn test_child_element_counts_as_content() {
        let mut state = WriterState::new(0);
        state.start_element("", "a").unwrap();
        state.start_element("", "b").unwrap();
        assert!(!state.end_element().unwrap());
        assert!(state.start_attribute("p", "x").is_err());
    }

    #[test]
    fn test_base_frame_allows_leading_attribute() {
        let mut state = WriterState::new(1);
        state.start_attribute("", "x").unwrap();
        state.end_attribute().unwrap();
        assert_eq!(state.end_element(), Err(WriteError::NoOpenElement));
        assert!(state.finish().is_ok());
    }

    #[test]
    fn test_finish_reports_open_elements() {
        let mut state = WriterState::new(0);
        state.start_element("", "a").unwrap();
        state.start_element("", "b").unwrap();
        assert_eq!(state.finish(), Err(WriteError::Unclosed(2)));
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("", "a"), "a");
        assert_eq!(qualified_name("x", "a"), "x:a");
    }
}
