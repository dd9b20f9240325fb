//! Markup Text Writer
//!
//! Serializes writer events to a `String`. Start tags are left open until
//! the first content or child arrives so attributes can still be appended;
//! elements that never receive content are emitted as `<name/>`.

use super::escape::{escape_attribute, escape_text};
use super::{qualified_name, WriterState, XmlWriter};
use crate::error::WriteError;

/// Writer producing serialized markup
#[derive(Debug)]
pub struct TextWriter {
    out: String,
    /// Qualified names of open elements, for end tags
    names: Vec<String>,
    /// True while the innermost start tag still lacks its closing `>`
    tag_open: bool,
    state: WriterState,
}

impl TextWriter {
    pub fn new() -> Self {
        TextWriter {
            out: String::with_capacity(256),
            names: Vec::with_capacity(16),
            tag_open: false,
            state: WriterState::new(0),
        }
    }

    /// Markup written so far, regardless of open elements
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Return the markup, failing if anything is still open
    pub fn finish(self) -> Result<String, WriteError> {
        self.state.finish()?;
        Ok(self.out)
    }

    fn close_start_tag(&mut self) {
        if self.tag_open {
            self.out.push('>');
            self.tag_open = false;
        }
    }
}

impl Default for TextWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter for TextWriter {
    fn write_start_element(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError> {
        self.state.start_element(prefix, local_name)?;
        self.close_start_tag();
        let name = qualified_name(prefix, local_name);
        self.out.push('<');
        self.out.push_str(&name);
        self.names.push(name);
        self.tag_open = true;
        Ok(())
    }

    fn write_end_element(&mut self) -> Result<(), WriteError> {
        self.state.end_element()?;
        let name = self.names.pop().unwrap_or_default();
        if self.tag_open {
            self.out.push_str("/>");
            self.tag_open = false;
        } else {
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
        }
        Ok(())
    }

    fn write_start_attribute(&mut self, prefix: &str, local_name: &str) -> Result<(), WriteError> {
        self.state.start_attribute(prefix, local_name)?;
        self.out.push(' ');
        self.out.push_str(&qualified_name(prefix, local_name));
        self.out.push_str("=\"");
        Ok(())
    }

    fn write_end_attribute(&mut self) -> Result<(), WriteError> {
        self.state.end_attribute()?;
        self.out.push('"');
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> Result<(), WriteError> {
        if self.state.in_attribute() {
            self.out.push_str(&escape_attribute(text));
        } else {
            self.state.text();
            if text.is_empty() {
                return Ok(());
            }
            self.close_start_tag();
            self.out.push_str(&escape_text(text));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::XPathValue;

    #[test]
    fn test_nested_elements() {
        let mut w = TextWriter::new();
        w.write_start_element("", "root").unwrap();
        w.write_attribute("x", "id", "1").unwrap();
        w.write_start_element("", "a").unwrap();
        w.write_string("1 < 2").unwrap();
        w.write_end_element().unwrap();
        w.write_start_element("", "b").unwrap();
        w.write_end_element().unwrap();
        w.write_end_element().unwrap();
        assert_eq!(
            w.finish().unwrap(),
            r#"<root x:id="1"><a>1 &lt; 2</a><b/></root>"#
        );
    }

    #[test]
    fn test_write_value_number() {
        let mut w = TextWriter::new();
        w.write_start_element("", "n").unwrap();
        w.write_value(&XPathValue::Number(3.0)).unwrap();
        w.write_end_element().unwrap();
        assert_eq!(w.finish().unwrap(), "<n>3</n>");
    }

    #[test]
    fn test_attribute_after_text_fails() {
        let mut w = TextWriter::new();
        w.write_start_element("", "a").unwrap();
        w.write_string("x").unwrap();
        assert!(matches!(
            w.write_start_attribute("", "late"),
            Err(WriteError::AttributeAfterContent { .. })
        ));
    }

    #[test]
    fn test_unclosed_finish_fails() {
        let mut w = TextWriter::new();
        w.write_start_element("", "a").unwrap();
        assert_eq!(w.as_str(), "<a");
        assert_eq!(w.finish(), Err(WriteError::Unclosed(1)));
    }

    #[test]
    fn test_top_level_attribute_fails() {
        let mut w = TextWriter::new();
        assert_eq!(
            w.write_start_attribute("", "x"),
            Err(WriteError::NoOpenElement)
        );
    }
}
