//! Compiled Path Writer
//!
//! Interprets a `CompiledPathNode` tree into writer calls. For a complex
//! element every attribute subnode is written before any element subnode;
//! within one kind `next` comes first, then `dependencies` in order.
//!
//! Failures from the evaluator or writer are returned as-is. Nothing already
//! written is undone.

use super::node::{CompiledPathNode, PathNodeKind};
use crate::error::PathWriteError;
use crate::writer::XmlWriter;
use crate::xpath::Evaluator;

/// Emits compiled path nodes through a writer
pub struct PathWriter<'a, W: XmlWriter, E: Evaluator> {
    writer: &'a mut W,
    evaluator: &'a E,
}

impl<'a, W: XmlWriter, E: Evaluator> PathWriter<'a, W, E> {
    pub fn new(writer: &'a mut W, evaluator: &'a E) -> Self {
        PathWriter { writer, evaluator }
    }

    /// Write one node and everything it reaches
    pub fn write_node(&mut self, node: &CompiledPathNode) -> Result<(), PathWriteError> {
        debug_assert!(
            !node.local_name().is_empty(),
            "compiled path node without a local name"
        );
        tracing::trace!(
            kind = ?node.kind(),
            prefix = node.prefix(),
            name = node.local_name(),
            "write path node"
        );

        match node.kind() {
            PathNodeKind::Attribute => self.write_attribute(node),
            PathNodeKind::SimpleElement => self.write_simple_element(node),
            PathNodeKind::ComplexElement => self.write_complex_element(node),
        }
    }

    fn write_attribute(&mut self, node: &CompiledPathNode) -> Result<(), PathWriteError> {
        self.writer
            .write_start_attribute(node.prefix(), node.local_name())?;
        self.write_value(node)?;
        self.writer.write_end_attribute()?;
        Ok(())
    }

    fn write_simple_element(&mut self, node: &CompiledPathNode) -> Result<(), PathWriteError> {
        self.writer
            .write_start_element(node.prefix(), node.local_name())?;
        self.write_value(node)?;
        self.writer.write_end_element()?;
        Ok(())
    }

    fn write_complex_element(&mut self, node: &CompiledPathNode) -> Result<(), PathWriteError> {
        self.writer
            .write_start_element(node.prefix(), node.local_name())?;
        self.write_subnodes(node, true)?;
        self.write_subnodes(node, false)?;
        self.writer.write_end_element()?;
        Ok(())
    }

    /// Write the subnodes of `parent` whose attribute-ness equals `attributes`
    fn write_subnodes(
        &mut self,
        parent: &CompiledPathNode,
        attributes: bool,
    ) -> Result<(), PathWriteError> {
        if let Some(next) = parent.next() {
            if next.is_attribute() == attributes {
                self.write_node(next)?;
            }
        }
        for node in parent.dependencies() {
            if node.is_attribute() == attributes {
                self.write_node(node)?;
            }
        }
        Ok(())
    }

    fn write_value(&mut self, node: &CompiledPathNode) -> Result<(), PathWriteError> {
        let Some(expr) = node.value() else {
            return Ok(());
        };
        let value = self.evaluator.evaluate(expr)?;
        self.writer.write_value(&value)?;
        Ok(())
    }
}
