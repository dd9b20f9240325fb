//! Document Adapter
//!
//! `XmlAdapter` is the parent context every serializer and accessor works
//! against: it owns the document, the reference table for the current
//! operation and the compiled-expression cache. `AdapterMeta` is the
//! per-type metadata scope shared between adapters; it owns the slot
//! accessor cache and hands out accessor ids.
//!
//! Properties live as child elements of the root, named after the property.

use crate::accessor::{AccessorCache, PropertyAccessor, ReferenceTable, XmlAccessor};
use crate::dom::{NodeId, XmlTree};
use crate::error::{CodecError, ConstructionError, EvalError, WriteError};
use crate::serializer::Tuple;
use crate::settings::AdapterSettings;
use crate::value::{TypeDescriptor, Value};
use crate::xpath::{Evaluator, ExpressionCache, NodeEvaluator, XPathValue};
use std::sync::Arc;

/// Metadata scope shared by adapters of one type
#[derive(Debug, Default)]
pub struct AdapterMeta {
    accessors: AccessorCache,
}

impl AdapterMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accessors(&self) -> &AccessorCache {
        &self.accessors
    }

    /// Declare a property and build its serializer
    pub fn property(
        &self,
        name: &str,
        descriptor: TypeDescriptor,
        is_reference: bool,
    ) -> Result<PropertyAccessor, ConstructionError> {
        PropertyAccessor::new(self.accessors.allocate_id(), name, descriptor, is_reference)
    }
}

/// A document together with the state one adapter keeps over it
#[derive(Debug)]
pub struct XmlAdapter {
    tree: XmlTree,
    root: NodeId,
    references: ReferenceTable,
    meta: Arc<AdapterMeta>,
    settings: AdapterSettings,
    expressions: ExpressionCache,
}

impl XmlAdapter {
    /// Adapter over a new document with an empty root element
    pub fn new(meta: Arc<AdapterMeta>, settings: AdapterSettings) -> Self {
        Self::from_tree(XmlTree::new(), meta, settings)
    }

    /// Adapter over an existing document
    ///
    /// The first element of the document is the root; one is created when
    /// the document has none.
    pub fn from_tree(mut tree: XmlTree, meta: Arc<AdapterMeta>, settings: AdapterSettings) -> Self {
        let root = match tree.root_element() {
            Some(root) => root,
            None => {
                let root = tree.append_element(XmlTree::DOCUMENT, "", &settings.root_name);
                tree.set_attribute(root, "xmlns", &settings.xsi_prefix, &settings.xsi_namespace);
                tree.set_attribute(root, "xmlns", &settings.ref_prefix, &settings.ref_namespace);
                root
            }
        };
        let expressions = ExpressionCache::new(settings.expression_cache_capacity);
        XmlAdapter {
            tree,
            root,
            references: ReferenceTable::new(),
            meta,
            settings,
            expressions,
        }
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> XmlTree {
        self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn meta(&self) -> &Arc<AdapterMeta> {
        &self.meta
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut ReferenceTable {
        &mut self.references
    }

    /// Evaluate a value expression with `position` as the context node
    pub fn evaluate(&mut self, xpath: &str, position: NodeId) -> Result<XPathValue, EvalError> {
        let expr = self.expressions.get_or_compile(xpath)?;
        NodeEvaluator::new(&self.tree, position).evaluate(&expr)
    }

    pub fn to_xml_string(&self) -> Result<String, WriteError> {
        self.tree.to_xml_string()
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Element holding `property`, if written
    pub fn property_element(&self, property: &PropertyAccessor) -> Option<NodeId> {
        self.tree
            .child_elements(self.root, "", property.name())
            .next()
    }

    /// Read a property; absent or nil properties read as null
    pub fn get_property(&mut self, property: &PropertyAccessor) -> Result<Value, CodecError> {
        self.references.clear();
        let Some(element) = self.property_element(property) else {
            return Ok(Value::Null);
        };
        if self.is_nil(element) {
            return Ok(Value::Null);
        }
        tracing::trace!(property = property.name(), element, "get property");
        let serializer = Arc::clone(property.serializer());
        serializer.get_value(element, self, property)
    }

    /// Write a property
    ///
    /// The value currently stored is read first and passed along as the old
    /// value, so unchanged slots are left alone. When it cannot be read no
    /// old value is passed and every slot is written. `value` may be replaced
    /// with what was actually stored.
    pub fn set_property(
        &mut self,
        property: &PropertyAccessor,
        value: &mut Value,
    ) -> Result<(), CodecError> {
        if !property.descriptor().accepts(value) {
            return Err(CodecError::TypeMismatch {
                slot: 0,
                expected: property.descriptor().to_string(),
                actual: value.type_name().to_string(),
            });
        }

        let old = self.get_property(property).unwrap_or_else(|err| {
            tracing::warn!(property = property.name(), %err, "stored value unreadable, rewriting");
            Value::Null
        });
        self.references.clear();

        let element = match self.property_element(property) {
            Some(element) => element,
            None => self.tree.append_element(self.root, "", property.name()),
        };
        tracing::trace!(property = property.name(), element, "set property");

        if value.is_null() {
            self.set_nil(element);
            return Ok(());
        }
        self.clear_nil(element);

        let serializer = Arc::clone(property.serializer());
        let old = if old.is_null() { None } else { Some(&old) };
        serializer.set_value(element, self, property, old, value)
    }

    /// Read a tuple property as a Rust tuple
    pub fn get<T: Tuple>(&mut self, property: &PropertyAccessor) -> Result<Option<T>, CodecError> {
        check_descriptor::<T>(property)?;
        match self.get_property(property)? {
            Value::Null => Ok(None),
            Value::Tuple(tuple) => T::from_tuple(&tuple).map(Some),
            other => Err(CodecError::TypeMismatch {
                slot: 0,
                expected: T::descriptor().to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Write a Rust tuple to a tuple property, returning what was stored
    pub fn set<T: Tuple>(&mut self, property: &PropertyAccessor, value: T) -> Result<T, CodecError> {
        check_descriptor::<T>(property)?;
        let mut value = value.into_value();
        self.set_property(property, &mut value)?;
        match value {
            Value::Tuple(tuple) => T::from_tuple(&tuple),
            other => Err(CodecError::TypeMismatch {
                slot: 0,
                expected: T::descriptor().to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Nil and reference markers
    // ------------------------------------------------------------------

    /// Whether `element` carries `xsi:nil="true"`
    pub fn is_nil(&self, element: NodeId) -> bool {
        matches!(
            self.tree
                .attribute(element, &self.settings.xsi_prefix, &self.settings.nil_attribute),
            Some("true") | Some("1")
        )
    }

    /// Mark `element` nil, dropping its content and any reference
    pub(crate) fn set_nil(&mut self, element: NodeId) {
        self.tree.remove_children(element);
        self.clear_reference(element);
        self.tree.set_attribute(
            element,
            &self.settings.xsi_prefix,
            &self.settings.nil_attribute,
            "true",
        );
    }

    pub(crate) fn clear_nil(&mut self, element: NodeId) {
        self.tree
            .remove_attribute(element, &self.settings.xsi_prefix, &self.settings.nil_attribute);
    }

    /// Reference id named by `element`'s `x:ref`
    pub(crate) fn reference_of(&self, element: NodeId) -> Result<Option<u32>, CodecError> {
        self.id_attribute(element, &self.settings.ref_attribute)
    }

    /// Reference id carried by `element`'s `x:id`
    pub(crate) fn id_of(&self, element: NodeId) -> Result<Option<u32>, CodecError> {
        self.id_attribute(element, &self.settings.id_attribute)
    }

    fn id_attribute(&self, element: NodeId, local_name: &str) -> Result<Option<u32>, CodecError> {
        match self.tree.attribute(element, &self.settings.ref_prefix, local_name) {
            None => Ok(None),
            Some(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| CodecError::InvalidScalar {
                    ty: "reference id",
                    text: text.to_string(),
                }),
        }
    }

    /// Element carrying `x:id="id"`
    pub(crate) fn find_by_id(&self, id: u32) -> Option<NodeId> {
        self.tree.find_element_with_attribute(
            &self.settings.ref_prefix,
            &self.settings.id_attribute,
            &id.to_string(),
        )
    }

    /// Id of `target`, assigning a fresh `x:id` when it has none
    pub(crate) fn reference_id(&mut self, target: NodeId) -> u32 {
        if let Ok(Some(id)) = self.id_of(target) {
            return id;
        }
        let id = self.references.allocate_id(
            &self.tree,
            &self.settings.ref_prefix,
            &self.settings.id_attribute,
        );
        self.tree.set_attribute(
            target,
            &self.settings.ref_prefix,
            &self.settings.id_attribute,
            &id.to_string(),
        );
        id
    }

    /// Replace `element`'s content with a reference to `id`
    pub(crate) fn write_reference(&mut self, element: NodeId, id: u32) {
        self.tree.remove_children(element);
        self.tree.set_attribute(
            element,
            &self.settings.ref_prefix,
            &self.settings.ref_attribute,
            &id.to_string(),
        );
    }

    pub(crate) fn clear_reference(&mut self, element: NodeId) {
        self.tree
            .remove_attribute(element, &self.settings.ref_prefix, &self.settings.ref_attribute);
    }
}

fn check_descriptor<T: Tuple>(property: &PropertyAccessor) -> Result<(), CodecError> {
    let expected = T::descriptor();
    if property.descriptor() == &expected {
        return Ok(());
    }
    Err(CodecError::TypeMismatch {
        slot: 0,
        expected: property.descriptor().to_string(),
        actual: expected.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::Token;
    use crate::value::{ScalarType, TupleValue};

    fn setup() -> (Arc<AdapterMeta>, XmlAdapter) {
        let meta = Arc::new(AdapterMeta::new());
        let adapter = XmlAdapter::new(Arc::clone(&meta), AdapterSettings::default());
        (meta, adapter)
    }

    #[test]
    fn test_new_document_root() {
        let (_, adapter) = setup();
        assert_eq!(
            adapter.to_xml_string().unwrap(),
            r#"<Root xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:x="urn:schemas-castle-org:xml-reference"/>"#
        );
    }

    #[test]
    fn test_typed_round_trip() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();

        let stored = adapter.set(&property, ("A".to_string(), 1i64)).unwrap();
        assert_eq!(stored, ("A".to_string(), 1));
        assert_eq!(
            adapter.get::<(String, i64)>(&property).unwrap(),
            Some(("A".to_string(), 1))
        );
        assert!(adapter
            .to_xml_string()
            .unwrap()
            .contains("<pair><Item1>A</Item1><Item2>1</Item2></pair>"));
    }

    #[test]
    fn test_typed_canonicalization_returned() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("label", <(i32, Token)>::descriptor(), false)
            .unwrap();

        let stored = adapter.set(&property, (7, Token::from("  big   red "))).unwrap();
        assert_eq!(stored, (7, Token::from("big red")));
        assert_eq!(adapter.get::<(i32, Token)>(&property).unwrap(), Some(stored));
    }

    #[test]
    fn test_typed_descriptor_checked() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();
        let err = adapter.get::<(i64, String)>(&property).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { slot: 0, .. }));
    }

    #[test]
    fn test_absent_and_nil_property() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();
        assert_eq!(adapter.get_property(&property).unwrap(), Value::Null);

        adapter.set(&property, ("A".to_string(), 1i64)).unwrap();
        let mut null = Value::Null;
        adapter.set_property(&property, &mut null).unwrap();

        let element = adapter.property_element(&property).unwrap();
        assert!(adapter.is_nil(element));
        assert_eq!(adapter.get::<(String, i64)>(&property).unwrap(), None);
    }

    #[test]
    fn test_scalar_property() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("count", TypeDescriptor::Scalar(ScalarType::Int), false)
            .unwrap();
        let mut value = Value::Int(12);
        adapter.set_property(&property, &mut value).unwrap();
        assert_eq!(adapter.get_property(&property).unwrap(), Value::Int(12));

        let mut wrong = Value::from("twelve");
        assert!(adapter.set_property(&property, &mut wrong).is_err());
    }

    #[test]
    fn test_rewrite_preserves_identity() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();

        let mut first = Value::tuple(vec!["A".into(), Value::Int(1)]);
        adapter.set_property(&property, &mut first).unwrap();

        let tuple = TupleValue::new(vec!["A".into(), Value::Int(1)]);
        let mut again = Value::Tuple(tuple.clone());
        adapter.set_property(&property, &mut again).unwrap();
        assert!(TupleValue::ptr_eq(again.as_tuple().unwrap(), &tuple));
    }

    #[test]
    fn test_reference_property_shares_identity() {
        let (meta, mut adapter) = setup();
        let inner = <(i64, i64)>::descriptor();
        let descriptor = TypeDescriptor::tuple([inner.clone(), inner]);
        let property = meta.property("segment", descriptor, true).unwrap();

        let point = TupleValue::new(vec![Value::Int(0), Value::Int(0)]);
        let mut value = Value::tuple(vec![Value::Tuple(point.clone()), Value::Tuple(point)]);
        adapter.set_property(&property, &mut value).unwrap();

        let xml = adapter.to_xml_string().unwrap();
        assert!(xml.contains(r#"<Item1 x:id="1"><Item1>0</Item1><Item2>0</Item2></Item1><Item2 x:ref="1"/>"#));

        let read = adapter.get_property(&property).unwrap();
        let items = read.as_tuple().unwrap();
        let (a, b) = (items.get(0).unwrap(), items.get(1).unwrap());
        assert!(TupleValue::ptr_eq(a.as_tuple().unwrap(), b.as_tuple().unwrap()));
    }

    #[test]
    fn test_accessor_cache_shared_across_adapters() {
        let meta = Arc::new(AdapterMeta::new());
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();

        let mut a = XmlAdapter::new(Arc::clone(&meta), AdapterSettings::default());
        let mut b = XmlAdapter::new(Arc::clone(&meta), AdapterSettings::default());
        a.set(&property, ("A".to_string(), 1i64)).unwrap();
        b.set(&property, ("B".to_string(), 2i64)).unwrap();

        assert_eq!(meta.accessors().len(), 1);
    }

    #[test]
    fn test_from_tree_adopts_root() {
        let mut tree = XmlTree::new();
        let root = tree.append_element(XmlTree::DOCUMENT, "", "Order");
        let pair = tree.append_element(root, "", "pair");
        let item1 = tree.append_element(pair, "", "Item1");
        tree.set_text(item1, "Z");
        let item2 = tree.append_element(pair, "", "Item2");
        tree.set_text(item2, "26");

        let meta = Arc::new(AdapterMeta::new());
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();
        let mut adapter = XmlAdapter::from_tree(tree, meta, AdapterSettings::default());
        assert_eq!(adapter.root(), root);
        assert_eq!(
            adapter.get::<(String, i64)>(&property).unwrap(),
            Some(("Z".to_string(), 26))
        );
    }

    #[test]
    fn test_evaluate_uses_cache() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();
        adapter.set(&property, ("A".to_string(), 41i64)).unwrap();

        let root = adapter.root();
        let value = adapter.evaluate("pair/Item2 + 1", root).unwrap();
        assert_eq!(value, XPathValue::Number(42.0));
        let again = adapter.evaluate("pair/Item2 + 1", root).unwrap();
        assert_eq!(again, value);
    }

    fn corrupt_pair(item2: Option<&str>) -> (PropertyAccessor, XmlAdapter) {
        let mut tree = XmlTree::new();
        let root = tree.append_element(XmlTree::DOCUMENT, "", "Root");
        let pair = tree.append_element(root, "", "pair");
        let item1 = tree.append_element(pair, "", "Item1");
        tree.set_text(item1, "A");
        if let Some(text) = item2 {
            let item2 = tree.append_element(pair, "", "Item2");
            tree.set_text(item2, text);
        }

        let meta = Arc::new(AdapterMeta::new());
        let property = meta
            .property("pair", <(String, i64)>::descriptor(), false)
            .unwrap();
        (property, XmlAdapter::from_tree(tree, meta, AdapterSettings::default()))
    }

    #[test]
    fn test_write_repairs_unreadable_value() {
        let (property, mut adapter) = corrupt_pair(Some("abc"));
        assert!(matches!(
            adapter.get::<(String, i64)>(&property),
            Err(CodecError::InvalidScalar { .. })
        ));

        let stored = adapter.set(&property, ("A".to_string(), 0i64)).unwrap();
        assert_eq!(stored, ("A".to_string(), 0));
        assert_eq!(
            adapter.get::<(String, i64)>(&property).unwrap(),
            Some(("A".to_string(), 0))
        );
    }

    #[test]
    fn test_missing_slot_reads_default() {
        let (property, mut adapter) = corrupt_pair(None);
        assert_eq!(
            adapter.get_property(&property).unwrap(),
            Value::tuple(vec!["A".into(), Value::Int(0)])
        );
        assert_eq!(
            adapter.get::<(String, i64)>(&property).unwrap(),
            Some(("A".to_string(), 0))
        );
    }

    #[test]
    fn test_default_values_overwrite_data() {
        let (meta, mut adapter) = setup();
        let property = meta
            .property("flags", <(bool, i64)>::descriptor(), false)
            .unwrap();

        adapter.set(&property, (true, 9i64)).unwrap();
        adapter.set(&property, (false, 0i64)).unwrap();
        assert_eq!(adapter.get::<(bool, i64)>(&property).unwrap(), Some((false, 0)));
    }
}
