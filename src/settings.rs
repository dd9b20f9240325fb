//! Adapter Settings
//!
//! Names and namespaces the adapter writes, plus cache sizing.

/// Configuration for an `XmlAdapter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    /// Prefix bound to the schema-instance namespace
    pub xsi_prefix: String,
    pub xsi_namespace: String,
    /// Local name of the nil marker, written as `xsi:nil="true"`
    pub nil_attribute: String,
    /// Prefix bound to the reference namespace
    pub ref_prefix: String,
    pub ref_namespace: String,
    /// Attribute marking the first occurrence of a shared value
    pub id_attribute: String,
    /// Attribute on a later occurrence naming the first
    pub ref_attribute: String,
    /// Compiled value expressions kept per adapter
    pub expression_cache_capacity: usize,
    /// Name of the root element of a new document
    pub root_name: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        AdapterSettings {
            xsi_prefix: "xsi".to_string(),
            xsi_namespace: "http://www.w3.org/2001/XMLSchema-instance".to_string(),
            nil_attribute: "nil".to_string(),
            ref_prefix: "x".to_string(),
            ref_namespace: "urn:schemas-castle-org:xml-reference".to_string(),
            id_attribute: "id".to_string(),
            ref_attribute: "ref".to_string(),
            expression_cache_capacity: 64,
            root_name: "Root".to_string(),
        }
    }
}

impl AdapterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xsi_prefix(mut self, prefix: &str) -> Self {
        self.xsi_prefix = prefix.to_string();
        self
    }

    pub fn with_ref_prefix(mut self, prefix: &str) -> Self {
        self.ref_prefix = prefix.to_string();
        self
    }

    pub fn with_ref_namespace(mut self, namespace: &str) -> Self {
        self.ref_namespace = namespace.to_string();
        self
    }

    pub fn with_id_attribute(mut self, name: &str) -> Self {
        self.id_attribute = name.to_string();
        self
    }

    pub fn with_ref_attribute(mut self, name: &str) -> Self {
        self.ref_attribute = name.to_string();
        self
    }

    pub fn with_expression_cache_capacity(mut self, capacity: usize) -> Self {
        self.expression_cache_capacity = capacity;
        self
    }

    pub fn with_root_name(mut self, name: &str) -> Self {
        self.root_name = name.to_string();
        self
    }
}
