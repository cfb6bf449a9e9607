//! Resolved descriptor model.
//!
//! Descriptors live in a [`DescriptorGraph`] arena and refer to each other by
//! [`DescriptorId`]. Identity is the arena index: two fields holding the same
//! id point at the same descriptor, and cycles are plain id loops.

use std::collections::HashMap;

use crate::config::{BOOLEAN_SENTINEL, DATE_SENTINEL, NUMBER_SENTINEL, STRING_SENTINEL};
use crate::qname::QName;
use crate::xsd::Form;

/// Index of a descriptor inside its [`DescriptorGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(usize);

impl DescriptorId {
    /// Position in the arena.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Primitive marker of a simple value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsType {
    Number,
    String,
    Boolean,
    Date,
}

impl JsType {
    /// Sentinel token used in the persisted form.
    #[must_use]
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::Number => NUMBER_SENTINEL,
            Self::String => STRING_SENTINEL,
            Self::Boolean => BOOLEAN_SENTINEL,
            Self::Date => DATE_SENTINEL,
        }
    }

    /// Parse a sentinel token.
    ///
    /// # Examples
    /// ```
    /// use wsdl_descriptors::descriptor::JsType;
    ///
    /// assert_eq!(JsType::from_sentinel(":Date:"), Some(JsType::Date));
    /// assert_eq!(JsType::from_sentinel("Date"), None);
    /// ```
    #[must_use]
    pub fn from_sentinel(value: &str) -> Option<Self> {
        match value {
            NUMBER_SENTINEL => Some(Self::Number),
            STRING_SENTINEL => Some(Self::String),
            BOOLEAN_SENTINEL => Some(Self::Boolean),
            DATE_SENTINEL => Some(Self::Date),
            _ => None,
        }
    }

    /// Marker of a built-in schema type, by local name.
    #[must_use]
    pub fn for_builtin(local_name: &str) -> Self {
        match local_name {
            "boolean" => Self::Boolean,
            "decimal" | "float" | "double" | "integer" | "nonPositiveInteger"
            | "negativeInteger" | "long" | "int" | "short" | "byte" | "nonNegativeInteger"
            | "unsignedLong" | "unsignedInt" | "unsignedShort" | "unsignedByte"
            | "positiveInteger" => Self::Number,
            "date" | "dateTime" => Self::Date,
            _ => Self::String,
        }
    }
}

/// Resolved attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeDescriptor {
    pub qname: QName,
    pub type_name: Option<QName>,
    pub js_type: Option<JsType>,
    pub form: Form,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub documentation: Option<String>,
}

/// Resolved element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementDescriptor {
    pub qname: QName,
    pub type_name: Option<QName>,
    pub js_type: Option<JsType>,
    pub form: Form,
    pub is_simple: bool,
    pub is_many: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub elements: Vec<DescriptorId>,
    pub attributes: Vec<DescriptorId>,
    /// Named complex type of this element.
    pub type_descriptor: Option<DescriptorId>,
    pub documentation: Option<String>,
    /// Transient back-reference to the element a `ref=` site stands for.
    pub ref_original: Option<DescriptorId>,
}

impl ElementDescriptor {
    /// Qualified structural element with no type.
    #[must_use]
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            ..Self::default()
        }
    }
}

/// Resolved complex type, named or anonymous.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDescriptor {
    pub elements: Vec<DescriptorId>,
    pub attributes: Vec<DescriptorId>,
    pub documentation: Option<String>,
    pub ref_original: Option<DescriptorId>,
}

/// One of the three descriptor kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Type(TypeDescriptor),
    Element(ElementDescriptor),
    Attribute(AttributeDescriptor),
}

impl Descriptor {
    /// Child elements, empty for attributes.
    #[must_use]
    pub fn elements(&self) -> &[DescriptorId] {
        match self {
            Self::Type(t) => &t.elements,
            Self::Element(e) => &e.elements,
            Self::Attribute(_) => &[],
        }
    }

    /// Child attributes, empty for attributes.
    #[must_use]
    pub fn attributes(&self) -> &[DescriptorId] {
        match self {
            Self::Type(t) => &t.attributes,
            Self::Element(e) => &e.attributes,
            Self::Attribute(_) => &[],
        }
    }

    /// Documentation, whatever the kind.
    #[must_use]
    pub fn documentation(&self) -> Option<&str> {
        match self {
            Self::Type(t) => t.documentation.as_deref(),
            Self::Element(e) => e.documentation.as_deref(),
            Self::Attribute(a) => a.documentation.as_deref(),
        }
    }

    /// Alias back-reference, if any.
    #[must_use]
    pub fn ref_original(&self) -> Option<DescriptorId> {
        match self {
            Self::Type(t) => t.ref_original,
            Self::Element(e) => e.ref_original,
            Self::Attribute(_) => None,
        }
    }

    /// Nested named type, elements only.
    #[must_use]
    pub fn type_descriptor(&self) -> Option<DescriptorId> {
        match self {
            Self::Element(e) => e.type_descriptor,
            _ => None,
        }
    }

    fn child_lists_mut(&mut self) -> Option<(&mut Vec<DescriptorId>, &mut Vec<DescriptorId>)> {
        match self {
            Self::Type(t) => Some((&mut t.elements, &mut t.attributes)),
            Self::Element(e) => Some((&mut e.elements, &mut e.attributes)),
            Self::Attribute(_) => None,
        }
    }

    /// Compare everything but links to other descriptors.
    fn same_fields(&self, other: &Descriptor) -> bool {
        match (self, other) {
            (Self::Type(a), Self::Type(b)) => a.documentation == b.documentation,
            (Self::Element(a), Self::Element(b)) => {
                a.qname == b.qname
                    && a.type_name == b.type_name
                    && a.js_type == b.js_type
                    && a.form == b.form
                    && a.is_simple == b.is_simple
                    && a.is_many == b.is_many
                    && a.default == b.default
                    && a.fixed == b.fixed
                    && a.documentation == b.documentation
            }
            (Self::Attribute(a), Self::Attribute(b)) => a == b,
            _ => false,
        }
    }
}

/// Arena owning every descriptor of one compilation or restore.
#[derive(Debug, Clone, Default)]
pub struct DescriptorGraph {
    nodes: Vec<Descriptor>,
}

impl DescriptorGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor.
    pub fn add(&mut self, descriptor: Descriptor) -> DescriptorId {
        self.nodes.push(descriptor);
        DescriptorId(self.nodes.len() - 1)
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a descriptor.
    #[must_use]
    pub fn get(&self, id: DescriptorId) -> &Descriptor {
        &self.nodes[id.0]
    }

    /// Borrow a descriptor mutably.
    pub fn get_mut(&mut self, id: DescriptorId) -> &mut Descriptor {
        &mut self.nodes[id.0]
    }

    /// Borrow an element descriptor.
    #[must_use]
    pub fn element(&self, id: DescriptorId) -> Option<&ElementDescriptor> {
        match self.get(id) {
            Descriptor::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow an element descriptor mutably.
    pub fn element_mut(&mut self, id: DescriptorId) -> Option<&mut ElementDescriptor> {
        match self.get_mut(id) {
            Descriptor::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Attach `child` under `parent`.
    ///
    /// Elements and attributes are appended to the matching list; a type
    /// descriptor child has its elements and attributes spliced in. Nothing
    /// can be attached under an attribute.
    pub fn add_child(&mut self, parent: DescriptorId, child: DescriptorId) {
        let (elements, attributes): (Vec<_>, Vec<_>) = match self.get(child) {
            Descriptor::Element(_) => (vec![child], Vec::new()),
            Descriptor::Attribute(_) => (Vec::new(), vec![child]),
            Descriptor::Type(t) => (t.elements.clone(), t.attributes.clone()),
        };
        if let Some((into_elements, into_attributes)) = self.get_mut(parent).child_lists_mut() {
            into_elements.extend(elements);
            into_attributes.extend(attributes);
        }
    }

    /// Put the children of `source` in front of those of `target`.
    pub fn prepend_children(&mut self, target: DescriptorId, source: DescriptorId) {
        let elements = self.get(source).elements().to_vec();
        let attributes = self.get(source).attributes().to_vec();
        if let Some((into_elements, into_attributes)) = self.get_mut(target).child_lists_mut() {
            into_elements.splice(0..0, elements);
            into_attributes.splice(0..0, attributes);
        }
    }

    /// Structural comparison that also checks sharing.
    ///
    /// Two descriptors match when their fields match and their links lead to
    /// matching descriptors through a one-to-one correspondence, so a shared
    /// instance on one side must be shared on the other. Alias
    /// back-references are not compared.
    #[must_use]
    pub fn isomorphic(&self, a: DescriptorId, other: &DescriptorGraph, b: DescriptorId) -> bool {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        self.isomorphic_at(a, other, b, &mut forward, &mut backward)
    }

    fn isomorphic_at(
        &self,
        a: DescriptorId,
        other: &DescriptorGraph,
        b: DescriptorId,
        forward: &mut HashMap<DescriptorId, DescriptorId>,
        backward: &mut HashMap<DescriptorId, DescriptorId>,
    ) -> bool {
        if let Some(mapped) = forward.get(&a) {
            return *mapped == b;
        }
        if backward.contains_key(&b) {
            return false;
        }
        forward.insert(a, b);
        backward.insert(b, a);

        let (left, right) = (self.get(a), other.get(b));
        if !left.same_fields(right)
            || left.elements().len() != right.elements().len()
            || left.attributes().len() != right.attributes().len()
        {
            return false;
        }

        let pairs: Vec<(DescriptorId, DescriptorId)> = left
            .elements()
            .iter()
            .zip(right.elements())
            .chain(left.attributes().iter().zip(right.attributes()))
            .map(|(x, y)| (*x, *y))
            .collect();
        for (x, y) in pairs {
            if !self.isomorphic_at(x, other, y, forward, backward) {
                return false;
            }
        }

        match (left.type_descriptor(), right.type_descriptor()) {
            (None, None) => true,
            (Some(x), Some(y)) => self.isomorphic_at(x, other, y, forward, backward),
            _ => false,
        }
    }
}
