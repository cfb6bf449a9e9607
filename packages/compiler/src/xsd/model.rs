//! Raw schema constructs, already lifted out of the element tree.
//!
//! QName-valued attributes are resolved against the namespace scope of the
//! document they were written in, so constructs from different documents
//! can be merged freely.

use crate::qname::QName;

/// Namespace qualification of a local declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Form {
    #[default]
    Qualified,
    Unqualified,
}

impl Form {
    /// Parse a `form` / `*FormDefault` attribute value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// Attribute value spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::Unqualified => "unqualified",
        }
    }
}

/// Element declaration, top-level or local.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementDecl {
    /// Declared name; `None` for `ref=` particles.
    pub name: Option<String>,
    /// Referenced top-level element.
    pub reference: Option<QName>,
    /// Named type.
    pub type_name: Option<QName>,
    /// Anonymous type declared inline.
    pub inline_type: Option<InlineType>,
    /// Resolved qualification (explicit `form` or the schema default).
    pub form: Form,
    /// `maxOccurs` allows more than one occurrence.
    pub is_many: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub documentation: Option<String>,
}

/// Anonymous type body of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineType {
    Complex(Box<ComplexType>),
    Simple(SimpleType),
}

/// Attribute declaration, top-level or local.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeDecl {
    pub name: Option<String>,
    pub reference: Option<QName>,
    pub type_name: Option<QName>,
    pub inline_type: Option<SimpleType>,
    pub form: Form,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub documentation: Option<String>,
}

/// Entry in an attribute list.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeItem {
    Attribute(AttributeDecl),
    /// `attributeGroup ref=`.
    GroupRef(QName),
}

/// Model group compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    Sequence,
    Choice,
    All,
}

/// Entry in a model group.
#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    Element(ElementDecl),
    Group(ModelGroup),
    /// `group ref=`, with the occurrence of the reference site.
    GroupRef { reference: QName, is_many: bool },
    Any,
}

/// A `sequence`, `choice` or `all`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    pub compositor: Compositor,
    pub is_many: bool,
    pub particles: Vec<Particle>,
}

/// Complex type definition, named or anonymous.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexType {
    pub name: Option<String>,
    /// Content particles (own content only for extensions).
    pub particles: Vec<Particle>,
    pub attributes: Vec<AttributeItem>,
    /// `complexContent/extension` base.
    pub base: Option<QName>,
    /// `simpleContent` base; elements of this type carry a text value.
    pub simple_base: Option<QName>,
    pub documentation: Option<String>,
}

/// Simple type derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleVariety {
    Restriction {
        base: Option<QName>,
        inline_base: Option<Box<SimpleType>>,
    },
    List,
    Union,
}

/// Simple type definition, named or anonymous.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    pub name: Option<String>,
    pub variety: SimpleVariety,
    pub documentation: Option<String>,
}

/// Named attribute group.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroup {
    pub name: String,
    pub attributes: Vec<AttributeItem>,
}

/// Kind of a loading directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Same-namespace inclusion; namespace-less targets are rehomed.
    Include,
    /// Cross-namespace import.
    Import,
}

/// An `include` / `import` pointing at another document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// For includes, the including schema's namespace; for imports, `@namespace`.
    pub namespace: Option<String>,
    /// Location as written, relative to the originating document.
    pub location: String,
}
