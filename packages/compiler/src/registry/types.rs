//! Node kinds produced by the element registry.

/// Concrete behavior of a parsed element, resolved once at node creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Service description
    Definitions,
    Types,
    Message,
    Part,
    PortType,
    Binding,
    Operation,
    Input,
    Output,
    Fault,
    Service,
    Port,
    WsdlImport,
    /// Any other element in the service description namespace.
    WsdlElement,

    // Schema definition
    Schema,
    Element,
    ComplexType,
    SimpleType,
    Sequence,
    Choice,
    All,
    Group,
    Attribute,
    AttributeGroup,
    ComplexContent,
    SimpleContent,
    Extension,
    Restriction,
    List,
    Union,
    Include,
    SchemaImport,
    Annotation,
    Any,
    AnyAttribute,
    /// Any other element in the schema namespace (facets, identity constraints).
    XsdElement,

    /// `documentation` in either the schema or the service description namespace.
    Documentation,

    // SOAP 1.2 binding dialect
    SoapBinding,
    SoapOperation,
    SoapBody,
    SoapFault,
    SoapHeader,
    SoapAddress,
    /// Any other element in the SOAP 1.2 binding namespace.
    SoapElement,

    /// Element from an unrecognized namespace, kept only to be re-rendered.
    Markup,
    /// Coalesced character data.
    Text,
}

impl NodeKind {
    /// Local names this kind expects as element children.
    ///
    /// `None` means anything goes (markup, generic handlers).
    #[must_use]
    pub fn allowed_children(&self) -> Option<&'static [&'static str]> {
        let allowed: &'static [&'static str] = match self {
            Self::Definitions => &[
                "documentation",
                "import",
                "types",
                "message",
                "portType",
                "binding",
                "service",
            ],
            Self::Types => &["documentation", "schema"],
            Self::Message => &["documentation", "part"],
            Self::PortType => &["documentation", "operation"],
            Self::Binding => &["documentation", "operation", "binding"],
            Self::Operation => &["documentation", "input", "output", "fault", "operation"],
            Self::Input | Self::Output | Self::Fault => {
                &["documentation", "body", "header", "fault"]
            }
            Self::Service => &["documentation", "port"],
            Self::Port => &["documentation", "address"],
            Self::Schema => &[
                "annotation",
                "include",
                "import",
                "redefine",
                "element",
                "complexType",
                "simpleType",
                "group",
                "attribute",
                "attributeGroup",
                "notation",
            ],
            Self::Element => &[
                "annotation",
                "complexType",
                "simpleType",
                "unique",
                "key",
                "keyref",
            ],
            Self::ComplexType => &[
                "annotation",
                "simpleContent",
                "complexContent",
                "group",
                "all",
                "choice",
                "sequence",
                "attribute",
                "attributeGroup",
                "anyAttribute",
            ],
            Self::Sequence | Self::Choice => {
                &["annotation", "element", "group", "choice", "sequence", "any"]
            }
            Self::All => &["annotation", "element"],
            Self::Annotation => &["documentation", "appinfo"],
            _ => return None,
        };
        Some(allowed)
    }

    /// Whether nested content is opaque markup to be rendered rather than resolved.
    #[must_use]
    pub fn is_markup(&self) -> bool {
        matches!(self, Self::Markup | Self::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_children() {
        let allowed = NodeKind::Operation.allowed_children().unwrap();
        assert!(allowed.contains(&"fault"));
        assert!(NodeKind::Markup.allowed_children().is_none());
    }

    #[test]
    fn test_is_markup() {
        assert!(NodeKind::Text.is_markup());
        assert!(!NodeKind::Documentation.is_markup());
    }
}
