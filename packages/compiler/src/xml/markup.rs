//! Re-rendering of embedded documentation markup.

use super::node::{Document, NodeId};
use crate::registry::NodeKind;

/// Render a node back to markup.
///
/// Text nodes render verbatim; elements render as `<name/>` when empty and
/// `<name>...</name>` otherwise. Attributes are not carried over.
///
/// # Examples
/// ```
/// use wsdl_descriptors::registry::create_wsdl_registry;
/// use wsdl_descriptors::xml::{parse_document, render_markup};
///
/// let xml = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"><documentation>Adds <b>two</b> numbers<br/></documentation></definitions>"#;
/// let doc = parse_document(xml, &create_wsdl_registry()).unwrap();
/// let root = doc.root().unwrap();
/// assert_eq!(
///     render_markup(&doc, root),
///     "<definitions><documentation>Adds<b>two</b>numbers<br/></documentation></definitions>"
/// );
/// ```
pub fn render_markup(doc: &Document, id: NodeId) -> String {
    let node = doc.node(id);
    if node.kind == NodeKind::Text {
        return node.text.clone().unwrap_or_default();
    }

    let name = node.local_name();
    if node.children.is_empty() {
        return format!("<{name}/>");
    }

    let mut html = format!("<{name}>");
    for child in &node.children {
        html.push_str(&render_markup(doc, *child));
    }
    html.push_str(&format!("</{name}>"));
    html
}

/// Render the body of a `documentation` element, without the element itself.
#[must_use]
pub fn render_children(doc: &Document, id: NodeId) -> String {
    doc.node(id)
        .children
        .iter()
        .map(|child| render_markup(doc, *child))
        .collect()
}

/// Collect the documentation attached to a declaration.
///
/// Looks at `documentation` children directly (service description style)
/// and inside `annotation` (schema style). Returns `None` when nothing is
/// documented.
#[must_use]
pub fn documentation_of(doc: &Document, id: NodeId) -> Option<String> {
    let mut parts = Vec::new();
    for child in doc.element_children(id) {
        match doc.kind(child) {
            NodeKind::Documentation => parts.push(render_children(doc, child)),
            NodeKind::Annotation => {
                for inner in doc.find_children(child, NodeKind::Documentation) {
                    parts.push(render_children(doc, inner));
                }
            }
            _ => {}
        }
    }

    let text = parts.concat();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::create_wsdl_registry;
    use crate::xml::parse_document;

    #[test]
    fn test_documentation_from_annotation() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a">
                <xs:annotation><xs:documentation>The <em>first</em> field</xs:documentation></xs:annotation>
            </xs:element>
        </xs:schema>"#;
        let doc = parse_document(xml, &create_wsdl_registry()).unwrap();
        let root = doc.root().unwrap();
        let types = doc.find_child(root, NodeKind::Types).unwrap();
        let schema = doc.find_child(types, NodeKind::Schema).unwrap();
        let element = doc.find_child(schema, NodeKind::Element).unwrap();

        assert_eq!(
            documentation_of(&doc, element).as_deref(),
            Some("The<em>first</em>field")
        );
    }

    #[test]
    fn test_no_documentation() {
        let xml = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"><message name="m"/></definitions>"#;
        let doc = parse_document(xml, &create_wsdl_registry()).unwrap();
        let root = doc.root().unwrap();
        let message = doc.find_child(root, NodeKind::Message).unwrap();
        assert_eq!(documentation_of(&doc, message), None);
    }
}
