//! Event-driven document parser.
//!
//! Drives a `quick_xml` reader and feeds open-tag / text / close-tag events
//! into a small state machine that builds a [`Document`] with node kinds
//! resolved through the [`ElementRegistry`].

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::node::{Document, Node, NodeId};
use crate::config::WSDL_NS;
use crate::error::{CompilerError, Result};
use crate::qname::{split_prefixed, QName};
use crate::registry::{ElementRegistry, NodeKind};

/// An open-tag event in reader-independent form.
#[derive(Debug, Clone)]
pub struct OpenTag {
    /// Raw element name as written (`xsd:element`).
    pub name: String,
    /// Attributes in document order, including namespace declarations.
    pub attributes: Vec<(String, String)>,
}

/// Parser state: the stack of open nodes and the pending text run.
pub struct DocumentParser<'r> {
    registry: &'r ElementRegistry,
    doc: Document,
    stack: Vec<NodeId>,
    text: String,
}

impl<'r> DocumentParser<'r> {
    /// Create a parser using the given registry.
    #[must_use]
    pub fn new(registry: &'r ElementRegistry) -> Self {
        Self {
            registry,
            doc: Document::new(),
            stack: Vec::new(),
            text: String::new(),
        }
    }

    /// Handle an open tag.
    pub fn open_tag(&mut self, tag: OpenTag) -> Result<()> {
        self.flush_text();

        let (namespaces, attributes) = split_namespace_declarations(tag.attributes);
        let (prefix, local) = split_prefixed(&tag.name);
        let ns_uri = namespaces
            .iter()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .or_else(|| {
                self.stack
                    .last()
                    .and_then(|top| self.doc.lookup_namespace(*top, prefix))
            })
            .filter(|uri| !uri.is_empty())
            .map(String::from);
        let name = QName::new(ns_uri.as_deref(), local).with_prefix(prefix);

        let Some(&top) = self.stack.last() else {
            return self.open_root(name, namespaces, attributes);
        };

        let kind = self.registry.resolve(name.ns(), local)?;
        let mut node = Node::element(kind, name);
        node.namespaces = namespaces;
        node.attributes = attributes;
        self.start_child(top, node);
        Ok(())
    }

    /// Handle a text event; runs are coalesced until the next tag boundary.
    pub fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Handle a close tag.
    pub fn close_tag(&mut self, name: &str) -> Result<()> {
        let Some(&top) = self.stack.last() else {
            return Err(CompilerError::parse(format!("Unmatched close tag: {name}")));
        };
        self.flush_text();
        self.end_element(top, name)
    }

    /// Finish parsing and hand out the document.
    pub fn finish(self) -> Result<Document> {
        if let Some(&top) = self.stack.last() {
            let node = self.doc.node(top);
            return Err(CompilerError::parse(format!(
                "Unclosed tag: {}",
                node.local_name()
            )));
        }
        if self.doc.root().is_none() {
            return Err(CompilerError::parse("Document has no root element"));
        }
        Ok(self.doc)
    }

    fn open_root(
        &mut self,
        name: QName,
        namespaces: Vec<(Option<String>, String)>,
        attributes: IndexMap<String, String>,
    ) -> Result<()> {
        match name.name.as_str() {
            "definitions" => {
                let mut root = Node::element(NodeKind::Definitions, name);
                root.namespaces = namespaces;
                root.attributes = attributes;
                let root = self.doc.alloc(root);
                self.doc.set_root(root);
                self.stack.push(root);
            }
            "schema" => {
                // A bare schema document is wrapped in definitions/types so it
                // merges like an inline schema.
                let root = self.doc.alloc(Node::element(
                    NodeKind::Definitions,
                    QName::new(Some(WSDL_NS), "definitions"),
                ));
                self.doc.set_root(root);
                let types = self.doc.alloc(Node::element(
                    NodeKind::Types,
                    QName::new(Some(WSDL_NS), "types"),
                ));
                self.doc.append_child(root, types);
                let mut schema = Node::element(NodeKind::Schema, name);
                schema.namespaces = namespaces;
                schema.attributes = attributes;
                let schema = self.doc.alloc(schema);
                self.doc.append_child(types, schema);
                self.stack.push(schema);
            }
            other => {
                return Err(CompilerError::parse(format!(
                    "Unexpected root element <{other}>: expected wsdl definitions or an include"
                )));
            }
        }
        Ok(())
    }

    fn start_child(&mut self, parent: NodeId, node: Node) {
        let parent_kind = self.doc.kind(parent);
        if let Some(allowed) = parent_kind.allowed_children() {
            if !allowed.contains(&node.local_name()) {
                tracing::debug!(
                    element = %node.name,
                    parent = ?parent_kind,
                    "Element is not expected here"
                );
            }
        }
        let id = self.doc.alloc(node);
        self.doc.append_child(parent, id);
        self.stack.push(id);
    }

    fn end_element(&mut self, top: NodeId, name: &str) -> Result<()> {
        let (_, local) = split_prefixed(name);
        let node = self.doc.node(top);
        if node.local_name() != local {
            return Err(CompilerError::parse(format!(
                "Mismatched close tag: expected </{}>, found </{name}>",
                node.local_name()
            )));
        }
        self.stack.pop();
        Ok(())
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if let Some(&top) = self.stack.last() {
            let child = self.doc.alloc(Node::text(text));
            self.doc.append_child(top, child);
        }
    }
}

/// Separate `xmlns` / `xmlns:p` declarations from ordinary attributes.
fn split_namespace_declarations(
    attributes: Vec<(String, String)>,
) -> (Vec<(Option<String>, String)>, IndexMap<String, String>) {
    let mut namespaces = Vec::new();
    let mut rest = IndexMap::new();
    for (key, value) in attributes {
        if key == "xmlns" {
            namespaces.push((None, value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces.push((Some(prefix.to_string()), value));
        } else {
            rest.insert(key, value);
        }
    }
    (namespaces, rest)
}

fn open_tag_from(e: &BytesStart<'_>) -> Result<OpenTag> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        attributes.push((key, value));
    }
    Ok(OpenTag { name, attributes })
}

/// Parse a document with the given registry.
///
/// # Errors
/// Returns `StructuralParse` for malformed nesting or an unexpected root
/// element and `UnsupportedProtocol` for elements of a rejected namespace.
pub fn parse_document(xml: &str, registry: &ElementRegistry) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut parser = DocumentParser::new(registry);

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.open_tag(open_tag_from(&e)?)?,
            Event::Empty(e) => {
                let tag = open_tag_from(&e)?;
                let name = tag.name.clone();
                parser.open_tag(tag)?;
                parser.close_tag(&name)?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                parser.close_tag(&name)?;
            }
            Event::Text(e) => parser.text(&e.unescape()?),
            Event::CData(e) => parser.text(&String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XSD_NS;
    use crate::registry::create_wsdl_registry;

    fn parse(xml: &str) -> Result<Document> {
        parse_document(xml, &create_wsdl_registry())
    }

    #[test]
    fn test_parse_definitions_root() {
        let xml = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/" name="x">
            <wsdl:message name="In"/>
        </wsdl:definitions>"#;
        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.kind(root), NodeKind::Definitions);
        let message = doc.find_child(root, NodeKind::Message).unwrap();
        assert_eq!(doc.attribute(message, "name"), Some("In"));
    }

    #[test]
    fn test_schema_root_is_shimmed() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a"/>"#;
        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.kind(root), NodeKind::Definitions);
        let types = doc.find_child(root, NodeKind::Types).unwrap();
        let schema = doc.find_child(types, NodeKind::Schema).unwrap();
        assert!(doc.node(schema).name.matches(Some(XSD_NS), "schema"));
        assert_eq!(doc.attribute(schema, "targetNamespace"), Some("urn:a"));
    }

    #[test]
    fn test_unexpected_root_fails() {
        let err = parse("<html/>").unwrap_err();
        assert!(matches!(err, CompilerError::StructuralParse { .. }));
    }

    #[test]
    fn test_unmatched_close_tag_fails() {
        let registry = create_wsdl_registry();
        let mut parser = DocumentParser::new(&registry);
        let err = parser.close_tag("definitions").unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Unmatched close tag: definitions");
    }

    #[test]
    fn test_text_is_coalesced_at_tag_boundaries() {
        let registry = create_wsdl_registry();
        let mut parser = DocumentParser::new(&registry);
        parser
            .open_tag(OpenTag {
                name: "definitions".into(),
                attributes: vec![("xmlns".into(), WSDL_NS.into())],
            })
            .unwrap();
        parser
            .open_tag(OpenTag {
                name: "documentation".into(),
                attributes: vec![],
            })
            .unwrap();
        parser.text("Hello ");
        parser.text("world");
        parser
            .open_tag(OpenTag {
                name: "b".into(),
                attributes: vec![("xmlns".into(), String::new())],
            })
            .unwrap();
        parser.close_tag("b").unwrap();
        parser.close_tag("documentation").unwrap();
        parser.close_tag("definitions").unwrap();
        let doc = parser.finish().unwrap();

        let root = doc.root().unwrap();
        let documentation = doc.find_child(root, NodeKind::Documentation).unwrap();
        let children = &doc.node(documentation).children;
        assert_eq!(children.len(), 2);
        assert_eq!(doc.node(children[0]).text.as_deref(), Some("Hello world"));
        assert_eq!(doc.kind(children[1]), NodeKind::Markup);
    }

    #[test]
    fn test_soap11_binding_rejected() {
        let xml = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
            xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/">
            <binding name="b"><soap:binding style="document"/></binding>
        </definitions>"#;
        let err = parse(xml).unwrap_err();
        assert!(matches!(err, CompilerError::UnsupportedProtocol(_)));
    }

    #[test]
    fn test_unclosed_tag_fails() {
        let err = parse(r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"><types>"#);
        assert!(err.is_err());
    }
}
