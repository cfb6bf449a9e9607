//! Arena-backed element tree produced by the parser.

use indexmap::IndexMap;

use crate::qname::{split_prefixed, QName};
use crate::registry::NodeKind;

/// Namespace bound to the reserved `xml` prefix.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A parsed element or coalesced text run.
#[derive(Debug, Clone)]
pub struct Node {
    /// Behavior resolved through the registry at creation time.
    pub kind: NodeKind,
    /// Resolved element name; text nodes are named `__text__`.
    pub name: QName,
    /// Attributes in document order, keyed by their raw (possibly prefixed) name.
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations made on this element; `None` is the default namespace.
    pub namespaces: Vec<(Option<String>, String)>,
    /// Element and text children in document order.
    pub children: Vec<NodeId>,
    /// Non-owning link to the enclosing element.
    pub parent: Option<NodeId>,
    /// Character data, for text nodes only.
    pub text: Option<String>,
}

impl Node {
    /// Create an element node.
    #[must_use]
    pub fn element(kind: NodeKind, name: QName) -> Self {
        Self {
            kind,
            name,
            attributes: IndexMap::new(),
            namespaces: Vec::new(),
            children: Vec::new(),
            parent: None,
            text: None,
        }
    }

    /// Create a text node.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::element(NodeKind::Text, QName::new(None, "__text__"));
        node.text = Some(value.into());
        node
    }

    /// Local element name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.name.name
    }
}

/// A parsed document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Root element, once the first element has been seen.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Add a node to the arena.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Attach `child` under `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Borrow a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node kind shorthand.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    /// Attribute value by raw name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(name).map(String::as_str)
    }

    /// Iterate over element children (text nodes excluded).
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.nodes[c.0].kind != NodeKind::Text)
    }

    /// Find the first element child of the given kind.
    #[must_use]
    pub fn find_child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.element_children(id).find(|c| self.kind(*c) == kind)
    }

    /// Find all element children of the given kind.
    pub fn find_children(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.element_children(id)
            .filter(move |c| self.kind(*c) == kind)
    }

    /// Resolve a prefix against the declarations in scope at `id`.
    #[must_use]
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NS);
        }
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if let Some((_, uri)) = node
                .namespaces
                .iter()
                .find(|(p, _)| p.as_deref() == prefix)
            {
                return if uri.is_empty() { None } else { Some(uri) };
            }
            current = node.parent;
        }
        None
    }

    /// Find a prefix bound to a namespace in scope at `id`.
    #[must_use]
    pub fn lookup_prefix(&self, id: NodeId, ns_uri: &str) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if let Some((Some(prefix), _)) = node.namespaces.iter().find(|(_, uri)| uri == ns_uri) {
                return Some(prefix);
            }
            current = node.parent;
        }
        None
    }

    /// Resolve a prefixed name written in an attribute value (`type="tns:Foo"`).
    ///
    /// Unprefixed values fall into the default namespace in scope, as XSD does
    /// for QName-valued attributes.
    #[must_use]
    pub fn resolve_qname(&self, id: NodeId, raw: &str) -> QName {
        let (prefix, local) = split_prefixed(raw.trim());
        QName::new(self.lookup_namespace(id, prefix), local).with_prefix(prefix)
    }

    /// Resolve a QName-valued attribute.
    #[must_use]
    pub fn qname_attribute(&self, id: NodeId, name: &str) -> Option<QName> {
        self.attribute(id, name).map(|raw| self.resolve_qname(id, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let mut root = Node::element(NodeKind::Definitions, QName::new(Some("urn:w"), "definitions"));
        root.namespaces.push((Some("tns".into()), "urn:t".into()));
        root.namespaces.push((None, "urn:d".into()));
        let root = doc.alloc(root);
        doc.set_root(root);
        let mut child = Node::element(NodeKind::Message, QName::new(Some("urn:w"), "message"));
        child.attributes.insert("name".into(), "In".into());
        child.namespaces.push((Some("tns".into()), "urn:inner".into()));
        let child = doc.alloc(child);
        doc.append_child(root, child);
        let text = doc.alloc(Node::text("hi"));
        doc.append_child(root, text);
        (doc, root, child)
    }

    #[test]
    fn test_lookup_namespace_innermost_wins() {
        let (doc, root, child) = sample();
        assert_eq!(doc.lookup_namespace(child, Some("tns")), Some("urn:inner"));
        assert_eq!(doc.lookup_namespace(root, Some("tns")), Some("urn:t"));
        assert_eq!(doc.lookup_namespace(child, None), Some("urn:d"));
        assert_eq!(doc.lookup_namespace(child, Some("missing")), None);
    }

    #[test]
    fn test_resolve_qname() {
        let (doc, _, child) = sample();
        let q = doc.resolve_qname(child, "tns:Add");
        assert!(q.matches(Some("urn:inner"), "Add"));
        assert_eq!(q.prefix.as_deref(), Some("tns"));
    }

    #[test]
    fn test_element_children_skip_text() {
        let (doc, root, child) = sample();
        let children: Vec<_> = doc.element_children(root).collect();
        assert_eq!(children, vec![child]);
        assert_eq!(doc.find_child(root, NodeKind::Message), Some(child));
        assert_eq!(doc.node(child).parent, Some(root));
    }
}
