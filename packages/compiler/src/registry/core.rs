//! Element registry for mapping qualified names to node kinds.

use std::collections::HashMap;

use super::types::NodeKind;
use crate::error::{CompilerError, Result};

/// Registry mapping `(namespace, local name)` pairs to node kinds.
///
/// Lookup order is: exact match, then the generic kind registered for the
/// namespace, then [`NodeKind::Markup`]. Namespaces marked as rejected fail
/// instead of falling through.
pub struct ElementRegistry {
    exact: HashMap<(String, String), NodeKind>,
    namespaces: HashMap<String, NodeKind>,
    rejected: HashMap<String, String>,
}

impl ElementRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            namespaces: HashMap::new(),
            rejected: HashMap::new(),
        }
    }

    /// Register a kind for a specific qualified name.
    pub fn register(&mut self, namespace: &str, local_name: &str, kind: NodeKind) {
        self.exact
            .insert((namespace.to_string(), local_name.to_string()), kind);
    }

    /// Register the generic kind used for unlisted names in a namespace.
    pub fn register_namespace(&mut self, namespace: &str, kind: NodeKind) {
        self.namespaces.insert(namespace.to_string(), kind);
    }

    /// Refuse every element of a namespace with the given message.
    pub fn reject(&mut self, namespace: &str, message: impl Into<String>) {
        self.rejected.insert(namespace.to_string(), message.into());
    }

    /// Resolve the kind for an element.
    ///
    /// # Errors
    /// Returns `UnsupportedProtocol` for elements of a rejected namespace.
    pub fn resolve(&self, namespace: Option<&str>, local_name: &str) -> Result<NodeKind> {
        let Some(ns) = namespace else {
            return Ok(NodeKind::Markup);
        };

        if let Some(kind) = self.exact.get(&(ns.to_string(), local_name.to_string())) {
            return Ok(*kind);
        }

        if let Some(message) = self.rejected.get(ns) {
            return Err(CompilerError::UnsupportedProtocol(message.clone()));
        }

        Ok(self
            .namespaces
            .get(ns)
            .copied()
            .unwrap_or(NodeKind::Markup))
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}
