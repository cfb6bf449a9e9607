//! Per-namespace schema aggregate and its merge semantics.

use indexmap::IndexMap;

use super::model::{
    AttributeDecl, AttributeGroup, AttributeItem, ComplexType, Directive, ElementDecl,
    InlineType, ModelGroup, Particle, SimpleType, SimpleVariety,
};
use crate::error::{CompilerError, Result};
use crate::qname::QName;

/// All top-level declarations of one target namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Target namespace; `None` until a namespace-less include is rehomed.
    pub target_namespace: Option<String>,
    /// Prefix bound to the target namespace where the schema was declared.
    pub prefix: Option<String>,
    pub complex_types: IndexMap<String, ComplexType>,
    pub simple_types: IndexMap<String, SimpleType>,
    pub elements: IndexMap<String, ElementDecl>,
    pub attributes: IndexMap<String, AttributeDecl>,
    pub attribute_groups: IndexMap<String, AttributeGroup>,
    pub groups: IndexMap<String, ModelGroup>,
    pub directives: Vec<Directive>,
}

fn merge_map<T>(
    kind: &'static str,
    ns: Option<&str>,
    into: &mut IndexMap<String, T>,
    from: IndexMap<String, T>,
) -> Result<()> {
    for (name, value) in from {
        if into.contains_key(&name) {
            return Err(CompilerError::DuplicateDefinition {
                kind,
                name: QName::new(ns, name).to_string(),
            });
        }
        into.insert(name, value);
    }
    Ok(())
}

impl Schema {
    /// Create an empty schema for a namespace.
    #[must_use]
    pub fn new(target_namespace: Option<&str>) -> Self {
        Self {
            target_namespace: target_namespace.map(String::from),
            ..Self::default()
        }
    }

    /// Merge another schema of the same namespace into this one.
    ///
    /// # Errors
    /// Returns `DuplicateDefinition` when both declare the same name in the
    /// same symbol space.
    pub fn merge(&mut self, other: Schema) -> Result<()> {
        let ns = self.target_namespace.clone();
        let ns = ns.as_deref();
        merge_map("complexType", ns, &mut self.complex_types, other.complex_types)?;
        merge_map("simpleType", ns, &mut self.simple_types, other.simple_types)?;
        merge_map("element", ns, &mut self.elements, other.elements)?;
        merge_map("attribute", ns, &mut self.attributes, other.attributes)?;
        merge_map(
            "attributeGroup",
            ns,
            &mut self.attribute_groups,
            other.attribute_groups,
        )?;
        merge_map("group", ns, &mut self.groups, other.groups)?;

        if self.prefix.is_none() {
            self.prefix = other.prefix;
        }
        for directive in other.directives {
            if !self.directives.contains(&directive) {
                self.directives.push(directive);
            }
        }
        Ok(())
    }

    /// Move a namespace-less schema into `namespace`.
    ///
    /// References into no namespace follow along, so a type used inside the
    /// included document still finds its declaration after the move.
    pub fn rehome(&mut self, namespace: &str) {
        if self.target_namespace.is_some() {
            return;
        }
        tracing::debug!(namespace, "Rehoming namespace-less schema");
        self.target_namespace = Some(namespace.to_string());

        for ct in self.complex_types.values_mut() {
            rehome_complex_type(ct, namespace);
        }
        for st in self.simple_types.values_mut() {
            rehome_simple_type(st, namespace);
        }
        for decl in self.elements.values_mut() {
            rehome_element(decl, namespace);
        }
        for decl in self.attributes.values_mut() {
            rehome_attribute(decl, namespace);
        }
        for group in self.attribute_groups.values_mut() {
            rehome_attribute_items(&mut group.attributes, namespace);
        }
        for group in self.groups.values_mut() {
            rehome_model_group(group, namespace);
        }
        for directive in &mut self.directives {
            if directive.namespace.is_none() {
                directive.namespace = Some(namespace.to_string());
            }
        }
    }

    /// Count of all top-level declarations.
    #[must_use]
    pub fn declaration_count(&self) -> usize {
        self.complex_types.len()
            + self.simple_types.len()
            + self.elements.len()
            + self.attributes.len()
            + self.attribute_groups.len()
            + self.groups.len()
    }
}

fn rehome_qname(qname: &mut QName, namespace: &str) {
    if qname.ns_uri.is_none() {
        qname.ns_uri = Some(namespace.to_string());
    }
}

fn rehome_opt(qname: &mut Option<QName>, namespace: &str) {
    if let Some(q) = qname {
        rehome_qname(q, namespace);
    }
}

fn rehome_element(decl: &mut ElementDecl, namespace: &str) {
    rehome_opt(&mut decl.reference, namespace);
    rehome_opt(&mut decl.type_name, namespace);
    match &mut decl.inline_type {
        Some(InlineType::Complex(ct)) => rehome_complex_type(ct, namespace),
        Some(InlineType::Simple(st)) => rehome_simple_type(st, namespace),
        None => {}
    }
}

fn rehome_attribute(decl: &mut AttributeDecl, namespace: &str) {
    rehome_opt(&mut decl.reference, namespace);
    rehome_opt(&mut decl.type_name, namespace);
    if let Some(st) = &mut decl.inline_type {
        rehome_simple_type(st, namespace);
    }
}

fn rehome_attribute_items(items: &mut [AttributeItem], namespace: &str) {
    for item in items {
        match item {
            AttributeItem::Attribute(decl) => rehome_attribute(decl, namespace),
            AttributeItem::GroupRef(q) => rehome_qname(q, namespace),
        }
    }
}

fn rehome_model_group(group: &mut ModelGroup, namespace: &str) {
    rehome_particles(&mut group.particles, namespace);
}

fn rehome_particles(particles: &mut [Particle], namespace: &str) {
    for particle in particles {
        match particle {
            Particle::Element(decl) => rehome_element(decl, namespace),
            Particle::Group(group) => rehome_model_group(group, namespace),
            Particle::GroupRef { reference, .. } => rehome_qname(reference, namespace),
            Particle::Any => {}
        }
    }
}

fn rehome_complex_type(ct: &mut ComplexType, namespace: &str) {
    rehome_particles(&mut ct.particles, namespace);
    rehome_attribute_items(&mut ct.attributes, namespace);
    rehome_opt(&mut ct.base, namespace);
    rehome_opt(&mut ct.simple_base, namespace);
}

fn rehome_simple_type(st: &mut SimpleType, namespace: &str) {
    if let SimpleVariety::Restriction { base, inline_base } = &mut st.variety {
        rehome_opt(base, namespace);
        if let Some(inner) = inline_base {
            rehome_simple_type(inner, namespace);
        }
    }
}
