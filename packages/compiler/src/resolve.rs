//! Two-phase type resolution.
//!
//! Phase one ([`TypeResolver::describe`]) gives every named complex type a
//! shell descriptor and fills in its immediate structure. Links that need
//! another named type (an element typed by a complex type, an extension
//! base, the content of an anonymous type) are queued under the type being
//! described. Phase two ([`TypeResolver::describe_children`]) drains those
//! queues; every shell already exists by then, so recursive and mutually
//! recursive types resolve to the existing shell instead of recursing.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::config::XSD_NS;
use crate::descriptor::{
    AttributeDescriptor, Descriptor, DescriptorGraph, DescriptorId, ElementDescriptor, JsType,
    TypeDescriptor,
};
use crate::error::{CompilerError, Result};
use crate::qname::QName;
use crate::wsdl::Definitions;
use crate::xsd::{
    AttributeDecl, AttributeItem, ComplexType, ElementDecl, Form, InlineType, Particle, Schema,
    SimpleType, SimpleVariety,
};

/// Namespace and local name of a named type or element.
pub type TypeKey = (Option<String>, String);

fn display_key(key: &TypeKey) -> String {
    QName::new(key.0.as_deref(), key.1.clone()).to_string()
}

/// Deferred link, applied once every shell exists.
#[derive(Debug)]
enum Link {
    /// Point an element at the shell of its named complex type.
    Type { element: DescriptorId, key: TypeKey },
    /// Put the content of a base type in front of an anonymous type's own.
    Extension { target: DescriptorId, base: TypeKey },
    /// Move the content of an anonymous type into its element.
    Splice {
        element: DescriptorId,
        source: DescriptorId,
    },
}

/// How a named type reference resolves.
enum TypeClass {
    /// Built-in or named simple type.
    Simple(JsType),
    /// Named complex type; `Some` when it has simple content.
    Complex(Option<JsType>),
    /// `xs:anyType`: structured, but nothing to describe.
    Any,
}

/// Target namespace scope of the schema a declaration was written in.
#[derive(Debug, Clone, Copy)]
struct Scope<'d> {
    ns: Option<&'d str>,
    prefix: Option<&'d str>,
}

impl<'d> Scope<'d> {
    fn of(schema: &'d Schema) -> Self {
        Self {
            ns: schema.target_namespace.as_deref(),
            prefix: schema.prefix.as_deref(),
        }
    }

    fn qualify(&self, name: &str) -> QName {
        QName::new(self.ns, name).with_prefix(self.prefix)
    }
}

/// Builds the descriptor graph for one set of definitions.
#[derive(Debug)]
pub struct TypeResolver<'d> {
    defs: &'d Definitions,
    graph: DescriptorGraph,
    shells: HashMap<TypeKey, DescriptorId>,
    elements: HashMap<TypeKey, DescriptorId>,
    /// Queued links per owning named type; `None` for lazy describes.
    pending: IndexMap<Option<TypeKey>, Vec<Link>>,
    /// `ref=` sites waiting for the content of their original.
    aliases: Vec<(DescriptorId, DescriptorId)>,
    owner: Option<TypeKey>,
    described: HashSet<TypeKey>,
    extended: HashSet<TypeKey>,
    extending: HashSet<TypeKey>,
    shells_complete: bool,
}

impl<'d> TypeResolver<'d> {
    /// Run both phases over every named complex type, in document order.
    ///
    /// # Errors
    /// Returns `UnresolvedReference` for unknown types, elements, groups or
    /// attributes, and `SchemaViolation` for circular extensions.
    pub fn resolve(defs: &'d Definitions) -> Result<Self> {
        let mut resolver = Self {
            defs,
            graph: DescriptorGraph::new(),
            shells: HashMap::new(),
            elements: HashMap::new(),
            pending: IndexMap::new(),
            aliases: Vec::new(),
            owner: None,
            described: HashSet::new(),
            extended: HashSet::new(),
            extending: HashSet::new(),
            shells_complete: false,
        };

        let keys: Vec<TypeKey> = defs
            .schemas
            .values()
            .flat_map(|schema| {
                schema
                    .complex_types
                    .keys()
                    .map(move |name| (schema.target_namespace.clone(), name.clone()))
            })
            .collect();

        for key in &keys {
            resolver.describe(key)?;
        }
        for key in &keys {
            resolver.describe_children(key)?;
        }
        let lazy = resolver.pending.shift_remove(&None).unwrap_or_default();
        resolver.apply_links(lazy)?;
        resolver.flush_aliases();
        resolver.shells_complete = true;

        tracing::debug!(
            types = keys.len(),
            descriptors = resolver.graph.len(),
            "Resolved named types"
        );
        Ok(resolver)
    }

    /// Phase one for a named complex type: shell plus immediate structure.
    ///
    /// # Errors
    /// Returns `UnresolvedReference` when the type or something it names
    /// directly does not exist.
    pub fn describe(&mut self, key: &TypeKey) -> Result<DescriptorId> {
        let shell = self.shell(key)?;
        if !self.described.insert(key.clone()) {
            return Ok(shell);
        }
        let (schema, ct) = self.complex_type(key)?;
        let previous = self.owner.replace(key.clone());
        let result = self.fill_complex(shell, ct, Scope::of(schema), false);
        self.owner = previous;
        result.map(|()| shell)
    }

    /// Phase two for a named complex type: apply its queued links.
    ///
    /// # Errors
    /// Returns `SchemaViolation` for circular extensions.
    pub fn describe_children(&mut self, key: &TypeKey) -> Result<()> {
        self.ensure_extended(key)?;
        let links = self.pending.shift_remove(&Some(key.clone())).unwrap_or_default();
        self.apply_links(links)
    }

    /// Describe a top-level element, reusing earlier results.
    ///
    /// # Errors
    /// Returns `UnresolvedReference` when the element or its type is unknown.
    pub fn describe_element(&mut self, qname: &QName) -> Result<DescriptorId> {
        let id = self.top_level_element(qname)?;
        if self.shells_complete {
            let links = self.pending.shift_remove(&None).unwrap_or_default();
            self.apply_links(links)?;
            self.flush_aliases();
        }
        Ok(id)
    }

    /// Shell of a named complex type, if it was described.
    #[must_use]
    pub fn type_descriptor(&self, qname: &QName) -> Option<DescriptorId> {
        self.shells.get(&qname.key()).copied()
    }

    /// Borrow the graph built so far.
    #[must_use]
    pub fn graph(&self) -> &DescriptorGraph {
        &self.graph
    }

    /// Borrow the graph mutably, to add derived descriptors.
    pub fn graph_mut(&mut self) -> &mut DescriptorGraph {
        &mut self.graph
    }

    /// Give up the resolver, keeping the graph.
    #[must_use]
    pub fn into_graph(self) -> DescriptorGraph {
        self.graph
    }

    fn complex_type(&self, key: &TypeKey) -> Result<(&'d Schema, &'d ComplexType)> {
        let defs = self.defs;
        defs.schema(key.0.as_deref())
            .and_then(|schema| schema.complex_types.get(&key.1).map(|ct| (schema, ct)))
            .ok_or_else(|| CompilerError::unresolved("type", display_key(key)))
    }

    fn shell(&mut self, key: &TypeKey) -> Result<DescriptorId> {
        if let Some(id) = self.shells.get(key) {
            return Ok(*id);
        }
        let (_, ct) = self.complex_type(key)?;
        let id = self.graph.add(Descriptor::Type(TypeDescriptor {
            documentation: ct.documentation.clone(),
            ..TypeDescriptor::default()
        }));
        self.shells.insert(key.clone(), id);
        Ok(id)
    }

    fn push_link(&mut self, link: Link) {
        let owner = self.owner.clone();
        self.pending.entry(owner).or_default().push(link);
    }

    fn apply_links(&mut self, links: Vec<Link>) -> Result<()> {
        for link in links {
            match link {
                Link::Type { element, key } => {
                    let shell = self.shell(&key)?;
                    if let Some(e) = self.graph.element_mut(element) {
                        e.type_descriptor = Some(shell);
                    }
                }
                Link::Extension { target, base } => {
                    self.ensure_extended(&base)?;
                    let base_id = self.shell(&base)?;
                    self.graph.prepend_children(target, base_id);
                }
                Link::Splice { element, source } => self.graph.add_child(element, source),
            }
        }
        Ok(())
    }

    fn flush_aliases(&mut self) {
        for (site, original) in std::mem::take(&mut self.aliases) {
            let elements = self.graph.get(original).elements().to_vec();
            let attributes = self.graph.get(original).attributes().to_vec();
            if let Some(e) = self.graph.element_mut(site) {
                if e.elements.is_empty() && e.attributes.is_empty() {
                    e.elements = elements;
                    e.attributes = attributes;
                }
            }
        }
    }

    fn ensure_extended(&mut self, key: &TypeKey) -> Result<()> {
        if self.extended.contains(key) {
            return Ok(());
        }
        if !self.extending.insert(key.clone()) {
            return Err(CompilerError::SchemaViolation(format!(
                "circular extension of type {}",
                display_key(key)
            )));
        }

        let (_, ct) = self.complex_type(key)?;
        if let Some(base) = ct.base.as_ref().filter(|b| b.ns() != Some(XSD_NS)) {
            let base_key = base.key();
            self.ensure_extended(&base_key)?;
            let base_id = self.shell(&base_key)?;
            let target = self.shell(key)?;
            tracing::debug!(derived = %display_key(key), base = %base, "Applying extension");
            self.graph.prepend_children(target, base_id);
        }

        self.extending.remove(key);
        self.extended.insert(key.clone());
        Ok(())
    }

    fn fill_complex(
        &mut self,
        target: DescriptorId,
        ct: &'d ComplexType,
        scope: Scope<'d>,
        anonymous: bool,
    ) -> Result<()> {
        let mut groups = Vec::new();
        for particle in &ct.particles {
            self.describe_particle(target, particle, scope, false, &mut groups)?;
        }
        let mut attribute_groups = Vec::new();
        self.describe_attribute_items(target, &ct.attributes, scope, &mut attribute_groups)?;

        if anonymous {
            if let Some(base) = ct.base.as_ref().filter(|b| b.ns() != Some(XSD_NS)) {
                self.push_link(Link::Extension {
                    target,
                    base: base.key(),
                });
            }
        }
        Ok(())
    }

    fn describe_particle(
        &mut self,
        parent: DescriptorId,
        particle: &'d Particle,
        scope: Scope<'d>,
        many: bool,
        groups: &mut Vec<TypeKey>,
    ) -> Result<()> {
        match particle {
            Particle::Element(decl) => {
                let id = self.local_element(decl, scope, many)?;
                self.graph.add_child(parent, id);
            }
            Particle::Group(group) => {
                for p in &group.particles {
                    self.describe_particle(parent, p, scope, many || group.is_many, groups)?;
                }
            }
            Particle::GroupRef { reference, is_many } => {
                let key = reference.key();
                if groups.contains(&key) {
                    tracing::warn!(group = %reference, "Recursive group reference, skipping");
                    return Ok(());
                }
                let defs = self.defs;
                let (schema, group) = defs
                    .schema(reference.ns())
                    .and_then(|s| s.groups.get(&reference.name).map(|g| (s, g)))
                    .ok_or_else(|| CompilerError::unresolved("group", reference.to_string()))?;

                groups.push(key);
                for p in &group.particles {
                    self.describe_particle(
                        parent,
                        p,
                        Scope::of(schema),
                        many || *is_many || group.is_many,
                        groups,
                    )?;
                }
                groups.pop();
            }
            Particle::Any => {}
        }
        Ok(())
    }

    fn describe_attribute_items(
        &mut self,
        parent: DescriptorId,
        items: &'d [AttributeItem],
        scope: Scope<'d>,
        groups: &mut Vec<TypeKey>,
    ) -> Result<()> {
        for item in items {
            match item {
                AttributeItem::Attribute(decl) => {
                    let id = self.attribute(decl, scope, false)?;
                    self.graph.add_child(parent, id);
                }
                AttributeItem::GroupRef(reference) => {
                    let key = reference.key();
                    if groups.contains(&key) {
                        tracing::warn!(group = %reference, "Recursive attributeGroup reference, skipping");
                        continue;
                    }
                    let defs = self.defs;
                    let (schema, group) = defs
                        .schema(reference.ns())
                        .and_then(|s| s.attribute_groups.get(&reference.name).map(|g| (s, g)))
                        .ok_or_else(|| {
                            CompilerError::unresolved("attributeGroup", reference.to_string())
                        })?;

                    groups.push(key);
                    self.describe_attribute_items(
                        parent,
                        &group.attributes,
                        Scope::of(schema),
                        groups,
                    )?;
                    groups.pop();
                }
            }
        }
        Ok(())
    }

    fn attribute(
        &mut self,
        decl: &'d AttributeDecl,
        scope: Scope<'d>,
        top_level: bool,
    ) -> Result<DescriptorId> {
        if let Some(reference) = &decl.reference {
            let defs = self.defs;
            let (schema, original) = defs
                .schema(reference.ns())
                .and_then(|s| s.attributes.get(&reference.name).map(|a| (s, a)))
                .ok_or_else(|| CompilerError::unresolved("attribute", reference.to_string()))?;
            return self.attribute(original, Scope::of(schema), true);
        }

        let name = decl.name.as_deref().unwrap_or_default();
        let form = if top_level { Form::Qualified } else { decl.form };
        let qname = match form {
            Form::Qualified => scope.qualify(name),
            Form::Unqualified => QName::new(None, name),
        };
        let js_type = match (&decl.type_name, &decl.inline_type) {
            (Some(type_name), _) => self.primitive_of(type_name, &mut Vec::new())?,
            (None, Some(st)) => self.simple_primitive(st, &mut Vec::new())?,
            (None, None) => JsType::String,
        };

        Ok(self.graph.add(Descriptor::Attribute(AttributeDescriptor {
            qname,
            type_name: decl.type_name.clone(),
            js_type: Some(js_type),
            form,
            default: decl.default.clone(),
            fixed: decl.fixed.clone(),
            documentation: decl.documentation.clone(),
        })))
    }

    fn top_level_element(&mut self, qname: &QName) -> Result<DescriptorId> {
        let key = qname.key();
        if let Some(id) = self.elements.get(&key) {
            return Ok(*id);
        }

        let defs = self.defs;
        let (schema, decl) = defs
            .schema(qname.ns())
            .and_then(|s| s.elements.get(&qname.name).map(|e| (s, e)))
            .ok_or_else(|| CompilerError::unresolved("element", qname.to_string()))?;
        let scope = Scope::of(schema);

        let (mut header, complex) =
            self.element_header(scope.qualify(&qname.name), decl, false)?;
        header.form = Form::Qualified;
        let id = self.graph.add(Descriptor::Element(header));
        self.elements.insert(key, id);
        self.element_content(id, decl, scope, complex)?;
        Ok(id)
    }

    fn local_element(
        &mut self,
        decl: &'d ElementDecl,
        scope: Scope<'d>,
        many: bool,
    ) -> Result<DescriptorId> {
        if let Some(reference) = &decl.reference {
            return self.alias(reference, decl.is_many || many);
        }

        let name = decl.name.as_deref().unwrap_or_default();
        let qname = match decl.form {
            Form::Qualified => scope.qualify(name),
            Form::Unqualified => QName::new(None, name),
        };
        let (header, complex) = self.element_header(qname, decl, decl.is_many || many)?;
        let id = self.graph.add(Descriptor::Element(header));
        self.element_content(id, decl, scope, complex)?;
        Ok(id)
    }

    /// New descriptor standing for a top-level element at a `ref=` site.
    fn alias(&mut self, reference: &QName, is_many: bool) -> Result<DescriptorId> {
        let original = self.top_level_element(reference)?;
        let site = match self.graph.element(original) {
            Some(orig) => ElementDescriptor {
                qname: orig.qname.clone(),
                type_name: orig.type_name.clone(),
                js_type: orig.js_type,
                form: Form::Qualified,
                is_simple: orig.is_simple,
                is_many,
                default: orig.default.clone(),
                fixed: orig.fixed.clone(),
                ref_original: Some(original),
                ..ElementDescriptor::default()
            },
            None => return Err(CompilerError::unresolved("element", reference.to_string())),
        };
        let id = self.graph.add(Descriptor::Element(site));
        self.aliases.push((id, original));
        Ok(id)
    }

    /// Fields known before any content is described; the flag tells whether
    /// the element is typed by a named complex type.
    fn element_header(
        &self,
        qname: QName,
        decl: &ElementDecl,
        is_many: bool,
    ) -> Result<(ElementDescriptor, bool)> {
        let mut element = ElementDescriptor {
            qname,
            type_name: decl.type_name.clone(),
            form: decl.form,
            is_many,
            default: decl.default.clone(),
            fixed: decl.fixed.clone(),
            documentation: decl.documentation.clone(),
            ..ElementDescriptor::default()
        };

        let mut complex = false;
        let simple = match (&decl.type_name, &decl.inline_type) {
            (Some(type_name), _) => match self.classify(type_name)? {
                TypeClass::Simple(js) => Some(js),
                TypeClass::Complex(simple) => {
                    complex = true;
                    simple
                }
                TypeClass::Any => None,
            },
            (None, Some(InlineType::Simple(st))) => Some(self.simple_primitive(st, &mut Vec::new())?),
            (None, Some(InlineType::Complex(ct))) => match &ct.simple_base {
                Some(base) => Some(self.primitive_of(base, &mut Vec::new())?),
                None => None,
            },
            (None, None) => None,
        };
        if let Some(js) = simple {
            element.js_type = Some(js);
            element.is_simple = true;
        }
        Ok((element, complex))
    }

    fn element_content(
        &mut self,
        id: DescriptorId,
        decl: &'d ElementDecl,
        scope: Scope<'d>,
        complex: bool,
    ) -> Result<()> {
        if let (true, Some(type_name)) = (complex, &decl.type_name) {
            self.push_link(Link::Type {
                element: id,
                key: type_name.key(),
            });
        } else if let (None, Some(InlineType::Complex(ct))) = (&decl.type_name, &decl.inline_type)
        {
            let anonymous = self.graph.add(Descriptor::Type(TypeDescriptor {
                documentation: ct.documentation.clone(),
                ..TypeDescriptor::default()
            }));
            self.fill_complex(anonymous, ct, scope, true)?;
            self.push_link(Link::Splice {
                element: id,
                source: anonymous,
            });
        }
        Ok(())
    }

    fn classify(&self, qname: &QName) -> Result<TypeClass> {
        if qname.ns() == Some(XSD_NS) {
            return Ok(match qname.name.as_str() {
                "anyType" => TypeClass::Any,
                name => TypeClass::Simple(JsType::for_builtin(name)),
            });
        }
        let defs = self.defs;
        let schema = defs
            .schema(qname.ns())
            .ok_or_else(|| CompilerError::unresolved("type", qname.to_string()))?;
        if let Some(ct) = schema.complex_types.get(&qname.name) {
            let simple = match &ct.simple_base {
                Some(base) => Some(self.primitive_of(base, &mut vec![qname.key()])?),
                None => None,
            };
            return Ok(TypeClass::Complex(simple));
        }
        if let Some(st) = schema.simple_types.get(&qname.name) {
            return Ok(TypeClass::Simple(
                self.simple_primitive(st, &mut vec![qname.key()])?,
            ));
        }
        Err(CompilerError::unresolved("type", qname.to_string()))
    }

    /// Primitive marker of a simple-valued type, following base chains.
    fn primitive_of(&self, qname: &QName, visited: &mut Vec<TypeKey>) -> Result<JsType> {
        if qname.ns() == Some(XSD_NS) {
            return Ok(JsType::for_builtin(&qname.name));
        }
        let key = qname.key();
        if visited.contains(&key) {
            return Ok(JsType::String);
        }
        visited.push(key);

        let defs = self.defs;
        let schema = defs
            .schema(qname.ns())
            .ok_or_else(|| CompilerError::unresolved("type", qname.to_string()))?;
        if let Some(st) = schema.simple_types.get(&qname.name) {
            return self.simple_primitive(st, visited);
        }
        match schema.complex_types.get(&qname.name) {
            Some(ComplexType {
                simple_base: Some(base),
                ..
            }) => self.primitive_of(base, visited),
            Some(_) => Ok(JsType::String),
            None => Err(CompilerError::unresolved("type", qname.to_string())),
        }
    }

    fn simple_primitive(&self, st: &SimpleType, visited: &mut Vec<TypeKey>) -> Result<JsType> {
        match &st.variety {
            SimpleVariety::Restriction {
                base: Some(base), ..
            } => self.primitive_of(base, visited),
            SimpleVariety::Restriction {
                inline_base: Some(inner),
                ..
            } => self.simple_primitive(inner, visited),
            _ => Ok(JsType::String),
        }
    }
}
