//! Grammar productions lifting schema elements out of the element tree.

use super::model::{
    AttributeDecl, AttributeGroup, AttributeItem, ComplexType, Compositor, Directive,
    DirectiveKind, ElementDecl, Form, InlineType, ModelGroup, Particle, SimpleType,
    SimpleVariety,
};
use super::schema::Schema;
use crate::error::{CompilerError, Result};
use crate::registry::NodeKind;
use crate::xml::{documentation_of, Document, NodeId};

/// Qualification defaults of the schema being built.
#[derive(Debug, Clone, Copy)]
struct FormDefaults {
    element: Form,
    attribute: Form,
}

/// Whether a `maxOccurs` value allows repetition.
///
/// # Examples
/// ```
/// use wsdl_descriptors::xsd::max_occurs_many;
///
/// assert!(max_occurs_many(Some("unbounded")));
/// assert!(max_occurs_many(Some("3")));
/// assert!(!max_occurs_many(Some("1")));
/// assert!(!max_occurs_many(None));
/// ```
pub fn max_occurs_many(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => false,
        Some("unbounded") => true,
        Some(n) => n.parse::<u64>().map(|n| n > 1).unwrap_or(false),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}

fn required_name(doc: &Document, id: NodeId, what: &str) -> Result<String> {
    non_empty(doc.attribute(id, "name")).ok_or_else(|| {
        CompilerError::SchemaViolation(format!("top-level {what} without a name"))
    })
}

/// Build the schema model for an `xsd:schema` element.
///
/// # Errors
/// Returns `SchemaViolation` for unnamed top-level declarations and
/// `DuplicateDefinition` for names declared twice.
pub fn build_schema(doc: &Document, id: NodeId) -> Result<Schema> {
    let target_namespace = non_empty(doc.attribute(id, "targetNamespace"));
    let mut schema = Schema::new(target_namespace.as_deref());
    schema.prefix = target_namespace
        .as_deref()
        .and_then(|ns| doc.lookup_prefix(id, ns))
        .map(String::from);

    let defaults = FormDefaults {
        element: doc
            .attribute(id, "elementFormDefault")
            .and_then(Form::parse)
            .unwrap_or(Form::Unqualified),
        attribute: doc
            .attribute(id, "attributeFormDefault")
            .and_then(Form::parse)
            .unwrap_or(Form::Unqualified),
    };

    for child in doc.element_children(id) {
        match doc.kind(child) {
            NodeKind::Element => {
                let name = required_name(doc, child, "element")?;
                let decl = parse_element(doc, child, defaults, true);
                insert_unique(&mut schema.elements, "element", name, decl)?;
            }
            NodeKind::ComplexType => {
                let name = required_name(doc, child, "complexType")?;
                let ct = parse_complex_type(doc, child, defaults);
                insert_unique(&mut schema.complex_types, "complexType", name, ct)?;
            }
            NodeKind::SimpleType => {
                let name = required_name(doc, child, "simpleType")?;
                let st = parse_simple_type(doc, child);
                insert_unique(&mut schema.simple_types, "simpleType", name, st)?;
            }
            NodeKind::Attribute => {
                let name = required_name(doc, child, "attribute")?;
                let decl = parse_attribute(doc, child, defaults, true);
                insert_unique(&mut schema.attributes, "attribute", name, decl)?;
            }
            NodeKind::AttributeGroup => {
                let name = required_name(doc, child, "attributeGroup")?;
                let group = AttributeGroup {
                    name: name.clone(),
                    attributes: parse_attribute_items(doc, child, defaults),
                };
                insert_unique(&mut schema.attribute_groups, "attributeGroup", name, group)?;
            }
            NodeKind::Group => {
                let name = required_name(doc, child, "group")?;
                let group = doc
                    .element_children(child)
                    .find(|c| compositor_of(doc.kind(*c)).is_some())
                    .map(|c| parse_model_group(doc, c, defaults))
                    .unwrap_or(ModelGroup {
                        compositor: Compositor::Sequence,
                        is_many: false,
                        particles: Vec::new(),
                    });
                insert_unique(&mut schema.groups, "group", name, group)?;
            }
            NodeKind::Include => match non_empty(doc.attribute(child, "schemaLocation")) {
                Some(location) => schema.directives.push(Directive {
                    kind: DirectiveKind::Include,
                    namespace: schema.target_namespace.clone(),
                    location,
                }),
                None => tracing::warn!("include without schemaLocation, skipping"),
            },
            NodeKind::SchemaImport => match non_empty(doc.attribute(child, "schemaLocation")) {
                Some(location) => schema.directives.push(Directive {
                    kind: DirectiveKind::Import,
                    namespace: non_empty(doc.attribute(child, "namespace")),
                    location,
                }),
                None => tracing::debug!(
                    namespace = doc.attribute(child, "namespace").unwrap_or_default(),
                    "import without schemaLocation, expecting the namespace inline"
                ),
            },
            _ => {}
        }
    }

    Ok(schema)
}

fn insert_unique<T>(
    map: &mut indexmap::IndexMap<String, T>,
    kind: &'static str,
    name: String,
    value: T,
) -> Result<()> {
    if map.contains_key(&name) {
        return Err(CompilerError::DuplicateDefinition { kind, name });
    }
    map.insert(name, value);
    Ok(())
}

fn compositor_of(kind: NodeKind) -> Option<Compositor> {
    match kind {
        NodeKind::Sequence => Some(Compositor::Sequence),
        NodeKind::Choice => Some(Compositor::Choice),
        NodeKind::All => Some(Compositor::All),
        _ => None,
    }
}

fn parse_element(doc: &Document, id: NodeId, defaults: FormDefaults, top_level: bool) -> ElementDecl {
    let reference = doc.qname_attribute(id, "ref");
    let form = if top_level || reference.is_some() {
        Form::Qualified
    } else {
        doc.attribute(id, "form")
            .and_then(Form::parse)
            .unwrap_or(defaults.element)
    };

    let inline_type = if let Some(ct) = doc.find_child(id, NodeKind::ComplexType) {
        Some(InlineType::Complex(Box::new(parse_complex_type(doc, ct, defaults))))
    } else {
        doc.find_child(id, NodeKind::SimpleType)
            .map(|st| InlineType::Simple(parse_simple_type(doc, st)))
    };

    ElementDecl {
        name: non_empty(doc.attribute(id, "name")),
        reference,
        type_name: doc.qname_attribute(id, "type"),
        inline_type,
        form,
        is_many: !top_level && max_occurs_many(doc.attribute(id, "maxOccurs")),
        default: doc.attribute(id, "default").map(String::from),
        fixed: doc.attribute(id, "fixed").map(String::from),
        documentation: documentation_of(doc, id),
    }
}

fn parse_attribute(doc: &Document, id: NodeId, defaults: FormDefaults, top_level: bool) -> AttributeDecl {
    let reference = doc.qname_attribute(id, "ref");
    let form = if top_level || reference.is_some() {
        Form::Qualified
    } else {
        doc.attribute(id, "form")
            .and_then(Form::parse)
            .unwrap_or(defaults.attribute)
    };

    AttributeDecl {
        name: non_empty(doc.attribute(id, "name")),
        reference,
        type_name: doc.qname_attribute(id, "type"),
        inline_type: doc
            .find_child(id, NodeKind::SimpleType)
            .map(|st| parse_simple_type(doc, st)),
        form,
        default: doc.attribute(id, "default").map(String::from),
        fixed: doc.attribute(id, "fixed").map(String::from),
        documentation: documentation_of(doc, id),
    }
}

fn parse_attribute_items(doc: &Document, id: NodeId, defaults: FormDefaults) -> Vec<AttributeItem> {
    let mut items = Vec::new();
    for child in doc.element_children(id) {
        match doc.kind(child) {
            NodeKind::Attribute => {
                items.push(AttributeItem::Attribute(parse_attribute(doc, child, defaults, false)));
            }
            NodeKind::AttributeGroup => {
                if let Some(reference) = doc.qname_attribute(child, "ref") {
                    items.push(AttributeItem::GroupRef(reference));
                }
            }
            _ => {}
        }
    }
    items
}

fn parse_model_group(doc: &Document, id: NodeId, defaults: FormDefaults) -> ModelGroup {
    let compositor = compositor_of(doc.kind(id)).unwrap_or(Compositor::Sequence);
    let mut particles = Vec::new();
    for child in doc.element_children(id) {
        match doc.kind(child) {
            NodeKind::Element => {
                particles.push(Particle::Element(parse_element(doc, child, defaults, false)));
            }
            NodeKind::Sequence | NodeKind::Choice | NodeKind::All => {
                particles.push(Particle::Group(parse_model_group(doc, child, defaults)));
            }
            NodeKind::Group => {
                if let Some(reference) = doc.qname_attribute(child, "ref") {
                    particles.push(Particle::GroupRef {
                        reference,
                        is_many: max_occurs_many(doc.attribute(child, "maxOccurs")),
                    });
                }
            }
            NodeKind::Any => particles.push(Particle::Any),
            _ => {}
        }
    }
    ModelGroup {
        compositor,
        is_many: max_occurs_many(doc.attribute(id, "maxOccurs")),
        particles,
    }
}

/// Content shared by `complexType` and its `extension`/`restriction` bodies.
fn parse_content(doc: &Document, id: NodeId, defaults: FormDefaults, ct: &mut ComplexType) {
    for child in doc.element_children(id) {
        match doc.kind(child) {
            NodeKind::Sequence | NodeKind::Choice | NodeKind::All => {
                ct.particles
                    .push(Particle::Group(parse_model_group(doc, child, defaults)));
            }
            NodeKind::Group => {
                if let Some(reference) = doc.qname_attribute(child, "ref") {
                    ct.particles.push(Particle::GroupRef {
                        reference,
                        is_many: max_occurs_many(doc.attribute(child, "maxOccurs")),
                    });
                }
            }
            NodeKind::Attribute => ct.attributes.push(AttributeItem::Attribute(parse_attribute(
                doc, child, defaults, false,
            ))),
            NodeKind::AttributeGroup => {
                if let Some(reference) = doc.qname_attribute(child, "ref") {
                    ct.attributes.push(AttributeItem::GroupRef(reference));
                }
            }
            _ => {}
        }
    }
}

fn parse_complex_type(doc: &Document, id: NodeId, defaults: FormDefaults) -> ComplexType {
    let mut ct = ComplexType {
        name: non_empty(doc.attribute(id, "name")),
        documentation: documentation_of(doc, id),
        ..ComplexType::default()
    };

    parse_content(doc, id, defaults, &mut ct);

    if let Some(content) = doc.find_child(id, NodeKind::ComplexContent) {
        if let Some(ext) = doc.find_child(content, NodeKind::Extension) {
            ct.base = doc.qname_attribute(ext, "base");
            parse_content(doc, ext, defaults, &mut ct);
        } else if let Some(restriction) = doc.find_child(content, NodeKind::Restriction) {
            parse_content(doc, restriction, defaults, &mut ct);
        }
    }

    if let Some(content) = doc.find_child(id, NodeKind::SimpleContent) {
        let derivation = doc
            .find_child(content, NodeKind::Extension)
            .or_else(|| doc.find_child(content, NodeKind::Restriction));
        if let Some(derivation) = derivation {
            ct.simple_base = doc.qname_attribute(derivation, "base");
            parse_content(doc, derivation, defaults, &mut ct);
        }
    }

    ct
}

fn parse_simple_type(doc: &Document, id: NodeId) -> SimpleType {
    let variety = if let Some(restriction) = doc.find_child(id, NodeKind::Restriction) {
        SimpleVariety::Restriction {
            base: doc.qname_attribute(restriction, "base"),
            inline_base: doc
                .find_child(restriction, NodeKind::SimpleType)
                .map(|st| Box::new(parse_simple_type(doc, st))),
        }
    } else if doc.find_child(id, NodeKind::List).is_some() {
        SimpleVariety::List
    } else if doc.find_child(id, NodeKind::Union).is_some() {
        SimpleVariety::Union
    } else {
        SimpleVariety::Restriction {
            base: None,
            inline_base: None,
        }
    };

    SimpleType {
        name: non_empty(doc.attribute(id, "name")),
        variety,
        documentation: documentation_of(doc, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XSD_NS;
    use crate::registry::create_wsdl_registry;
    use crate::xml::parse_document;

    fn schema_of(xml: &str) -> Schema {
        let doc = parse_document(xml, &create_wsdl_registry()).unwrap();
        let root = doc.root().unwrap();
        let types = doc.find_child(root, NodeKind::Types).unwrap();
        let schema = doc.find_child(types, NodeKind::Schema).unwrap();
        build_schema(&doc, schema).unwrap()
    }

    #[test]
    fn test_build_complex_type() {
        let schema = schema_of(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                xmlns:tns="urn:calc" targetNamespace="urn:calc" elementFormDefault="qualified">
                <xs:complexType name="Pair">
                    <xs:sequence>
                        <xs:element name="a" type="xs:int"/>
                        <xs:element name="b" type="tns:Pair" minOccurs="0" maxOccurs="unbounded"/>
                    </xs:sequence>
                    <xs:attribute name="label" type="xs:string" default="x"/>
                </xs:complexType>
            </xs:schema>"#,
        );

        assert_eq!(schema.target_namespace.as_deref(), Some("urn:calc"));
        assert_eq!(schema.prefix.as_deref(), Some("tns"));
        let pair = &schema.complex_types["Pair"];
        let Particle::Group(seq) = &pair.particles[0] else {
            panic!("expected sequence");
        };
        assert_eq!(seq.compositor, Compositor::Sequence);
        let Particle::Element(b) = &seq.particles[1] else {
            panic!("expected element");
        };
        assert!(b.is_many);
        assert_eq!(b.form, Form::Qualified);
        assert!(b.type_name.as_ref().unwrap().matches(Some("urn:calc"), "Pair"));
        let Particle::Element(a) = &seq.particles[0] else {
            panic!("expected element");
        };
        assert!(a.type_name.as_ref().unwrap().matches(Some(XSD_NS), "int"));
        let AttributeItem::Attribute(label) = &pair.attributes[0] else {
            panic!("expected attribute");
        };
        assert_eq!(label.default.as_deref(), Some("x"));
        assert_eq!(label.form, Form::Unqualified);
    }

    #[test]
    fn test_build_directives() {
        let schema = schema_of(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
                <xs:include schemaLocation="b.xsd"/>
                <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
                <xs:import namespace="urn:inline"/>
            </xs:schema>"#,
        );

        assert_eq!(schema.directives.len(), 2);
        assert_eq!(schema.directives[0].kind, DirectiveKind::Include);
        assert_eq!(schema.directives[0].namespace.as_deref(), Some("urn:a"));
        assert_eq!(schema.directives[1].kind, DirectiveKind::Import);
        assert_eq!(schema.directives[1].namespace.as_deref(), Some("urn:other"));
    }

    #[test]
    fn test_build_extension_and_simple_content() {
        let schema = schema_of(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="Derived">
                    <xs:complexContent>
                        <xs:extension base="Base">
                            <xs:sequence><xs:element name="extra" type="xs:string"/></xs:sequence>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
                <xs:complexType name="Money">
                    <xs:simpleContent>
                        <xs:extension base="xs:decimal">
                            <xs:attribute name="currency" type="xs:string"/>
                        </xs:extension>
                    </xs:simpleContent>
                </xs:complexType>
            </xs:schema>"#,
        );

        let derived = &schema.complex_types["Derived"];
        assert_eq!(derived.base.as_ref().unwrap().name, "Base");
        assert_eq!(derived.particles.len(), 1);
        let money = &schema.complex_types["Money"];
        assert!(money.simple_base.as_ref().unwrap().matches(Some(XSD_NS), "decimal"));
        assert_eq!(money.attributes.len(), 1);
    }

    #[test]
    fn test_unnamed_top_level_type_fails() {
        let doc = parse_document(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:complexType/></xs:schema>"#,
            &create_wsdl_registry(),
        )
        .unwrap();
        let root = doc.root().unwrap();
        let types = doc.find_child(root, NodeKind::Types).unwrap();
        let schema = doc.find_child(types, NodeKind::Schema).unwrap();
        assert!(matches!(
            build_schema(&doc, schema),
            Err(CompilerError::SchemaViolation(_))
        ));
    }
}
