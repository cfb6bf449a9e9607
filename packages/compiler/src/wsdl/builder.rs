//! Lift a parsed service description tree into [`Definitions`].

use indexmap::IndexMap;

use super::definitions::Definitions;
use super::model::{
    Binding, BindingFault, BindingMessage, Message, Operation, Part, Port, PortType,
    PortTypeFault, PortTypeOperation, Service, Use,
};
use crate::error::{CompilerError, Result};
use crate::qname::QName;
use crate::registry::NodeKind;
use crate::xml::{documentation_of, Document, NodeId};
use crate::xsd::{build_schema, Directive, DirectiveKind};

/// Build definitions from a parsed document.
///
/// # Arguments
/// * `doc` - Document whose root is a `definitions` element (possibly shimmed
///   around a bare schema)
///
/// # Returns
/// The raw definitions, not yet post-processed
///
/// # Errors
/// Returns `StructuralParse` when the document is empty and propagates
/// schema building errors.
pub fn build_definitions(doc: &Document) -> Result<Definitions> {
    let root = doc
        .root()
        .ok_or_else(|| CompilerError::parse("Document has no root element"))?;

    let target_namespace = doc
        .attribute(root, "targetNamespace")
        .filter(|v| !v.is_empty())
        .map(String::from);
    let tns = target_namespace.as_deref();

    let mut defs = Definitions {
        name: doc.attribute(root, "name").map(String::from),
        target_namespace: target_namespace.clone(),
        documentation: documentation_of(doc, root),
        ..Definitions::default()
    };
    for (prefix, uri) in &doc.node(root).namespaces {
        defs.xmlns
            .insert(prefix.clone().unwrap_or_default(), uri.clone());
    }

    for child in doc.element_children(root) {
        match doc.kind(child) {
            NodeKind::Types => {
                for schema in doc.find_children(child, NodeKind::Schema) {
                    defs.add_schema(build_schema(doc, schema)?)?;
                }
            }
            NodeKind::Message => {
                let message = build_message(doc, child, tns);
                defs.messages.insert(message.name.to_string(), message);
            }
            NodeKind::PortType => {
                let port_type = build_port_type(doc, child, tns);
                defs.port_types.insert(port_type.name.to_string(), port_type);
            }
            NodeKind::Binding => {
                let binding = build_binding(doc, child, tns);
                defs.bindings.insert(binding.name.to_string(), binding);
            }
            NodeKind::Service => {
                let service = build_service(doc, child, tns);
                defs.services.insert(service.name.to_string(), service);
            }
            NodeKind::WsdlImport => match doc.attribute(child, "location") {
                Some(location) if !location.is_empty() => defs.imports.push(Directive {
                    kind: DirectiveKind::Import,
                    namespace: doc.attribute(child, "namespace").map(String::from),
                    location: location.to_string(),
                }),
                _ => tracing::warn!("wsdl:import without location, skipping"),
            },
            _ => {}
        }
    }

    Ok(defs)
}

fn component_name(doc: &Document, id: NodeId, tns: Option<&str>) -> QName {
    let prefix = tns.and_then(|ns| doc.lookup_prefix(id, ns));
    QName::new(tns, doc.attribute(id, "name").unwrap_or_default()).with_prefix(prefix)
}

fn build_message(doc: &Document, id: NodeId, tns: Option<&str>) -> Message {
    let parts = doc
        .find_children(id, NodeKind::Part)
        .map(|part| Part {
            name: doc.attribute(part, "name").unwrap_or_default().to_string(),
            element: doc.qname_attribute(part, "element"),
            type_name: doc.qname_attribute(part, "type"),
        })
        .collect();

    Message {
        name: component_name(doc, id, tns),
        parts,
        documentation: documentation_of(doc, id),
    }
}

fn build_port_type(doc: &Document, id: NodeId, tns: Option<&str>) -> PortType {
    let mut operations = IndexMap::new();
    for op in doc.find_children(id, NodeKind::Operation) {
        let name = doc.attribute(op, "name").unwrap_or_default().to_string();
        let message_of = |kind| {
            doc.find_child(op, kind)
                .and_then(|io| doc.qname_attribute(io, "message"))
        };
        let faults = doc
            .find_children(op, NodeKind::Fault)
            .filter_map(|fault| {
                Some(PortTypeFault {
                    name: doc.attribute(fault, "name").unwrap_or_default().to_string(),
                    message: doc.qname_attribute(fault, "message")?,
                })
            })
            .collect();

        operations.insert(
            name.clone(),
            PortTypeOperation {
                name,
                input: message_of(NodeKind::Input),
                output: message_of(NodeKind::Output),
                faults,
                documentation: documentation_of(doc, op),
            },
        );
    }

    PortType {
        name: component_name(doc, id, tns),
        operations,
    }
}

fn build_binding_message(doc: &Document, id: NodeId) -> BindingMessage {
    let body = doc.find_child(id, NodeKind::SoapBody);
    BindingMessage {
        use_: Use::parse(body.and_then(|b| doc.attribute(b, "use"))),
        part_names: body
            .and_then(|b| doc.attribute(b, "parts"))
            .map(|parts| parts.split_whitespace().map(String::from).collect()),
        ..BindingMessage::default()
    }
}

fn build_operation(doc: &Document, id: NodeId) -> Operation {
    let soap_op = doc.find_child(id, NodeKind::SoapOperation);
    Operation {
        name: doc.attribute(id, "name").unwrap_or_default().to_string(),
        soap_action: soap_op
            .and_then(|s| doc.attribute(s, "soapAction"))
            .unwrap_or_default()
            .to_string(),
        style: soap_op
            .and_then(|s| doc.attribute(s, "style"))
            .filter(|s| !s.is_empty())
            .map(String::from),
        input: doc
            .find_child(id, NodeKind::Input)
            .map(|io| build_binding_message(doc, io)),
        output: doc
            .find_child(id, NodeKind::Output)
            .map(|io| build_binding_message(doc, io)),
        faults: doc
            .find_children(id, NodeKind::Fault)
            .map(|fault| BindingFault {
                name: doc.attribute(fault, "name").unwrap_or_default().to_string(),
                ..BindingFault::default()
            })
            .collect(),
        documentation: documentation_of(doc, id),
        mode: None,
    }
}

fn build_binding(doc: &Document, id: NodeId, tns: Option<&str>) -> Binding {
    let soap_binding = doc.find_child(id, NodeKind::SoapBinding);
    let mut operations = IndexMap::new();
    for op in doc.find_children(id, NodeKind::Operation) {
        let op = build_operation(doc, op);
        operations.insert(op.name.clone(), op);
    }

    Binding {
        name: component_name(doc, id, tns),
        port_type: doc.qname_attribute(id, "type"),
        style: soap_binding
            .and_then(|b| doc.attribute(b, "style"))
            .filter(|s| !s.is_empty())
            .map(String::from),
        transport: soap_binding
            .and_then(|b| doc.attribute(b, "transport"))
            .map(String::from),
        operations,
    }
}

fn build_service(doc: &Document, id: NodeId, tns: Option<&str>) -> Service {
    let ports = doc
        .find_children(id, NodeKind::Port)
        .map(|port| Port {
            name: doc.attribute(port, "name").unwrap_or_default().to_string(),
            binding: doc.qname_attribute(port, "binding"),
            address: doc
                .find_child(port, NodeKind::SoapAddress)
                .and_then(|a| doc.attribute(a, "location"))
                .map(String::from),
        })
        .collect();

    Service {
        name: component_name(doc, id, tns),
        ports,
        documentation: documentation_of(doc, id),
    }
}
