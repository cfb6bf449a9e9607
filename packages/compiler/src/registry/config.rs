//! Registry configuration for WSDL 1.1 / XSD / SOAP 1.2 documents.

use super::core::ElementRegistry;
use super::types::NodeKind;
use crate::config::{SOAP11_BINDING_NS, SOAP12_BINDING_NS, WSDL_NS, XSD_NS};

/// Create the registry used for service descriptions and their schemas.
#[must_use]
pub fn create_wsdl_registry() -> ElementRegistry {
    let mut registry = ElementRegistry::new();

    // Service description
    for (name, kind) in [
        ("definitions", NodeKind::Definitions),
        ("types", NodeKind::Types),
        ("message", NodeKind::Message),
        ("part", NodeKind::Part),
        ("portType", NodeKind::PortType),
        ("binding", NodeKind::Binding),
        ("operation", NodeKind::Operation),
        ("input", NodeKind::Input),
        ("output", NodeKind::Output),
        ("fault", NodeKind::Fault),
        ("service", NodeKind::Service),
        ("port", NodeKind::Port),
        ("import", NodeKind::WsdlImport),
        ("documentation", NodeKind::Documentation),
    ] {
        registry.register(WSDL_NS, name, kind);
    }
    registry.register_namespace(WSDL_NS, NodeKind::WsdlElement);

    // Schema definition
    for (name, kind) in [
        ("schema", NodeKind::Schema),
        ("element", NodeKind::Element),
        ("complexType", NodeKind::ComplexType),
        ("simpleType", NodeKind::SimpleType),
        ("sequence", NodeKind::Sequence),
        ("choice", NodeKind::Choice),
        ("all", NodeKind::All),
        ("group", NodeKind::Group),
        ("attribute", NodeKind::Attribute),
        ("attributeGroup", NodeKind::AttributeGroup),
        ("complexContent", NodeKind::ComplexContent),
        ("simpleContent", NodeKind::SimpleContent),
        ("extension", NodeKind::Extension),
        ("restriction", NodeKind::Restriction),
        ("list", NodeKind::List),
        ("union", NodeKind::Union),
        ("include", NodeKind::Include),
        ("import", NodeKind::SchemaImport),
        ("annotation", NodeKind::Annotation),
        ("documentation", NodeKind::Documentation),
        ("any", NodeKind::Any),
        ("anyAttribute", NodeKind::AnyAttribute),
    ] {
        registry.register(XSD_NS, name, kind);
    }
    registry.register_namespace(XSD_NS, NodeKind::XsdElement);

    // SOAP 1.2 binding dialect
    for (name, kind) in [
        ("binding", NodeKind::SoapBinding),
        ("operation", NodeKind::SoapOperation),
        ("body", NodeKind::SoapBody),
        ("fault", NodeKind::SoapFault),
        ("header", NodeKind::SoapHeader),
        ("address", NodeKind::SoapAddress),
    ] {
        registry.register(SOAP12_BINDING_NS, name, kind);
    }
    registry.register_namespace(SOAP12_BINDING_NS, NodeKind::SoapElement);

    registry.reject(SOAP11_BINDING_NS, "only soap 1.2 supported");

    registry
}
