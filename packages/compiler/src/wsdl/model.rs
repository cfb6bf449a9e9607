//! Raw service description constructs.

use indexmap::IndexMap;

use crate::operation::Style;
use crate::qname::QName;

/// Body encoding of a binding message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Use {
    #[default]
    Literal,
    Encoded,
}

impl Use {
    /// Parse a `use` attribute; anything but `encoded` is literal.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("encoded") => Self::Encoded,
            _ => Self::Literal,
        }
    }
}

/// A message part.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Part {
    pub name: String,
    /// Referenced top-level element (document style).
    pub element: Option<QName>,
    /// Referenced type (rpc style).
    pub type_name: Option<QName>,
}

/// An abstract message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: QName,
    pub parts: Vec<Part>,
    pub documentation: Option<String>,
}

/// Fault declared on an abstract operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PortTypeFault {
    pub name: String,
    pub message: QName,
}

/// Operation of a port type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortTypeOperation {
    pub name: String,
    pub input: Option<QName>,
    pub output: Option<QName>,
    pub faults: Vec<PortTypeFault>,
    pub documentation: Option<String>,
}

/// An abstract operation set.
#[derive(Debug, Clone, PartialEq)]
pub struct PortType {
    pub name: QName,
    pub operations: IndexMap<String, PortTypeOperation>,
}

/// Input or output of a bound operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingMessage {
    /// `soap:body/@use`.
    pub use_: Use,
    /// `soap:body/@parts` restriction, when present.
    pub part_names: Option<Vec<String>>,
    /// Message resolved through the port type.
    pub message: Option<QName>,
    /// Body parts, filled in by post-processing.
    pub parts: Vec<Part>,
}

/// Fault of a bound operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingFault {
    pub name: String,
    pub message: Option<QName>,
    pub parts: Vec<Part>,
}

/// A bound operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Operation {
    pub name: String,
    /// `soap:operation/@soapAction`; empty when absent.
    pub soap_action: String,
    /// `soap:operation/@style`.
    pub style: Option<String>,
    pub input: Option<BindingMessage>,
    pub output: Option<BindingMessage>,
    pub faults: Vec<BindingFault>,
    pub documentation: Option<String>,
    /// Classification computed once by post-processing.
    pub mode: Option<Style>,
}

/// A concrete binding of a port type.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: QName,
    pub port_type: Option<QName>,
    /// `soap:binding/@style`; defaulted to `document` after loading.
    pub style: Option<String>,
    pub transport: Option<String>,
    pub operations: IndexMap<String, Operation>,
}

/// Endpoint of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: String,
    pub binding: Option<QName>,
    pub address: Option<String>,
}

/// A service.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: QName,
    pub ports: Vec<Port>,
    pub documentation: Option<String>,
}
