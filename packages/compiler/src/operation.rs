//! Binding style classification and operation describing.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::descriptor::{Descriptor, DescriptorGraph, DescriptorId, TypeDescriptor};
use crate::envelope::{build_envelope, EnvelopePayload};
use crate::error::{CompilerError, Result};
use crate::resolve::TypeResolver;
use crate::wsdl::{Binding, Operation, Part, Use};

/// Classification of a bound operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// Single input and output part whose element stands for the parameter list.
    DocumentLiteralWrapped,
    /// Body holds the message's part elements as siblings.
    DocumentLiteral,
    RpcLiteral,
    RpcEncoded,
    DocumentEncoded,
}

impl Style {
    /// Persisted spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentLiteralWrapped => "documentLiteralWrapped",
            Self::DocumentLiteral => "documentLiteral",
            Self::RpcLiteral => "rpcLiteral",
            Self::RpcEncoded => "rpcEncoded",
            Self::DocumentEncoded => "documentEncoded",
        }
    }

    /// Parse the persisted spelling.
    ///
    /// # Examples
    /// ```
    /// use wsdl_descriptors::operation::Style;
    ///
    /// assert_eq!(Style::parse("documentLiteral"), Some(Style::DocumentLiteral));
    /// assert_eq!(Style::parse("document"), None);
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "documentLiteralWrapped" => Some(Self::DocumentLiteralWrapped),
            "documentLiteral" => Some(Self::DocumentLiteral),
            "rpcLiteral" => Some(Self::RpcLiteral),
            "rpcEncoded" => Some(Self::RpcEncoded),
            "documentEncoded" => Some(Self::DocumentEncoded),
            _ => None,
        }
    }
}

const PART_SHOULD_USE_ELEMENT: &str = "Document/literal part should use element";

fn check_element_parts(parts: &[Part]) -> Result<()> {
    for part in parts {
        if part.element.is_none() || part.type_name.is_some() {
            tracing::error!(part = %part.name, "{PART_SHOULD_USE_ELEMENT}");
            return Err(CompilerError::SchemaViolation(
                PART_SHOULD_USE_ELEMENT.to_string(),
            ));
        }
    }
    Ok(())
}

/// Classify a bound operation whose message parts are resolved.
///
/// The style comes from `soap:operation`, then the binding, then defaults to
/// `document`; the use comes from the input body and defaults to `literal`.
///
/// # Errors
/// Returns `SchemaViolation` when a document/literal part does not reference
/// an element, and `UnsupportedProtocol` for unknown styles.
pub fn resolve_mode(op: &Operation, binding_style: Option<&str>) -> Result<Style> {
    let style = op.style.as_deref().or(binding_style).unwrap_or("document");
    let use_ = op.input.as_ref().map(|i| i.use_).unwrap_or_default();

    match (style, use_) {
        ("document", Use::Literal) => {
            let input = op.input.as_ref().map(|i| i.parts.as_slice()).unwrap_or_default();
            check_element_parts(input)?;

            let wrapper_matches = matches!(
                input,
                [only] if only.element.as_ref().is_some_and(|e| e.name == op.name)
            );
            if !wrapper_matches {
                return Ok(Style::DocumentLiteral);
            }

            let output = op.output.as_ref().map(|o| o.parts.as_slice()).unwrap_or_default();
            check_element_parts(output)?;
            if output.len() == 1 {
                Ok(Style::DocumentLiteralWrapped)
            } else {
                Ok(Style::DocumentLiteral)
            }
        }
        ("document", Use::Encoded) => Ok(Style::DocumentEncoded),
        ("rpc", Use::Encoded) => Ok(Style::RpcEncoded),
        ("rpc", Use::Literal) => Ok(Style::RpcLiteral),
        (other, _) => Err(CompilerError::UnsupportedProtocol(format!(
            "unknown binding style '{other}'"
        ))),
    }
}

/// Resolved description of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub name: String,
    pub style: Style,
    pub soap_action: String,
    pub input: Option<DescriptorId>,
    pub output: Option<DescriptorId>,
    pub faults: Vec<DescriptorId>,
    pub documentation: Option<String>,
    pub input_envelope: DescriptorId,
    pub output_envelope: DescriptorId,
    pub fault_envelope: DescriptorId,
}

impl OperationDescriptor {
    /// Build the three envelopes and assemble the descriptor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &mut DescriptorGraph,
        name: String,
        style: Style,
        soap_action: String,
        input: Option<DescriptorId>,
        output: Option<DescriptorId>,
        faults: Vec<DescriptorId>,
        documentation: Option<String>,
    ) -> Self {
        let input_envelope = build_envelope(graph, EnvelopePayload::Message(input));
        let output_envelope = build_envelope(graph, EnvelopePayload::Message(output));
        let fault_envelope = build_envelope(graph, EnvelopePayload::Faults(&faults));
        Self {
            name,
            style,
            soap_action,
            input,
            output,
            faults,
            documentation,
            input_envelope,
            output_envelope,
            fault_envelope,
        }
    }
}

/// Every operation of a service description, sharing one descriptor graph.
#[derive(Debug, Clone)]
pub struct ServiceDescriptors {
    /// Prefix map of the root definitions.
    pub xmlns: IndexMap<String, String>,
    /// Operations keyed by name; later bindings overwrite earlier ones.
    pub operations: IndexMap<String, OperationDescriptor>,
    pub graph: DescriptorGraph,
}

/// Describes bound operations, each at most once.
#[derive(Debug)]
pub struct OperationDescriber<'d> {
    resolver: TypeResolver<'d>,
    described: HashMap<(String, String), OperationDescriptor>,
}

impl<'d> OperationDescriber<'d> {
    /// Create a describer over a resolved type graph.
    #[must_use]
    pub fn new(resolver: TypeResolver<'d>) -> Self {
        Self {
            resolver,
            described: HashMap::new(),
        }
    }

    /// Describe an operation of a binding.
    ///
    /// # Errors
    /// Returns `UnsupportedProtocol` for rpc and encoded operations,
    /// `SchemaViolation` when the soap action is missing, and resolution
    /// errors for unknown part elements.
    pub fn describe(&mut self, binding: &Binding, op: &Operation) -> Result<OperationDescriptor> {
        let key = (binding.name.to_string(), op.name.clone());
        if let Some(descriptor) = self.described.get(&key) {
            return Ok(descriptor.clone());
        }

        let mode = op.mode.ok_or_else(|| {
            CompilerError::SchemaViolation(format!(
                "operation '{}' has no resolved style",
                op.name
            ))
        })?;

        let input_parts = op.input.as_ref().map(|i| i.parts.as_slice()).unwrap_or_default();
        let output_parts = op.output.as_ref().map(|o| o.parts.as_slice()).unwrap_or_default();
        let (input, output) = match mode {
            Style::DocumentLiteralWrapped => (
                self.wrapper(input_parts)?,
                self.wrapper(output_parts)?,
            ),
            Style::DocumentLiteral => (
                Some(self.part_list(input_parts)?),
                Some(self.part_list(output_parts)?),
            ),
            Style::RpcLiteral | Style::RpcEncoded | Style::DocumentEncoded => {
                return Err(CompilerError::UnsupportedProtocol(
                    "only document style supported".to_string(),
                ))
            }
        };

        let faults = self.describe_faults(op)?;

        if op.soap_action.is_empty() {
            return Err(CompilerError::SchemaViolation(format!(
                "missing soapAction for operation '{}'",
                op.name
            )));
        }

        let descriptor = OperationDescriptor::new(
            self.resolver.graph_mut(),
            op.name.clone(),
            mode,
            op.soap_action.clone(),
            input,
            output,
            faults,
            op.documentation.clone(),
        );
        tracing::debug!(operation = %op.name, style = mode.as_str(), "Described operation");
        self.described.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    /// Give up the describer, keeping the graph.
    #[must_use]
    pub fn into_graph(self) -> DescriptorGraph {
        self.resolver.into_graph()
    }

    /// Element of the first part, standing in for the whole parameter list.
    fn wrapper(&mut self, parts: &[Part]) -> Result<Option<DescriptorId>> {
        match parts.first().and_then(|p| p.element.as_ref()) {
            Some(element) => Ok(Some(self.resolver.describe_element(element)?)),
            None => Ok(None),
        }
    }

    /// New type descriptor holding every part element as a sibling.
    fn part_list(&mut self, parts: &[Part]) -> Result<DescriptorId> {
        let list = self
            .resolver
            .graph_mut()
            .add(Descriptor::Type(TypeDescriptor::default()));
        for element in parts.iter().filter_map(|p| p.element.as_ref()) {
            let id = self.resolver.describe_element(element)?;
            self.resolver.graph_mut().add_child(list, id);
        }
        Ok(list)
    }

    fn describe_faults(&mut self, op: &Operation) -> Result<Vec<DescriptorId>> {
        let mut faults = Vec::new();
        for fault in &op.faults {
            match fault.parts.first() {
                Some(Part {
                    element: Some(element),
                    ..
                }) => faults.push(self.resolver.describe_element(element)?),
                part => tracing::warn!(
                    fault = %fault.name,
                    part = part.map(|p| p.name.as_str()).unwrap_or_default(),
                    "WS-I violation (BP2113): fault part should use element, skipping"
                ),
            }
        }
        Ok(faults)
    }
}
