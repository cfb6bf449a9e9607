//! Root aggregate of a loaded service description.

use indexmap::IndexMap;

use super::model::{Binding, Message, Part, PortType, Service};
use crate::error::{CompilerError, Result};
use crate::operation::resolve_mode;
use crate::qname::QName;
use crate::xsd::{Directive, Schema};

/// One logical service description after include merging.
///
/// Named components are keyed by the display form of their qualified name
/// (`{ns}local`), so components imported from other namespaces never clash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: Option<String>,
    /// Prefix map of the root element; the default namespace is keyed by `""`.
    pub xmlns: IndexMap<String, String>,
    pub schemas: IndexMap<Option<String>, Schema>,
    pub messages: IndexMap<String, Message>,
    pub port_types: IndexMap<String, PortType>,
    pub bindings: IndexMap<String, Binding>,
    pub services: IndexMap<String, Service>,
    /// `wsdl:import` directives.
    pub imports: Vec<Directive>,
    pub documentation: Option<String>,
}

fn merge_named<T>(
    kind: &'static str,
    into: &mut IndexMap<String, T>,
    from: IndexMap<String, T>,
) -> Result<()> {
    for (key, value) in from {
        if into.contains_key(&key) {
            return Err(CompilerError::DuplicateDefinition { kind, name: key });
        }
        into.insert(key, value);
    }
    Ok(())
}

impl Definitions {
    /// Create empty definitions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema, merging it into an existing one of the same namespace.
    ///
    /// # Errors
    /// Returns `DuplicateDefinition` when the merge finds a clash.
    pub fn add_schema(&mut self, schema: Schema) -> Result<()> {
        match self.schemas.get_mut(&schema.target_namespace) {
            Some(existing) => existing.merge(schema),
            None => {
                self.schemas.insert(schema.target_namespace.clone(), schema);
                Ok(())
            }
        }
    }

    /// Every include/import directive of every schema, then `wsdl:import`s.
    #[must_use]
    pub fn directives(&self) -> Vec<Directive> {
        self.schemas
            .values()
            .flat_map(|s| s.directives.iter().cloned())
            .chain(self.imports.iter().cloned())
            .collect()
    }

    /// Move the namespace-less schema, if any, under `namespace`.
    ///
    /// # Errors
    /// Returns `DuplicateDefinition` when the rehomed schema clashes with one
    /// already registered for `namespace`.
    pub fn rehome(&mut self, namespace: &str) -> Result<()> {
        if let Some(mut schema) = self.schemas.shift_remove(&None) {
            schema.rehome(namespace);
            self.add_schema(schema)?;
        }
        Ok(())
    }

    /// Merge definitions loaded from an include or import target.
    ///
    /// Name, target namespace and documentation stay those of `self`; prefix
    /// bindings already present win.
    ///
    /// # Errors
    /// Returns `DuplicateDefinition` for any name declared on both sides.
    pub fn merge(&mut self, other: Definitions) -> Result<()> {
        for (prefix, uri) in other.xmlns {
            self.xmlns.entry(prefix).or_insert(uri);
        }
        for schema in other.schemas.into_values() {
            self.add_schema(schema)?;
        }
        merge_named("message", &mut self.messages, other.messages)?;
        merge_named("portType", &mut self.port_types, other.port_types)?;
        merge_named("binding", &mut self.bindings, other.bindings)?;
        merge_named("service", &mut self.services, other.services)?;
        for import in other.imports {
            if !self.imports.contains(&import) {
                self.imports.push(import);
            }
        }
        Ok(())
    }

    /// Look up a schema by target namespace.
    #[must_use]
    pub fn schema(&self, namespace: Option<&str>) -> Option<&Schema> {
        self.schemas.get(&namespace.map(String::from))
    }

    /// Resolve port types and messages of every bound operation, then
    /// classify each operation once.
    ///
    /// # Errors
    /// Returns `UnresolvedReference` for unknown port types, operations or
    /// messages, and `SchemaViolation` from style classification.
    pub fn post_process(&mut self) -> Result<()> {
        let Self {
            bindings,
            port_types,
            messages,
            ..
        } = self;

        for binding in bindings.values_mut() {
            let port_type = match &binding.port_type {
                Some(q) => Some(
                    port_types
                        .get(&q.to_string())
                        .ok_or_else(|| CompilerError::unresolved("portType", q.to_string()))?,
                ),
                None => None,
            };

            for op in binding.operations.values_mut() {
                if op.mode.is_some() {
                    continue;
                }
                let abstract_op = match port_type {
                    Some(pt) => Some(pt.operations.get(&op.name).ok_or_else(|| {
                        CompilerError::unresolved("operation", format!("{}#{}", pt.name, op.name))
                    })?),
                    None => None,
                };
                if op.documentation.is_none() {
                    op.documentation = abstract_op.and_then(|a| a.documentation.clone());
                }

                if let Some(input) = &mut op.input {
                    input.message = abstract_op.and_then(|a| a.input.clone());
                    input.parts =
                        resolve_parts(messages, input.message.as_ref(), input.part_names.as_deref())?;
                }
                if let Some(output) = &mut op.output {
                    output.message = abstract_op.and_then(|a| a.output.clone());
                    output.parts = resolve_parts(
                        messages,
                        output.message.as_ref(),
                        output.part_names.as_deref(),
                    )?;
                }
                for fault in &mut op.faults {
                    fault.message = abstract_op.and_then(|a| {
                        a.faults
                            .iter()
                            .find(|f| f.name == fault.name)
                            .map(|f| f.message.clone())
                    });
                    fault.parts = resolve_parts(messages, fault.message.as_ref(), None)?;
                }

                let mode = resolve_mode(op, binding.style.as_deref())?;
                tracing::debug!(operation = %op.name, mode = mode.as_str(), "Classified operation");
                op.mode = Some(mode);
            }
        }
        Ok(())
    }
}

fn resolve_parts(
    messages: &IndexMap<String, Message>,
    message: Option<&QName>,
    part_names: Option<&[String]>,
) -> Result<Vec<Part>> {
    let Some(message) = message else {
        return Ok(Vec::new());
    };
    let found = messages
        .get(&message.to_string())
        .ok_or_else(|| CompilerError::unresolved("message", message.to_string()))?;

    Ok(found
        .parts
        .iter()
        .filter(|p| part_names.is_none_or(|names| names.contains(&p.name)))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Style;
    use crate::wsdl::model::{BindingMessage, Operation, PortTypeOperation};

    fn message(ns: &str, name: &str, element: &str) -> Message {
        Message {
            name: QName::new(Some(ns), name),
            parts: vec![Part {
                name: "parameters".into(),
                element: Some(QName::new(Some(ns), element)),
                type_name: None,
            }],
            documentation: None,
        }
    }

    fn definitions(op_name: &str, style: Option<&str>) -> Definitions {
        let ns = "urn:calc";
        let mut defs = Definitions::new();
        for m in [message(ns, "AddIn", "Add"), message(ns, "AddOut", "AddResponse")] {
            defs.messages.insert(m.name.to_string(), m);
        }
        let mut operations = IndexMap::new();
        operations.insert(
            op_name.to_string(),
            PortTypeOperation {
                name: op_name.into(),
                input: Some(QName::new(Some(ns), "AddIn")),
                output: Some(QName::new(Some(ns), "AddOut")),
                ..PortTypeOperation::default()
            },
        );
        let pt = PortType {
            name: QName::new(Some(ns), "CalcPort"),
            operations,
        };
        defs.port_types.insert(pt.name.to_string(), pt);

        let mut bound = IndexMap::new();
        bound.insert(
            op_name.to_string(),
            Operation {
                name: op_name.into(),
                soap_action: format!("urn:{op_name}"),
                input: Some(BindingMessage::default()),
                output: Some(BindingMessage::default()),
                ..Operation::default()
            },
        );
        let binding = Binding {
            name: QName::new(Some(ns), "CalcBinding"),
            port_type: Some(QName::new(Some(ns), "CalcPort")),
            style: style.map(String::from),
            transport: None,
            operations: bound,
        };
        defs.bindings.insert(binding.name.to_string(), binding);
        defs
    }

    fn mode_of(defs: &Definitions, op: &str) -> Option<Style> {
        defs.bindings.values().next().unwrap().operations[op].mode
    }

    #[test]
    fn test_post_process_wrapped() {
        let mut defs = definitions("Add", Some("document"));
        defs.post_process().unwrap();
        assert_eq!(mode_of(&defs, "Add"), Some(Style::DocumentLiteralWrapped));
    }

    #[test]
    fn test_post_process_name_mismatch_is_bare() {
        let mut defs = definitions("Compute", None);
        defs.post_process().unwrap();
        assert_eq!(mode_of(&defs, "Compute"), Some(Style::DocumentLiteral));
    }

    #[test]
    fn test_post_process_rpc_literal() {
        let mut defs = definitions("Add", Some("rpc"));
        defs.post_process().unwrap();
        assert_eq!(mode_of(&defs, "Add"), Some(Style::RpcLiteral));
    }

    #[test]
    fn test_post_process_unknown_message() {
        let mut defs = definitions("Add", None);
        defs.messages.clear();
        let err = defs.post_process().unwrap_err();
        assert!(matches!(
            err,
            CompilerError::UnresolvedReference { kind: "message", .. }
        ));
    }

    #[test]
    fn test_merge_duplicate_binding_is_fatal() {
        let mut a = definitions("Add", None);
        let b = definitions("Add", None);
        let mut only_bindings = Definitions::new();
        only_bindings.bindings = b.bindings;
        assert!(matches!(
            a.merge(only_bindings),
            Err(CompilerError::DuplicateDefinition { kind: "binding", .. })
        ));
    }

    #[test]
    fn test_rehome_moves_schema() {
        let mut defs = Definitions::new();
        defs.add_schema(Schema::new(None)).unwrap();
        defs.rehome("urn:a").unwrap();
        assert!(defs.schema(None).is_none());
        assert!(defs.schema(Some("urn:a")).is_some());
    }
}
