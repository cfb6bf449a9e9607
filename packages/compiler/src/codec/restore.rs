//! Persisted text to graph.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::config::{is_tagged, validate_reference_tag, ATTRIBUTE_TAG, ELEMENT_TAG, IDENTITY_KEY};
use crate::descriptor::{
    AttributeDescriptor, Descriptor, DescriptorGraph, DescriptorId, ElementDescriptor, JsType,
    TypeDescriptor,
};
use crate::error::{CompilerError, Result};
use crate::operation::{OperationDescriptor, ServiceDescriptors, Style};
use crate::qname::QName;
use crate::xsd::Form;

/// Rebuild service descriptors from their persisted form.
///
/// Records carrying a tag are registered before their children are read,
/// so a child may refer back to any enclosing record. Fields are read in
/// the order they appear in the text. Omitted fields get
/// their defaults, and the three envelopes of every operation are rebuilt.
///
/// # Errors
/// Returns `ReferenceResolution` for a tag that was never defined,
/// `MalformedDump` for anything not shaped like a dump, and `Json` when the
/// text is not JSON at all.
pub fn restore(text: &str) -> Result<ServiceDescriptors> {
    let value: Value = serde_json::from_str(text)?;
    let root = value
        .as_object()
        .ok_or_else(|| CompilerError::MalformedDump("root is not an object".into()))?;

    let xmlns = match root.get("xmlns") {
        Some(v) => serde_json::from_value::<IndexMap<String, String>>(v.clone())?,
        None => IndexMap::new(),
    };

    let mut restorer = Restorer::default();
    let mut records = Vec::new();
    if let Some(operations) = root.get("operations") {
        let operations = operations
            .as_object()
            .ok_or_else(|| CompilerError::MalformedDump("operations is not an object".into()))?;
        for (key, record) in operations {
            records.push((key.clone(), restorer.operation_fields(key, record)?));
        }
    }

    // Envelopes come last, once every reference is in place.
    let mut graph = restorer.graph;
    let mut operations = IndexMap::new();
    for (key, fields) in records {
        let output = match fields.output {
            Some(output) => output,
            None => graph.add(Descriptor::Type(TypeDescriptor::default())),
        };
        let descriptor = OperationDescriptor::new(
            &mut graph,
            fields.name,
            fields.style,
            fields.soap_action,
            fields.input,
            Some(output),
            fields.faults,
            fields.documentation,
        );
        operations.insert(key, descriptor);
    }
    tracing::debug!(
        operations = operations.len(),
        descriptors = graph.len(),
        "Restored descriptors"
    );

    Ok(ServiceDescriptors {
        xmlns,
        operations,
        graph,
    })
}

struct OperationFields {
    name: String,
    style: Style,
    soap_action: String,
    input: Option<DescriptorId>,
    output: Option<DescriptorId>,
    faults: Vec<DescriptorId>,
    documentation: Option<String>,
}

#[derive(Default)]
struct Children {
    elements: Vec<DescriptorId>,
    attributes: Vec<DescriptorId>,
    type_descriptor: Option<DescriptorId>,
}

#[derive(Default)]
struct Restorer {
    graph: DescriptorGraph,
    references: HashMap<String, DescriptorId>,
}

fn malformed(message: impl Into<String>) -> CompilerError {
    CompilerError::MalformedDump(message.into())
}

fn string_field(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(malformed(format!("'{key}' should be a string, got {other}"))),
    }
}

fn bool_field(map: &Map<String, Value>, key: &str) -> Result<bool> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(malformed(format!("'{key}' should be a boolean, got {other}"))),
    }
}

fn qname_field(map: &Map<String, Value>, key: &str) -> Result<Option<QName>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
    }
}

fn form_field(map: &Map<String, Value>) -> Result<Form> {
    match string_field(map, "form")? {
        None => Ok(Form::Qualified),
        Some(value) => {
            Form::parse(&value).ok_or_else(|| malformed(format!("unknown form '{value}'")))
        }
    }
}

fn js_type_field(map: &Map<String, Value>) -> Result<Option<JsType>> {
    match string_field(map, "jsType")? {
        None => Ok(None),
        Some(value) => JsType::from_sentinel(&value)
            .map(Some)
            .ok_or_else(|| malformed(format!("unknown primitive marker '{value}'"))),
    }
}

impl Restorer {
    fn operation_fields(&mut self, key: &str, record: &Value) -> Result<OperationFields> {
        let map = record
            .as_object()
            .ok_or_else(|| malformed(format!("operation '{key}' is not an object")))?;

        let style = string_field(map, "style")?
            .ok_or_else(|| malformed(format!("operation '{key}' has no style")))?;
        let style =
            Style::parse(&style).ok_or_else(|| malformed(format!("unknown style '{style}'")))?;

        // Descriptor-bearing keys are read in document order, so a tag is
        // defined wherever its record first appears in the text.
        let (mut input, mut output, mut faults) = (None, None, Vec::new());
        for (field, value) in map {
            match field.as_str() {
                "input" => input = self.optional(Some(value))?,
                "output" => output = self.optional(Some(value))?,
                "faults" => faults = self.faults(value)?,
                _ => {}
            }
        }

        Ok(OperationFields {
            name: string_field(map, "name")?.unwrap_or_else(|| key.to_string()),
            style,
            soap_action: string_field(map, "soapAction")?.unwrap_or_default(),
            input,
            output,
            faults,
            documentation: string_field(map, "htmldoc")?,
        })
    }

    fn faults(&mut self, value: &Value) -> Result<Vec<DescriptorId>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.iter().map(|item| self.descriptor(item)).collect(),
            // Index-keyed object form.
            Value::Object(items) => items.values().map(|item| self.descriptor(item)).collect(),
            other => Err(malformed(format!("faults should be a list, got {other}"))),
        }
    }

    fn optional(&mut self, value: Option<&Value>) -> Result<Option<DescriptorId>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => self.descriptor(v).map(Some),
        }
    }

    fn list(&mut self, key: &str, value: &Value) -> Result<Vec<DescriptorId>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.iter().map(|item| self.descriptor(item)).collect(),
            other => Err(malformed(format!("'{key}' should be a list, got {other}"))),
        }
    }

    /// Resolve the children of a record, key by key in document order.
    fn children(&mut self, map: &Map<String, Value>) -> Result<Children> {
        let mut children = Children::default();
        for (key, value) in map {
            match key.as_str() {
                "elements" => children.elements = self.list(key, value)?,
                "attributes" => children.attributes = self.list(key, value)?,
                "typeDescriptor" => children.type_descriptor = self.optional(Some(value))?,
                _ => {}
            }
        }
        Ok(children)
    }

    fn descriptor(&mut self, value: &Value) -> Result<DescriptorId> {
        match value {
            Value::String(tag) if is_tagged(tag) => self
                .references
                .get(tag)
                .copied()
                .ok_or_else(|| CompilerError::ReferenceResolution(tag.clone())),
            Value::Object(map) => self.record(map),
            other => Err(malformed(format!("expected a descriptor, got {other}"))),
        }
    }

    fn record(&mut self, map: &Map<String, Value>) -> Result<DescriptorId> {
        let tag = string_field(map, IDENTITY_KEY)?
            .ok_or_else(|| malformed("descriptor record without identity tag"))?;
        validate_reference_tag(&tag)?;
        if self.references.contains_key(&tag) {
            return Err(malformed(format!("tag '{tag}' defined twice")));
        }

        let id = self
            .graph
            .add(Descriptor::Type(TypeDescriptor::default()));
        self.references.insert(tag.clone(), id);
        let children = self.children(map)?;

        let descriptor = if tag.starts_with(ATTRIBUTE_TAG) {
            Descriptor::Attribute(AttributeDescriptor {
                qname: qname_field(map, "qname")?.unwrap_or_default(),
                type_name: qname_field(map, "type")?,
                js_type: js_type_field(map)?,
                form: form_field(map)?,
                default: string_field(map, "default")?,
                fixed: string_field(map, "fixed")?,
                documentation: string_field(map, "htmldoc")?,
            })
        } else if tag.starts_with(ELEMENT_TAG) {
            Descriptor::Element(ElementDescriptor {
                qname: qname_field(map, "qname")?.unwrap_or_default(),
                type_name: qname_field(map, "type")?,
                js_type: js_type_field(map)?,
                form: form_field(map)?,
                is_simple: bool_field(map, "isSimple")?,
                is_many: bool_field(map, "isMany")?,
                default: string_field(map, "default")?,
                fixed: string_field(map, "fixed")?,
                elements: children.elements,
                attributes: children.attributes,
                type_descriptor: children.type_descriptor,
                documentation: string_field(map, "htmldoc")?,
                ref_original: None,
            })
        } else {
            Descriptor::Type(TypeDescriptor {
                elements: children.elements,
                attributes: children.attributes,
                documentation: string_field(map, "htmldoc")?,
                ref_original: None,
            })
        };

        *self.graph.get_mut(id) = descriptor;
        Ok(id)
    }
}
