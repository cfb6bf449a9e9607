//! Graph to persisted text.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::config::{ATTRIBUTE_TAG, ELEMENT_TAG, IDENTITY_KEY, TYPE_TAG};
use crate::descriptor::{Descriptor, DescriptorGraph, DescriptorId};
use crate::error::Result;
use crate::operation::{OperationDescriptor, ServiceDescriptors};
use crate::xsd::Form;

/// Serialize service descriptors to their persisted form.
///
/// The graph is copied first; alias back-references are folded into the
/// copy, never into `descriptors` itself. Tags are minted in first-visit
/// order by a counter local to this call, so dumping the same descriptors
/// twice gives identical text.
///
/// # Errors
/// Returns `Json` if serialization fails.
pub fn dump(descriptors: &ServiceDescriptors) -> Result<String> {
    let mut graph = descriptors.graph.clone();
    let mut done = HashSet::new();
    for op in descriptors.operations.values() {
        let roots = op.input.iter().chain(op.output.iter()).chain(op.faults.iter());
        for root in roots {
            flatten_aliases(&mut graph, *root, &mut Vec::new(), &mut done);
        }
    }

    let mut emitter = Emitter {
        graph: &graph,
        tags: HashMap::new(),
        counter: 0,
    };
    let mut root = Map::new();
    if !descriptors.xmlns.is_empty() {
        root.insert("xmlns".into(), serde_json::to_value(&descriptors.xmlns)?);
    }
    let mut operations = Map::new();
    for (name, op) in &descriptors.operations {
        operations.insert(name.clone(), emitter.operation(op)?);
    }
    if !operations.is_empty() {
        root.insert("operations".into(), Value::Object(operations));
    }
    tracing::debug!(tags = emitter.counter, "Dumped descriptors");

    to_tab_pretty(&Value::Object(root))
}

/// Fold alias back-references into the descriptors that carry them.
///
/// The alias's documentation and nested type are pulled in where the node
/// has none of its own, and the back-reference is dropped. `stack` holds the
/// active recursion path; a node already on it is not expanded again.
pub fn flatten_aliases(
    graph: &mut DescriptorGraph,
    id: DescriptorId,
    stack: &mut Vec<DescriptorId>,
    done: &mut HashSet<DescriptorId>,
) {
    if stack.contains(&id) || done.contains(&id) {
        return;
    }
    stack.push(id);

    let mut documentation = None;
    let mut type_descriptor = None;
    if let Some(original) = graph.get(id).ref_original() {
        flatten_aliases(graph, original, stack, done);
        documentation = graph.get(original).documentation().map(String::from);
        type_descriptor = graph.get(original).type_descriptor();
        match graph.get_mut(id) {
            Descriptor::Element(e) => e.ref_original = None,
            Descriptor::Type(t) => t.ref_original = None,
            Descriptor::Attribute(_) => {}
        }
    }

    let children: Vec<DescriptorId> = graph
        .get(id)
        .elements()
        .iter()
        .chain(graph.get(id).attributes())
        .copied()
        .chain(type_descriptor)
        .chain(graph.get(id).type_descriptor())
        .collect();
    for child in children {
        flatten_aliases(graph, child, stack, done);
    }

    match graph.get_mut(id) {
        Descriptor::Element(e) => {
            if e.documentation.is_none() {
                e.documentation = documentation;
            }
            if e.type_descriptor.is_none() {
                e.type_descriptor = type_descriptor;
            }
        }
        Descriptor::Type(t) => {
            if t.documentation.is_none() {
                t.documentation = documentation;
            }
        }
        Descriptor::Attribute(_) => {}
    }

    stack.pop();
    done.insert(id);
}

struct Emitter<'g> {
    graph: &'g DescriptorGraph,
    tags: HashMap<DescriptorId, String>,
    counter: usize,
}

impl Emitter<'_> {
    fn operation(&mut self, op: &OperationDescriptor) -> Result<Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(op.name.clone()));
        map.insert("style".into(), Value::String(op.style.as_str().into()));
        map.insert("soapAction".into(), Value::String(op.soap_action.clone()));
        if let Some(input) = op.input {
            map.insert("input".into(), self.descriptor(input)?);
        }
        if let Some(output) = op.output {
            map.insert("output".into(), self.descriptor(output)?);
        }
        if !op.faults.is_empty() {
            let faults = op
                .faults
                .iter()
                .map(|f| self.descriptor(*f))
                .collect::<Result<Vec<_>>>()?;
            map.insert("faults".into(), Value::Array(faults));
        }
        if let Some(doc) = &op.documentation {
            map.insert("htmldoc".into(), Value::String(doc.clone()));
        }
        Ok(Value::Object(map))
    }

    fn descriptor(&mut self, id: DescriptorId) -> Result<Value> {
        if let Some(tag) = self.tags.get(&id) {
            return Ok(Value::String(tag.clone()));
        }

        let graph = self.graph;
        let descriptor = graph.get(id);
        let prefix = match descriptor {
            Descriptor::Attribute(_) => ATTRIBUTE_TAG,
            Descriptor::Element(_) => ELEMENT_TAG,
            Descriptor::Type(_) => TYPE_TAG,
        };
        self.counter += 1;
        let tag = format!("{prefix}{}", self.counter);
        self.tags.insert(id, tag.clone());

        let mut map = Map::new();
        match descriptor {
            Descriptor::Element(e) => {
                map.insert("qname".into(), serde_json::to_value(&e.qname)?);
                if let Some(type_name) = &e.type_name {
                    map.insert("type".into(), serde_json::to_value(type_name)?);
                }
                insert_form(&mut map, e.form);
                if e.is_simple {
                    map.insert("isSimple".into(), Value::Bool(true));
                }
                if e.is_many {
                    map.insert("isMany".into(), Value::Bool(true));
                }
                if let Some(js) = e.js_type {
                    map.insert("jsType".into(), Value::String(js.sentinel().into()));
                }
                insert_opt(&mut map, "default", e.default.as_deref());
                insert_opt(&mut map, "fixed", e.fixed.as_deref());
                self.insert_list(&mut map, "elements", &e.elements)?;
                self.insert_list(&mut map, "attributes", &e.attributes)?;
                if let Some(td) = e.type_descriptor {
                    map.insert("typeDescriptor".into(), self.descriptor(td)?);
                }
                insert_opt(&mut map, "htmldoc", e.documentation.as_deref());
            }
            Descriptor::Type(t) => {
                self.insert_list(&mut map, "elements", &t.elements)?;
                self.insert_list(&mut map, "attributes", &t.attributes)?;
                insert_opt(&mut map, "htmldoc", t.documentation.as_deref());
            }
            Descriptor::Attribute(a) => {
                map.insert("qname".into(), serde_json::to_value(&a.qname)?);
                if let Some(type_name) = &a.type_name {
                    map.insert("type".into(), serde_json::to_value(type_name)?);
                }
                insert_form(&mut map, a.form);
                if let Some(js) = a.js_type {
                    map.insert("jsType".into(), Value::String(js.sentinel().into()));
                }
                insert_opt(&mut map, "default", a.default.as_deref());
                insert_opt(&mut map, "fixed", a.fixed.as_deref());
                insert_opt(&mut map, "htmldoc", a.documentation.as_deref());
            }
        }
        map.insert(IDENTITY_KEY.into(), Value::String(tag));
        Ok(Value::Object(map))
    }

    fn insert_list(
        &mut self,
        map: &mut Map<String, Value>,
        key: &str,
        ids: &[DescriptorId],
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let values = ids
            .iter()
            .map(|id| self.descriptor(*id))
            .collect::<Result<Vec<_>>>()?;
        map.insert(key.into(), Value::Array(values));
        Ok(())
    }
}

fn insert_form(map: &mut Map<String, Value>, form: Form) {
    if form != Form::Qualified {
        map.insert("form".into(), Value::String(form.as_str().into()));
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.into(), Value::String(value.into()));
    }
}

fn to_tab_pretty(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
