//! Cycle-safe persisted form of service descriptors.
//!
//! The persisted form is a tab-indented JSON tree. The first visit of a
//! descriptor emits a full record ending in an `__id` tag (`:a:<n>`,
//! `:e:<n>`, `:t:<n>`); later visits emit only the tag. Primitive markers
//! are the sentinels `:Number:`, `:String:`, `:Boolean:` and `:Date:`, and
//! default-valued fields are left out.

mod dump;
mod restore;

pub use dump::{dump, flatten_aliases};
pub use restore::restore;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        AttributeDescriptor, Descriptor, DescriptorGraph, DescriptorId, ElementDescriptor, JsType,
        TypeDescriptor,
    };
    use crate::error::CompilerError;
    use crate::operation::{OperationDescriptor, ServiceDescriptors, Style};
    use crate::qname::QName;
    use crate::xsd::Form;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn qname(name: &str) -> QName {
        QName::new(Some("urn:t"), name).with_prefix(Some("tns"))
    }

    fn service(
        mut graph: DescriptorGraph,
        ops: Vec<(&str, Option<DescriptorId>, Option<DescriptorId>, Vec<DescriptorId>)>,
    ) -> ServiceDescriptors {
        let mut operations = IndexMap::new();
        for (name, input, output, faults) in ops {
            let op = OperationDescriptor::new(
                &mut graph,
                name.to_string(),
                Style::DocumentLiteralWrapped,
                format!("urn:{name}"),
                input,
                output,
                faults,
                None,
            );
            operations.insert(name.to_string(), op);
        }
        let mut xmlns = IndexMap::new();
        xmlns.insert("tns".to_string(), "urn:t".to_string());
        ServiceDescriptors {
            xmlns,
            operations,
            graph,
        }
    }

    /// `Node { value: int, next: Node }` wrapped in an element.
    fn recursive_graph() -> (DescriptorGraph, DescriptorId) {
        let mut graph = DescriptorGraph::new();
        let node = graph.add(Descriptor::Type(TypeDescriptor::default()));
        let value = graph.add(Descriptor::Element(ElementDescriptor {
            is_simple: true,
            js_type: Some(JsType::Number),
            type_name: Some(QName::new(Some(crate::config::XSD_NS), "int")),
            ..ElementDescriptor::new(qname("value"))
        }));
        let next = graph.add(Descriptor::Element(ElementDescriptor {
            type_name: Some(qname("Node")),
            type_descriptor: Some(node),
            ..ElementDescriptor::new(qname("next"))
        }));
        graph.add_child(node, value);
        graph.add_child(node, next);
        let root = graph.add(Descriptor::Element(ElementDescriptor {
            type_descriptor: Some(node),
            ..ElementDescriptor::new(qname("List"))
        }));
        (graph, root)
    }

    #[test]
    fn test_dump_shape() {
        let mut graph = DescriptorGraph::new();
        let attr = graph.add(Descriptor::Attribute(AttributeDescriptor {
            qname: QName::new(None, "unit"),
            js_type: Some(JsType::String),
            form: Form::Unqualified,
            ..AttributeDescriptor::default()
        }));
        let element = graph.add(Descriptor::Element(ElementDescriptor {
            is_simple: true,
            js_type: Some(JsType::Number),
            attributes: vec![attr],
            ..ElementDescriptor::new(qname("Amount"))
        }));
        let descriptors = service(graph, vec![("Pay", Some(element), None, vec![])]);

        let text = dump(&descriptors).unwrap();
        let expected = "{\n\t\"xmlns\": {\n\t\t\"tns\": \"urn:t\"\n\t},\n\t\"operations\": {\n\t\t\"Pay\": {\n\t\t\t\"name\": \"Pay\",\n\t\t\t\"style\": \"documentLiteralWrapped\",\n\t\t\t\"soapAction\": \"urn:Pay\",\n\t\t\t\"input\": {\n\t\t\t\t\"qname\": {\n\t\t\t\t\t\"nsURI\": \"urn:t\",\n\t\t\t\t\t\"name\": \"Amount\",\n\t\t\t\t\t\"prefix\": \"tns\"\n\t\t\t\t},\n\t\t\t\t\"isSimple\": true,\n\t\t\t\t\"jsType\": \":Number:\",\n\t\t\t\t\"attributes\": [\n\t\t\t\t\t{\n\t\t\t\t\t\t\"qname\": {\n\t\t\t\t\t\t\t\"name\": \"unit\"\n\t\t\t\t\t\t},\n\t\t\t\t\t\t\"form\": \"unqualified\",\n\t\t\t\t\t\t\"jsType\": \":String:\",\n\t\t\t\t\t\t\"__id\": \":a:2\"\n\t\t\t\t\t}\n\t\t\t\t],\n\t\t\t\t\"__id\": \":e:1\"\n\t\t\t}\n\t\t}\n\t}\n}";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_restore_backfills_defaults() {
        let text = r#"{"operations": {"Op": {"name": "Op", "style": "documentLiteral",
            "soapAction": "urn:Op", "input": {"qname": {"name": "x"}, "__id": ":e:1"}}}}"#;
        let restored = restore(text).unwrap();
        let op = &restored.operations["Op"];
        let input = restored.graph.element(op.input.unwrap()).unwrap();

        assert!(!input.is_simple);
        assert!(!input.is_many);
        assert_eq!(input.form, Form::Qualified);
        assert!(input.elements.is_empty());
        assert!(input.attributes.is_empty());

        let output = restored.graph.get(op.output.unwrap());
        assert!(matches!(output, Descriptor::Type(t) if t.elements.is_empty()));
        assert!(op.faults.is_empty());
    }

    #[test]
    fn test_recursive_round_trip_keeps_identity() {
        let (graph, root) = recursive_graph();
        let descriptors = service(graph, vec![("Walk", Some(root), Some(root), vec![])]);

        let text = dump(&descriptors).unwrap();
        let restored = restore(&text).unwrap();
        let op = &restored.operations["Walk"];

        // input and output were the same instance
        assert_eq!(op.input, op.output);
        let input = op.input.unwrap();
        assert!(descriptors
            .graph
            .isomorphic(root, &restored.graph, input));

        // the cycle closes on the same type descriptor
        let node = restored.graph.element(input).unwrap().type_descriptor.unwrap();
        let next = restored.graph.get(node).elements()[1];
        assert_eq!(restored.graph.element(next).unwrap().type_descriptor, Some(node));
    }

    #[test]
    fn test_dump_is_deterministic() {
        let (graph, root) = recursive_graph();
        let descriptors = service(graph, vec![("A", Some(root), None, vec![]), ("B", None, Some(root), vec![])]);
        let first = dump(&descriptors).unwrap();
        let second = dump(&descriptors).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"output\": \":e:1\""));
    }

    #[test]
    fn test_dump_restore_dump_is_stable() {
        let (graph, root) = recursive_graph();
        let descriptors = service(graph, vec![("Walk", Some(root), Some(root), vec![root])]);
        let text = dump(&descriptors).unwrap();
        assert_eq!(dump(&restore(&text).unwrap()).unwrap(), text);
    }

    #[test]
    fn test_alias_is_flattened() {
        let mut graph = DescriptorGraph::new();
        let ty = graph.add(Descriptor::Type(TypeDescriptor::default()));
        let original = graph.add(Descriptor::Element(ElementDescriptor {
            type_descriptor: Some(ty),
            documentation: Some("The item".into()),
            ..ElementDescriptor::new(qname("Item"))
        }));
        let site = graph.add(Descriptor::Element(ElementDescriptor {
            is_many: true,
            ref_original: Some(original),
            ..ElementDescriptor::new(qname("Item"))
        }));
        let wrapper = graph.add(Descriptor::Element(ElementDescriptor::new(qname("Order"))));
        graph.add_child(wrapper, site);
        let descriptors = service(graph, vec![("Order", Some(wrapper), None, vec![])]);

        let text = dump(&descriptors).unwrap();
        assert!(text.contains("\"htmldoc\": \"The item\""));
        assert!(text.contains("\"typeDescriptor\""));

        // the live graph is untouched
        assert_eq!(
            descriptors.graph.element(site).unwrap().ref_original,
            Some(original)
        );

        let restored = restore(&text).unwrap();
        let input = restored.operations["Order"].input.unwrap();
        let item = restored.graph.get(input).elements()[0];
        let item = restored.graph.element(item).unwrap();
        assert!(item.is_many);
        assert!(item.ref_original.is_none());
        assert_eq!(item.documentation.as_deref(), Some("The item"));
        assert!(item.type_descriptor.is_some());
    }

    #[test]
    fn test_flatten_terminates_on_alias_cycle() {
        let mut graph = DescriptorGraph::new();
        let a = graph.add(Descriptor::Element(ElementDescriptor::new(qname("a"))));
        let b = graph.add(Descriptor::Element(ElementDescriptor {
            ref_original: Some(a),
            ..ElementDescriptor::new(qname("b"))
        }));
        if let Some(e) = graph.element_mut(a) {
            e.ref_original = Some(b);
            e.elements.push(a);
        }
        flatten_aliases(&mut graph, a, &mut Vec::new(), &mut std::collections::HashSet::new());
        assert!(graph.element(a).unwrap().ref_original.is_none());
    }

    #[test]
    fn test_unknown_reference_fails() {
        let text = r#"{"operations": {"Op": {"style": "documentLiteral", "input": ":e:9"}}}"#;
        let err = restore(text).unwrap_err();
        assert!(matches!(err, CompilerError::ReferenceResolution(_)));
        assert_eq!(err.to_string(), "cannot resolve :e:9");
    }

    #[test]
    fn test_restore_follows_key_order() {
        let text = r#"{"operations": {"Op": {"style": "documentLiteral", "input": {
            "qname": {"name": "Wrapper"},
            "typeDescriptor": {"elements": [{"qname": {"name": "inner"}, "__id": ":e:3"}], "__id": ":t:2"},
            "elements": [":e:3"],
            "__id": ":e:1"}}}}"#;
        let restored = restore(text).unwrap();
        let graph = &restored.graph;
        let input = graph.element(restored.operations["Op"].input.unwrap()).unwrap();

        let ty = input.type_descriptor.unwrap();
        assert_eq!(input.elements, graph.get(ty).elements());
        let inner = graph.element(input.elements[0]).unwrap();
        assert_eq!(inner.qname.name, "inner");
    }

    #[test]
    fn test_restore_operation_keys_in_text_order() {
        let text = r#"{"operations": {"Op": {"style": "documentLiteral",
            "output": {"qname": {"name": "Shared"}, "__id": ":e:1"},
            "input": ":e:1"}}}"#;
        let restored = restore(text).unwrap();
        let op = &restored.operations["Op"];
        assert_eq!(op.input, op.output);
    }

    #[test]
    fn test_restore_index_keyed_faults() {
        let text = r#"{"operations": {"Op": {"style": "documentLiteral",
            "input": {"qname": {"name": "Request"}, "__id": ":e:1"},
            "faults": {
                "0": {"qname": {"name": "Overflow"}, "__id": ":e:2"},
                "1": ":e:1"
            }}}}"#;
        let restored = restore(text).unwrap();
        let graph = &restored.graph;
        let op = &restored.operations["Op"];

        let names: Vec<&str> = op
            .faults
            .iter()
            .map(|id| graph.element(*id).unwrap().qname.name.as_str())
            .collect();
        assert_eq!(names, vec!["Overflow", "Request"]);
        assert_eq!(op.faults[1], op.input.unwrap());

        let fault_body = crate::envelope::envelope_body(graph, op.fault_envelope).unwrap();
        let fault = graph.get(fault_body).elements()[0];
        let detail = graph.get(fault).elements()[4];
        assert_eq!(graph.get(detail).elements(), op.faults.as_slice());
    }

    #[test]
    fn test_malformed_records_fail() {
        let no_tag = r#"{"operations": {"Op": {"style": "documentLiteral", "input": {"qname": {"name": "x"}}}}}"#;
        assert!(matches!(restore(no_tag), Err(CompilerError::MalformedDump(_))));

        let bad_style = r#"{"operations": {"Op": {"style": "rpc"}}}"#;
        assert!(matches!(restore(bad_style), Err(CompilerError::MalformedDump(_))));

        let bad_marker = r#"{"operations": {"Op": {"style": "documentLiteral",
            "input": {"qname": {"name": "x"}, "jsType": ":Int:", "__id": ":e:1"}}}}"#;
        assert!(matches!(restore(bad_marker), Err(CompilerError::MalformedDump(_))));
    }

    #[test]
    fn test_restored_envelopes_wrap_parameters() {
        let (graph, root) = recursive_graph();
        let descriptors = service(graph, vec![("Walk", Some(root), None, vec![root])]);
        let restored = restore(&dump(&descriptors).unwrap()).unwrap();
        let op = &restored.operations["Walk"];

        let body = crate::envelope::envelope_body(&restored.graph, op.input_envelope).unwrap();
        assert_eq!(restored.graph.get(body).elements(), &[op.input.unwrap()]);

        let fault_body = crate::envelope::envelope_body(&restored.graph, op.fault_envelope).unwrap();
        let fault = restored.graph.get(fault_body).elements()[0];
        let detail = restored.graph.get(fault).elements()[4];
        assert_eq!(restored.graph.get(detail).elements(), op.faults.as_slice());
    }
}
