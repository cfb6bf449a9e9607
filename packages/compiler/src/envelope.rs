//! Envelope descriptors wrapping an operation's parameters.

use crate::config::{ENVELOPE_NS, ENVELOPE_PREFIX};
use crate::descriptor::{Descriptor, DescriptorGraph, DescriptorId, ElementDescriptor, TypeDescriptor};
use crate::qname::QName;

/// What goes into the envelope body.
#[derive(Debug, Clone, Copy)]
pub enum EnvelopePayload<'a> {
    /// Request or response parameters; an empty body when `None`.
    Message(Option<DescriptorId>),
    /// Declared fault details, in declaration order.
    Faults(&'a [DescriptorId]),
}

fn envelope_element(graph: &mut DescriptorGraph, name: &str) -> DescriptorId {
    graph.add(Descriptor::Element(ElementDescriptor::new(
        QName::new(Some(ENVELOPE_NS), name).with_prefix(Some(ENVELOPE_PREFIX)),
    )))
}

fn nested(graph: &mut DescriptorGraph, parent: DescriptorId, name: &str) -> DescriptorId {
    let child = envelope_element(graph, name);
    graph.add_child(parent, child);
    child
}

/// Build a fresh `Envelope > (Header, Body)` structure.
///
/// Message payloads go straight under `Body` (a type descriptor payload has
/// its children spliced in). A fault payload always gets the
/// `Fault > (Code, Reason, Node, Role, Detail)` skeleton, with each declared
/// fault attached under `Detail`.
///
/// # Returns
/// Id of a new type descriptor holding the `Envelope` element. Nothing in
/// the returned structure is shared with any other envelope.
pub fn build_envelope(graph: &mut DescriptorGraph, payload: EnvelopePayload<'_>) -> DescriptorId {
    let root = graph.add(Descriptor::Type(TypeDescriptor::default()));
    let envelope = nested(graph, root, "Envelope");
    nested(graph, envelope, "Header");
    let body = nested(graph, envelope, "Body");

    match payload {
        EnvelopePayload::Message(Some(parameters)) => graph.add_child(body, parameters),
        EnvelopePayload::Message(None) => {}
        EnvelopePayload::Faults(faults) => {
            let fault = nested(graph, body, "Fault");
            let code = nested(graph, fault, "Code");
            nested(graph, code, "Value");
            let subcode = nested(graph, code, "Subcode");
            nested(graph, subcode, "Value");
            let reason = nested(graph, fault, "Reason");
            nested(graph, reason, "Text");
            nested(graph, fault, "Node");
            nested(graph, fault, "Role");
            let detail = nested(graph, fault, "Detail");
            for f in faults {
                graph.add_child(detail, *f);
            }
        }
    }

    root
}

/// Find the `Body` element of an envelope built by [`build_envelope`].
#[must_use]
pub fn envelope_body(graph: &DescriptorGraph, envelope: DescriptorId) -> Option<DescriptorId> {
    let outer = *graph.get(envelope).elements().first()?;
    graph
        .get(outer)
        .elements()
        .iter()
        .copied()
        .find(|id| graph.element(*id).is_some_and(|e| e.qname.name == "Body"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(graph: &DescriptorGraph, id: DescriptorId) -> Vec<String> {
        graph
            .get(id)
            .elements()
            .iter()
            .map(|e| graph.element(*e).unwrap().qname.name.clone())
            .collect()
    }

    fn param(graph: &mut DescriptorGraph, name: &str) -> DescriptorId {
        graph.add(Descriptor::Element(ElementDescriptor::new(QName::new(
            Some("urn:calc"),
            name,
        ))))
    }

    #[test]
    fn test_message_envelope() {
        let mut graph = DescriptorGraph::new();
        let add = param(&mut graph, "Add");
        let env = build_envelope(&mut graph, EnvelopePayload::Message(Some(add)));

        let outer = graph.get(env).elements()[0];
        let envelope = graph.element(outer).unwrap();
        assert_eq!(envelope.qname.ns(), Some(ENVELOPE_NS));
        assert_eq!(envelope.qname.prefix.as_deref(), Some("soap"));
        assert_eq!(names(&graph, outer), vec!["Header", "Body"]);

        let body = envelope_body(&graph, env).unwrap();
        assert_eq!(graph.get(body).elements(), &[add]);
    }

    #[test]
    fn test_type_payload_is_spliced() {
        let mut graph = DescriptorGraph::new();
        let a = param(&mut graph, "A");
        let b = param(&mut graph, "B");
        let ty = graph.add(Descriptor::Type(TypeDescriptor {
            elements: vec![a, b],
            ..TypeDescriptor::default()
        }));
        let env = build_envelope(&mut graph, EnvelopePayload::Message(Some(ty)));
        let body = envelope_body(&graph, env).unwrap();
        assert_eq!(graph.get(body).elements(), &[a, b]);
    }

    #[test]
    fn test_fault_envelope_detail_order() {
        let mut graph = DescriptorGraph::new();
        let first = param(&mut graph, "FirstFault");
        let second = param(&mut graph, "SecondFault");
        let env = build_envelope(&mut graph, EnvelopePayload::Faults(&[first, second]));

        let body = envelope_body(&graph, env).unwrap();
        assert_eq!(names(&graph, body), vec!["Fault"]);
        let fault = graph.get(body).elements()[0];
        assert_eq!(
            names(&graph, fault),
            vec!["Code", "Reason", "Node", "Role", "Detail"]
        );
        let code = graph.get(fault).elements()[0];
        assert_eq!(names(&graph, code), vec!["Value", "Subcode"]);
        let detail = graph.get(fault).elements()[4];
        assert_eq!(graph.get(detail).elements(), &[first, second]);
    }

    #[test]
    fn test_envelopes_are_not_shared() {
        let mut graph = DescriptorGraph::new();
        let a = build_envelope(&mut graph, EnvelopePayload::Message(None));
        let b = build_envelope(&mut graph, EnvelopePayload::Message(None));
        assert_ne!(envelope_body(&graph, a), envelope_body(&graph, b));
        assert!(graph.isomorphic(a, &graph.clone(), b));
    }
}
