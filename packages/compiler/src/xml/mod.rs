//! XML element tree, event-driven parser and markup rendering.

mod markup;
mod node;
mod parser;

pub use markup::{documentation_of, render_children, render_markup};
pub use node::{Document, Node, NodeId};
pub use parser::{parse_document, DocumentParser, OpenTag};
