//! Raw schema model: declarations, directives and merge semantics.

mod builder;
mod model;
mod schema;

pub use builder::{build_schema, max_occurs_many};
pub use model::{
    AttributeDecl, AttributeGroup, AttributeItem, ComplexType, Compositor, Directive,
    DirectiveKind, ElementDecl, Form, InlineType, ModelGroup, Particle, SimpleType,
    SimpleVariety,
};
pub use schema::Schema;
