//! Raw service description model and post-processing.

mod builder;
mod definitions;
mod model;

pub use builder::build_definitions;
pub use definitions::Definitions;
pub use model::{
    Binding, BindingFault, BindingMessage, Message, Operation, Part, Port, PortType,
    PortTypeFault, PortTypeOperation, Service, Use,
};
