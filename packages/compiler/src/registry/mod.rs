//! Element registry system for namespace-aware XML parsing.
//!
//! Every parsed element is mapped to a [`NodeKind`] keyed by its namespace
//! and local name, with an ordered fallback chain: exact registration, then a
//! namespace-generic kind, then passthrough markup.

mod config;
mod core;
mod types;

pub use config::create_wsdl_registry;
pub use core::ElementRegistry;
pub use types::NodeKind;
