//! WSDL descriptors - Compile SOAP 1.2 service descriptions into resolved,
//! serializable operation descriptors.
//!
//! This crate loads a WSDL 1.1 document together with every schema it
//! includes or imports, resolves the (possibly recursive) type graph into
//! descriptors, classifies each bound operation, builds its envelopes and
//! persists the result in a cycle-safe, tab-indented JSON form.
//!
//! # Example
//!
//! ```
//! use wsdl_descriptors::config;
//!
//! // Reference tags carry a kind prefix and a positive counter
//! assert!(config::validate_reference_tag(":e:1").is_ok());
//! assert!(config::validate_reference_tag(":x:1").is_err());
//! ```
//!
//! # Architecture
//!
//! The compiler is organized into several modules:
//!
//! - [`config`]: Protocol constants, codec constants and compile options
//! - [`error`]: Error types and Result alias
//! - [`qname`]: Qualified names
//! - [`registry`]: Namespace-aware element registry
//! - [`xml`]: Element tree, event-driven parser and markup rendering
//! - [`xsd`]: Raw schema model with merge and rehome
//! - [`wsdl`]: Raw service model and post-processing
//! - [`loader`]: Include/import closure loading
//! - [`descriptor`]: Descriptor arena
//! - [`resolve`]: Two-phase type resolution
//! - [`operation`]: Style resolution and operation describing
//! - [`envelope`]: Envelope descriptors
//! - [`codec`]: Persisted form (dump and restore)
//! - [`cli`]: Command-line interface
//! - [`compiler`]: Main compiler service

pub mod cli;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod loader;
pub mod operation;
pub mod qname;
pub mod registry;
pub mod resolve;
pub mod wsdl;
pub mod xml;
pub mod xsd;

// Re-export main functions
pub use codec::{dump, restore};
pub use compiler::{compile, describe_definitions, load_descriptors};
pub use loader::load_document;

// Re-export commonly used items
pub use config::CompileOptions;
pub use descriptor::{DescriptorGraph, DescriptorId, JsType};
pub use error::{CompilerError, Result};
pub use operation::{OperationDescriptor, ServiceDescriptors, Style};
pub use qname::QName;
