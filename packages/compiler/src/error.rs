//! Error types for the descriptor compiler.
//!
//! Every failure is fatal to the immediate caller: there is no local recovery
//! and partial state is never handed out as if it were complete.

use thiserror::Error;

/// Main error type for the compiler library.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// Malformed tag nesting, unmatched close tag or unrecognized root element.
    #[error("Parse error: {message}")]
    StructuralParse { message: String },

    /// Low-level XML reader failure.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Protocol version or binding style this compiler refuses to handle.
    #[error("{0}")]
    UnsupportedProtocol(String),

    /// The document is well-formed but violates a rule the descriptors depend on.
    #[error("{0}")]
    SchemaViolation(String),

    /// A dump references a tag that was never defined.
    #[error("cannot resolve {0}")]
    ReferenceResolution(String),

    /// The persisted form does not have the expected shape.
    #[error("Malformed dump: {0}")]
    MalformedDump(String),

    /// Loading an include/import target failed.
    #[error("Failed to load '{location}': {source}")]
    IncludeLoad {
        location: String,
        #[source]
        source: Box<CompilerError>,
    },

    /// The root document is not a service description.
    #[error("{0} is not a wsdl definitions document")]
    NotDefinitions(String),

    /// Two merged schemas declare the same qualified name.
    #[error("Duplicate {kind} definition: {name}")]
    DuplicateDefinition { kind: &'static str, name: String },

    /// A named message, port type, type or element could not be found.
    #[error("Unresolved {kind}: {name}")]
    UnresolvedReference { kind: &'static str, name: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompilerError {
    /// Shorthand for a structural parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::StructuralParse {
            message: message.into(),
        }
    }

    /// Shorthand for an unresolved named reference.
    pub fn unresolved(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }
}

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompilerError::ReferenceResolution(":e:7".to_string());
        assert_eq!(err.to_string(), "cannot resolve :e:7");
    }

    #[test]
    fn test_unsupported_protocol_is_verbatim() {
        let err = CompilerError::UnsupportedProtocol("only soap 1.2 supported".to_string());
        assert_eq!(err.to_string(), "only soap 1.2 supported");
    }

    #[test]
    fn test_include_load_wraps_source() {
        let err = CompilerError::IncludeLoad {
            location: "c.xsd".to_string(),
            source: Box::new(CompilerError::parse("Unmatched close tag: a")),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load 'c.xsd': Parse error: Unmatched close tag: a"
        );
    }
}
