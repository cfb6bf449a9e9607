//! Configuration constants and validation functions for the compiler.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{CompilerError, Result};

/// WSDL 1.1 service description namespace.
pub const WSDL_NS: &str = "http://schemas.xmlsoap.org/wsdl/";

/// XML Schema namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// SOAP 1.1 binding namespace (rejected).
pub const SOAP11_BINDING_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";

/// SOAP 1.2 binding namespace.
pub const SOAP12_BINDING_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";

/// SOAP 1.2 envelope namespace used by every generated envelope.
pub const ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Prefix attached to envelope element names.
pub const ENVELOPE_PREFIX: &str = "soap";

/// Sentinel for the numeric primitive marker.
pub const NUMBER_SENTINEL: &str = ":Number:";

/// Sentinel for the string primitive marker.
pub const STRING_SENTINEL: &str = ":String:";

/// Sentinel for the boolean primitive marker.
pub const BOOLEAN_SENTINEL: &str = ":Boolean:";

/// Sentinel for the date primitive marker.
pub const DATE_SENTINEL: &str = ":Date:";

/// Tag prefix for attribute descriptors.
pub const ATTRIBUTE_TAG: &str = ":a:";

/// Tag prefix for element descriptors.
pub const ELEMENT_TAG: &str = ":e:";

/// Tag prefix for type descriptors.
pub const TYPE_TAG: &str = ":t:";

/// Record key carrying a descriptor's tag in the persisted form.
pub const IDENTITY_KEY: &str = "__id";

/// Reference tag pattern: a kind prefix followed by a positive counter.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REFERENCE_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[aet]:[1-9]\d*$").expect("valid regex"));

/// Check whether a string starts with one of the three tag prefixes.
///
/// # Examples
/// ```
/// use wsdl_descriptors::config::is_tagged;
///
/// assert!(is_tagged(":e:12"));
/// assert!(!is_tagged(":Number:"));
/// ```
pub fn is_tagged(value: &str) -> bool {
    value.starts_with(ATTRIBUTE_TAG) || value.starts_with(ELEMENT_TAG) || value.starts_with(TYPE_TAG)
}

/// Validate a reference tag.
///
/// # Returns
/// * `Ok(())` if the tag has a known prefix and a positive counter
/// * `Err(CompilerError::MalformedDump)` otherwise
///
/// # Examples
/// ```
/// use wsdl_descriptors::config::validate_reference_tag;
///
/// assert!(validate_reference_tag(":t:1").is_ok());
/// assert!(validate_reference_tag(":t:0").is_err());
/// assert!(validate_reference_tag(":x:3").is_err());
/// ```
pub fn validate_reference_tag(tag: &str) -> Result<()> {
    if REFERENCE_TAG_PATTERN.is_match(tag) {
        Ok(())
    } else {
        Err(CompilerError::MalformedDump(format!(
            "invalid reference tag '{tag}'"
        )))
    }
}

/// Options for one compile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Root document, relative to `base_dir`.
    pub document: String,

    /// Directory the root document and its relative includes resolve against.
    pub base_dir: PathBuf,

    /// Where to write the dump; stdout when absent.
    pub output: Option<PathBuf>,

    /// Wrap the dump as `module.exports = <dump>;`.
    pub module: bool,
}

impl CompileOptions {
    /// Create options for a document inside a base directory.
    #[must_use]
    pub fn new(document: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            base_dir: base_dir.into(),
            output: None,
            module: false,
        }
    }

    /// Split a document path into its file name and parent directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let document = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CompilerError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Not a document path: {}", path.display()),
                ))
            })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self::new(document, base_dir))
    }

    /// Override the base directory.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the output file.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Enable module wrapping of the dump.
    #[must_use]
    pub fn with_module(mut self, module: bool) -> Self {
        self.module = module;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reference_tag() {
        assert!(validate_reference_tag(":a:1").is_ok());
        assert!(validate_reference_tag(":e:42").is_ok());
        assert!(validate_reference_tag(":t:").is_err());
        assert!(validate_reference_tag("e:1").is_err());
    }

    #[test]
    fn test_is_tagged() {
        assert!(is_tagged(":a:3"));
        assert!(is_tagged(":t:9"));
        assert!(!is_tagged(":String:"));
        assert!(!is_tagged("plain"));
    }

    #[test]
    fn test_options_from_path() {
        let opts = CompileOptions::from_path(Path::new("/srv/wsdl/service.wsdl")).unwrap();
        assert_eq!(opts.document, "service.wsdl");
        assert_eq!(opts.base_dir, PathBuf::from("/srv/wsdl"));
        assert!(opts.output.is_none());
        assert!(!opts.module);
    }

    #[test]
    fn test_options_builders() {
        let opts = CompileOptions::new("a.wsdl", ".")
            .with_base_dir("/tmp")
            .with_output("out.json")
            .with_module(true);
        assert_eq!(opts.base_dir, PathBuf::from("/tmp"));
        assert_eq!(opts.output, Some(PathBuf::from("out.json")));
        assert!(opts.module);
    }
}
