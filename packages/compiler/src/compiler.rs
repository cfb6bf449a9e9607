//! Main compiler service that ties all components together.

use std::path::Path;

use indexmap::IndexMap;

use crate::codec::dump;
use crate::config::CompileOptions;
use crate::error::Result;
use crate::loader::load_document;
use crate::operation::{OperationDescriber, ServiceDescriptors};
use crate::resolve::TypeResolver;
use crate::wsdl::Definitions;

/// Load a service description and describe every bound operation.
///
/// # Arguments
/// * `uri` - Root document, relative to `base_dir`
/// * `base_dir` - Directory relative includes are resolved against
///
/// # Returns
/// The operations of all bindings, keyed by operation name, sharing one
/// descriptor graph.
pub async fn load_descriptors(uri: &str, base_dir: &Path) -> Result<ServiceDescriptors> {
    let defs = load_document(uri, base_dir).await?;
    describe_definitions(&defs)
}

/// Describe every bound operation of already loaded definitions.
///
/// Types are resolved first, all shells before any children; operations
/// are then described binding by binding. An operation name bound twice
/// keeps the description of the last binding.
pub fn describe_definitions(defs: &Definitions) -> Result<ServiceDescriptors> {
    let resolver = TypeResolver::resolve(defs)?;
    let mut describer = OperationDescriber::new(resolver);

    let mut operations = IndexMap::new();
    for binding in defs.bindings.values() {
        for op in binding.operations.values() {
            let descriptor = describer.describe(binding, op)?;
            if operations.insert(op.name.clone(), descriptor).is_some() {
                tracing::debug!(operation = %op.name, binding = %binding.name, "Operation rebound");
            }
        }
    }

    Ok(ServiceDescriptors {
        xmlns: defs.xmlns.clone(),
        operations,
        graph: describer.into_graph(),
    })
}

/// Compile a service description into its persisted form.
///
/// With `options.module` set the dump is wrapped as
/// `module.exports = <dump>;`. When `options.output` is set the text is also
/// written there.
pub async fn compile(options: &CompileOptions) -> Result<String> {
    let descriptors = load_descriptors(&options.document, &options.base_dir).await?;
    let text = dump(&descriptors)?;
    let text = if options.module {
        format!("module.exports = {text};")
    } else {
        text
    };

    if let Some(output) = &options.output {
        tokio::fs::write(output, &text).await?;
        tracing::info!(output = %output.display(), bytes = text.len(), "Wrote descriptors");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::restore;
    use crate::error::CompilerError;
    use crate::operation::Style;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const CALC: &str = r#"<definitions xmlns="http://schemas.xmlsoap.org/wsdl/"
        xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap12/"
        xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:calc" targetNamespace="urn:calc" name="Calc">
      <types>
        <xs:schema targetNamespace="urn:calc" elementFormDefault="qualified">
          <xs:element name="Add">
            <xs:complexType>
              <xs:sequence>
                <xs:element name="a" type="xs:int"/>
                <xs:element name="b" type="xs:int"/>
              </xs:sequence>
            </xs:complexType>
          </xs:element>
          <xs:element name="AddResponse">
            <xs:complexType>
              <xs:sequence><xs:element name="sum" type="xs:int"/></xs:sequence>
            </xs:complexType>
          </xs:element>
        </xs:schema>
      </types>
      <message name="AddIn"><part name="p" element="tns:Add"/></message>
      <message name="AddOut"><part name="p" element="tns:AddResponse"/></message>
      <portType name="CalcPort">
        <operation name="Add"><input message="tns:AddIn"/><output message="tns:AddOut"/></operation>
      </portType>
      <binding name="CalcBinding" type="tns:CalcPort">
        <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        <operation name="Add">
          <soap:operation soapAction="urn:calc#Add"/>
          <input><soap:body use="literal"/></input>
          <output><soap:body use="literal"/></output>
        </operation>
      </binding>
    </definitions>"#;

    fn calc_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("calc.wsdl"), CALC).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_descriptors() {
        let dir = calc_dir();
        let descriptors = load_descriptors("calc.wsdl", dir.path()).await.unwrap();

        let add = &descriptors.operations["Add"];
        assert_eq!(add.style, Style::DocumentLiteralWrapped);
        assert_eq!(add.soap_action, "urn:calc#Add");
        let input = descriptors.graph.element(add.input.unwrap()).unwrap();
        assert_eq!(input.qname.name, "Add");
        assert_eq!(descriptors.xmlns["tns"], "urn:calc");
    }

    #[tokio::test]
    async fn test_compile_module_output() {
        let dir = calc_dir();
        let output = dir.path().join("calc.js");
        let options = CompileOptions::new("calc.wsdl", dir.path())
            .with_output(output.clone())
            .with_module(true);

        let text = compile(&options).await.unwrap();
        assert!(text.starts_with("module.exports = {"));
        assert!(text.ends_with("};"));
        assert_eq!(fs::read_to_string(&output).unwrap(), text);

        let json = text
            .trim_start_matches("module.exports = ")
            .trim_end_matches(';');
        let restored = restore(json).unwrap();
        assert_eq!(restored.operations.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_soap_action_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("calc.wsdl"),
            CALC.replace(r#"soapAction="urn:calc#Add""#, ""),
        )
        .unwrap();

        let err = load_descriptors("calc.wsdl", dir.path()).await.unwrap_err();
        assert!(matches!(err, CompilerError::SchemaViolation(_)));
        assert_eq!(err.to_string(), "missing soapAction for operation 'Add'");
    }
}
