use serde::Deserialize;
use serde_yaml::{Deserializer, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::model::manifest::{ByteSpan, Manifest, ManifestMeta};
use crate::model::result::{Stage, Warning};

#[derive(Debug, Clone)]
pub struct PlainOptions {
    pub include_metadata: bool,
    pub validate_output: bool,
    /// Name of the originating chart template, when rendered through the
    /// Chart renderer; `None` for a bare plain-YAML source.
    pub template_name: Option<String>,
}

impl Default for PlainOptions {
    fn default() -> PlainOptions {
        PlainOptions { include_metadata: true, validate_output: false, template_name: None }
    }
}

/// Parses every YAML document in `bytes`, attaching `{template, docNum}`
/// metadata where requested. A document missing `kind`/`apiVersion` is
/// dropped with a warning unless `validate_output` is set, in which case it
/// fails the whole render.
pub fn render(
    bytes: &[u8],
    source_label: &str,
    opts: &PlainOptions,
) -> Result<(Vec<Manifest>, Vec<Warning>)> {
    let text = String::from_utf8_lossy(bytes);
    let mut manifests = Vec::new();
    let mut warnings = Vec::new();

    for (doc_num, de) in Deserializer::from_str(&text).enumerate() {
        let value = match Value::deserialize(de) {
            Ok(v) => v,
            Err(e) => {
                if opts.validate_output {
                    return Err(Error::from(ErrorKind::RenderFailed(
                        source_label.to_string(),
                        e.to_string(),
                    ))
                    .into());
                }
                warnings.push(Warning::new(
                    Stage::Render,
                    format!("document {} in '{}' failed to parse: {}", doc_num, source_label, e),
                ));
                continue;
            }
        };

        if value.is_null() {
            continue;
        }

        let meta = ManifestMeta {
            template: if opts.include_metadata { opts.template_name.clone() } else { None },
            doc_num,
        };

        match Manifest::from_document(value, ByteSpan { start: 0, end: 0 }, meta) {
            Some(manifest) => manifests.push(manifest),
            None => {
                let message = format!(
                    "document {} in '{}' is missing kind/apiVersion/metadata.name",
                    doc_num, source_label
                );
                if opts.validate_output {
                    return Err(ErrorKind::RenderFailed(source_label.to_string(), message).into());
                }
                warnings.push(Warning::new(Stage::Render, message));
            }
        }
    }

    Ok((manifests, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_documents_in_order() {
        let doc = "kind: ServiceAccount\napiVersion: v1\nmetadata:\n  name: a\n---\nkind: Role\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: b\n";
        let (manifests, warnings) = render(doc.as_bytes(), "test", &PlainOptions::default()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].name, "a");
        assert_eq!(manifests[1].name, "b");
        assert_eq!(manifests[0].meta.doc_num, 0);
        assert_eq!(manifests[1].meta.doc_num, 1);
    }

    #[test]
    fn drops_malformed_document_with_warning_when_not_strict() {
        let doc = "name: missing-kind-and-apiversion\n---\nkind: Role\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: ok\n";
        let (manifests, warnings) = render(doc.as_bytes(), "test", &PlainOptions::default()).unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, Stage::Render);
    }

    #[test]
    fn strict_validation_fails_on_malformed_document() {
        let doc = "name: missing-kind-and-apiversion\n";
        let opts = PlainOptions { validate_output: true, ..PlainOptions::default() };
        let err = render(doc.as_bytes(), "test", &opts).unwrap_err();
        assert!(err.to_string().contains("missing kind/apiVersion"));
    }
}
