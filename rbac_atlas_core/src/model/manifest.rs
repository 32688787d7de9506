use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, Result};
use super::workload::WorkloadType;

/// The byte range of a manifest document in its originating source, kept
/// around purely so error/warning messages can point at something concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

/// Tagged dispatch for the `kind` field of a manifest.
///
/// Extractors pattern-match on this rather than comparing raw strings;
/// unknown kinds become `Other` and are silently ignored by every extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestKind {
    ServiceAccount,
    Role,
    ClusterRole,
    RoleBinding,
    ClusterRoleBinding,
    Workload(WorkloadType),
    Other(String),
}

impl ManifestKind {
    pub fn from_str(kind: &str) -> ManifestKind {
        match kind {
            "ServiceAccount" => ManifestKind::ServiceAccount,
            "Role" => ManifestKind::Role,
            "ClusterRole" => ManifestKind::ClusterRole,
            "RoleBinding" => ManifestKind::RoleBinding,
            "ClusterRoleBinding" => ManifestKind::ClusterRoleBinding,
            other => match WorkloadType::from_kind_str(other) {
                Some(wt) => ManifestKind::Workload(wt),
                None => ManifestKind::Other(other.to_string()),
            },
        }
    }

    pub fn as_workload_type(&self) -> Option<WorkloadType> {
        match self {
            ManifestKind::Workload(wt) => Some(*wt),
            _ => None,
        }
    }
}

/// Per-manifest provenance, attached by a renderer when it's available.
///
/// `template` is the template/file path a chart or kustomize renderer
/// rendered this document from; `doc_num` is the zero-based index of the
/// document within its originating multi-document YAML stream.
#[derive(Debug, Clone, Default)]
pub struct ManifestMeta {
    pub template: Option<String>,
    pub doc_num: usize,
}

/// A parsed Kubernetes object, kind-specific body left as a raw
/// [`serde_yaml::Value`] until an extractor asks to interpret it.
///
/// Lifetime: created by a renderer, consumed by extractors, then discarded.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub api_version: String,
    pub kind: ManifestKind,
    pub name: String,
    pub namespace: Option<String>,
    pub body: serde_yaml::Value,
    pub span: ByteSpan,
    pub meta: ManifestMeta,
}

impl Manifest {
    /// Deserialize the kind-specific body into `T`.
    ///
    /// Extractors call this and turn a failure into a per-manifest warning
    /// rather than aborting extraction.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T> {
        serde_yaml::from_value(self.body.clone()).map_err(|e| {
            ErrorKind::ExtractionFailed(
                format!("{}/{}", self.namespace.clone().unwrap_or_default(), self.name),
                e.to_string(),
            )
            .into()
        })
    }

    /// Build a `Manifest` from a single parsed YAML document.
    ///
    /// Returns `None` (never an error on its own) when the document lacks
    /// `kind`/`apiVersion` — renderers decide whether that's fatal
    /// (strict validation) or a dropped-with-warning document.
    pub fn from_document(doc: serde_yaml::Value, span: ByteSpan, meta: ManifestMeta) -> Option<Manifest> {
        let kind = doc.get("kind")?.as_str()?.to_string();
        let api_version = doc.get("apiVersion")?.as_str()?.to_string();
        let metadata = doc.get("metadata")?;
        let name = metadata.get("name")?.as_str()?.to_string();
        let namespace = metadata
            .get("namespace")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Some(Manifest {
            api_version,
            kind: ManifestKind::from_str(&kind),
            name,
            namespace,
            body: doc,
            span,
            meta,
        })
    }
}
