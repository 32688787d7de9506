use serde::Serialize;

/// A service account identity, keyed by `(name, namespace)`.
///
/// Created by the Identity extractor from `ServiceAccount` manifests; if a
/// workload references an undeclared service account, a synthetic
/// `Identity::synthetic` is created on first reference.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub name: String,
    pub namespace: String,
    pub automount_token: bool,
    pub secrets: Vec<String>,
    pub image_pull_secrets: Vec<String>,
    #[serde(skip)]
    pub synthetic: bool,
}

impl Identity {
    /// A default-attribute identity created because a workload referenced
    /// a service account with no matching `ServiceAccount` manifest.
    pub fn synthetic(name: &str, namespace: &str) -> Identity {
        Identity {
            name: name.to_string(),
            namespace: namespace.to_string(),
            automount_token: true,
            secrets: Vec::new(),
            image_pull_secrets: Vec::new(),
            synthetic: true,
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.namespace.clone())
    }
}
