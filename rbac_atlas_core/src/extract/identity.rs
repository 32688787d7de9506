use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::model::manifest::{Manifest, ManifestKind};
use crate::model::result::{Stage, Warning};
use crate::model::Identity;

/// Kubernetes DNS-1123 label shape.
static DNS_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 253 && DNS_LABEL.is_match(name)
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ServiceAccountBody {
    #[serde(default)]
    automount_service_account_token: Option<bool>,
    #[serde(default)]
    secrets: Vec<NamedRef>,
    #[serde(default)]
    image_pull_secrets: Vec<NamedRef>,
}

/// Consumes every `ServiceAccount` manifest, keyed by `(name, namespace)`.
pub fn extract(manifests: &[Manifest]) -> (Vec<Identity>, Vec<Warning>) {
    let mut identities = Vec::new();
    let mut warnings = Vec::new();

    for manifest in manifests {
        if manifest.kind != ManifestKind::ServiceAccount {
            continue;
        }
        if !is_valid_name(&manifest.name) {
            warnings.push(Warning::new(
                Stage::Extract,
                format!("ServiceAccount name '{}' is not a valid DNS-1123 label", manifest.name),
            ));
        }

        match manifest.parse_body::<ServiceAccountBody>() {
            Ok(body) => identities.push(Identity {
                name: manifest.name.clone(),
                namespace: manifest.namespace.clone().unwrap_or_default(),
                automount_token: body.automount_service_account_token.unwrap_or(true),
                secrets: body.secrets.into_iter().map(|s| s.name).collect(),
                image_pull_secrets: body.image_pull_secrets.into_iter().map(|s| s.name).collect(),
                synthetic: false,
            }),
            Err(e) => warnings.push(Warning::new(
                Stage::Extract,
                format!(
                    "ServiceAccount {}/{}: {}",
                    manifest.namespace.clone().unwrap_or_default(),
                    manifest.name,
                    e
                ),
            )),
        }
    }

    (identities, warnings)
}
