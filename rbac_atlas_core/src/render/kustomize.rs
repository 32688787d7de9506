use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::model::manifest::Manifest;
use crate::model::result::{Stage, Warning};

use super::plain::{self, PlainOptions};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct KustomizationFile {
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    name_prefix: String,
    #[serde(default)]
    name_suffix: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    common_labels: BTreeMap<String, String>,
    #[serde(default)]
    patches_strategic_merge: Vec<String>,
    #[serde(default)]
    config_map_generator: Vec<Value>,
    #[serde(default)]
    secret_generator: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct KustomizeOptions {
    pub include_metadata: bool,
    pub validate_output: bool,
}

/// Renders a Kustomize directory: parses `resources:` (relative paths only
/// — remote bases are unsupported and skipped with a warning), then applies
/// `namePrefix`/`nameSuffix`/`namespace`/`commonLabels`. `patchesStrategicMerge`
/// and the generators are unsupported; each produces a warning rather than a
/// failure.
pub fn render(root: &Path, opts: &KustomizeOptions) -> Result<(Vec<Manifest>, Vec<Warning>)> {
    let kustomization_path = root.join("kustomization.yaml");
    let raw = fs::read_to_string(&kustomization_path).map_err(|e| {
        Error::from(ErrorKind::IoError(kustomization_path.display().to_string(), e.to_string()))
    })?;
    let kustomization: KustomizationFile = serde_yaml::from_str(&raw).map_err(|e| {
        Error::from(ErrorKind::InvalidYaml(kustomization_path.display().to_string(), e.to_string()))
    })?;

    let mut resources = kustomization.resources.clone();
    resources.sort();

    let mut manifests = Vec::new();
    let mut warnings = Vec::new();

    for resource in &resources {
        let resource_path = root.join(resource);
        if !resource_path.is_file() {
            warnings.push(Warning::new(
                Stage::Render,
                format!("kustomize resource '{}' not found or remote, skipped", resource),
            ));
            continue;
        }
        let bytes = fs::read(&resource_path).map_err(|e| {
            Error::from(ErrorKind::IoError(resource_path.display().to_string(), e.to_string()))
        })?;
        let plain_opts = PlainOptions {
            include_metadata: opts.include_metadata,
            validate_output: opts.validate_output,
            template_name: None,
        };
        let (docs, mut doc_warnings) =
            plain::render(&bytes, &resource_path.display().to_string(), &plain_opts)?;
        manifests.extend(docs);
        warnings.append(&mut doc_warnings);
    }

    for feature in &kustomization.patches_strategic_merge {
        warnings.push(Warning::new(
            Stage::Render,
            format!("patchesStrategicMerge '{}' is unsupported, skipped", feature),
        ));
    }
    if !kustomization.config_map_generator.is_empty() {
        warnings.push(Warning::new(Stage::Render, "configMapGenerator is unsupported, skipped".to_string()));
    }
    if !kustomization.secret_generator.is_empty() {
        warnings.push(Warning::new(Stage::Render, "secretGenerator is unsupported, skipped".to_string()));
    }

    for manifest in manifests.iter_mut() {
        apply_transforms(manifest, &kustomization);
    }

    Ok((manifests, warnings))
}

fn apply_transforms(manifest: &mut Manifest, k: &KustomizationFile) {
    let renamed = !k.name_prefix.is_empty() || !k.name_suffix.is_empty();
    if renamed {
        manifest.name = format!("{}{}{}", k.name_prefix, manifest.name, k.name_suffix);
    }
    if let Some(ns) = &k.namespace {
        manifest.namespace = Some(ns.clone());
    }

    if let Value::Mapping(root_map) = &mut manifest.body {
        let metadata_key = Value::String("metadata".to_string());
        if !root_map.contains_key(&metadata_key) {
            root_map.insert(metadata_key.clone(), Value::Mapping(Mapping::new()));
        }
        if let Some(Value::Mapping(meta_map)) = root_map.get_mut(&metadata_key) {
            if renamed {
                meta_map.insert(Value::String("name".to_string()), Value::String(manifest.name.clone()));
            }
            if let Some(ns) = &k.namespace {
                meta_map.insert(Value::String("namespace".to_string()), Value::String(ns.clone()));
            }
            if !k.common_labels.is_empty() {
                let labels_key = Value::String("labels".to_string());
                if !meta_map.contains_key(&labels_key) {
                    meta_map.insert(labels_key.clone(), Value::Mapping(Mapping::new()));
                }
                if let Some(Value::Mapping(labels_map)) = meta_map.get_mut(&labels_key) {
                    for (label_key, label_value) in &k.common_labels {
                        labels_map.insert(Value::String(label_key.clone()), Value::String(label_value.clone()));
                    }
                }
            }
        }
    }
}
