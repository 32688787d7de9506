use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tera::Tera;

use crate::error::{Error, ErrorKind, Result};
use crate::model::manifest::Manifest;
use crate::model::result::{ChartInfo, Warning};

use super::plain::{self, PlainOptions};

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub values_override: Option<PathBuf>,
    pub include_metadata: bool,
    pub validate_output: bool,
}

fn read_yaml(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::from(ErrorKind::IoError(path.display().to_string(), e.to_string())))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| Error::from(ErrorKind::InvalidYaml(path.display().to_string(), e.to_string())))
}

fn read_yaml_or_empty(path: &Path) -> Result<Value> {
    if path.is_file() {
        read_yaml(path)
    } else {
        Ok(Value::Mapping(serde_yaml::Mapping::new()))
    }
}

/// Overlay is deep-merged into base: maps merge key-by-key, every other
/// value type overwrites (last-one-wins).
fn deep_merge(base: &mut Value, overlay: &Value) {
    if let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (&mut *base, overlay) {
        for (key, value) in overlay_map.iter() {
            match base_map.get_mut(key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
    } else {
        *base = overlay.clone();
    }
}

fn parse_chart_info(chart_yaml: &Value) -> Result<ChartInfo> {
    let name = chart_yaml
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorKind::RenderFailed("Chart.yaml".to_string(), "missing 'name'".to_string()))?
        .to_string();
    let version = chart_yaml
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorKind::RenderFailed("Chart.yaml".to_string(), "missing 'version'".to_string()))?
        .to_string();
    let app_version = chart_yaml.get("appVersion").and_then(Value::as_str).map(String::from);
    Ok(ChartInfo { name, version, app_version })
}

/// Renders a Chart directory: loads `values.yaml` (merged with an optional
/// `--values` override), then runs every `templates/*.yaml` file through
/// `tera` with `.Values`/`.Release`/`.Chart` exposed, matching the minimal
/// subset of Helm's built-in template objects that RBAC manifests
/// realistically reference.
pub fn render(chart_dir: &Path, opts: &ChartOptions) -> Result<(Vec<Manifest>, Vec<Warning>)> {
    let chart_yaml = read_yaml(&chart_dir.join("Chart.yaml"))?;
    let chart_info = parse_chart_info(&chart_yaml)?;

    let mut values = read_yaml_or_empty(&chart_dir.join("values.yaml"))?;
    if let Some(override_path) = &opts.values_override {
        let override_values = read_yaml(override_path)?;
        deep_merge(&mut values, &override_values);
    }

    let mut context = tera::Context::new();
    context.insert("Values", &values);

    let mut release = BTreeMap::new();
    release.insert("Name", chart_info.name.clone());
    context.insert("Release", &release);

    let mut chart_ctx = BTreeMap::new();
    chart_ctx.insert("Name", chart_info.name.clone());
    chart_ctx.insert("Version", chart_info.version.clone());
    context.insert("Chart", &chart_ctx);

    let templates_dir = chart_dir.join("templates");
    let mut template_paths: Vec<PathBuf> = Vec::new();
    if templates_dir.is_dir() {
        let entries = fs::read_dir(&templates_dir)
            .map_err(|e| Error::from(ErrorKind::IoError(templates_dir.display().to_string(), e.to_string())))?;
        for entry in entries {
            let entry = entry
                .map_err(|e| Error::from(ErrorKind::IoError(templates_dir.display().to_string(), e.to_string())))?;
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            if is_yaml {
                template_paths.push(path);
            }
        }
    }
    template_paths.sort();

    let mut manifests = Vec::new();
    let mut warnings = Vec::new();

    for path in template_paths {
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::from(ErrorKind::IoError(path.display().to_string(), e.to_string())))?;
        let rendered = Tera::one_off(&raw, &context, false)
            .map_err(|e| Error::from(ErrorKind::RenderFailed(path.display().to_string(), e.to_string())))?;
        let template_name =
            path.file_name().and_then(|n| n.to_str()).unwrap_or("template").to_string();
        let plain_opts = PlainOptions {
            include_metadata: opts.include_metadata,
            validate_output: opts.validate_output,
            template_name: Some(template_name),
        };
        let (docs, mut doc_warnings) =
            plain::render(rendered.as_bytes(), &path.display().to_string(), &plain_opts)?;
        manifests.extend(docs);
        warnings.append(&mut doc_warnings);
    }

    Ok((manifests, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut f = fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn renders_templates_with_values_substitution() {
        let dir = std::env::temp_dir()
            .join(format!("rbac-atlas-chart-test-{:?}", std::thread::current().id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        write_file(&dir.join("Chart.yaml"), "name: my-chart\nversion: 1.2.3\n");
        write_file(&dir.join("values.yaml"), "serviceAccountName: my-sa\n");
        write_file(
            &dir.join("templates/sa.yaml"),
            "kind: ServiceAccount\napiVersion: v1\nmetadata:\n  name: {{ Values.serviceAccountName }}\n",
        );

        let opts = ChartOptions { values_override: None, include_metadata: true, validate_output: false };
        let (manifests, warnings) = render(&dir, &opts).expect("chart should render");
        assert!(warnings.is_empty());
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].name, "my-sa");
        assert_eq!(manifests[0].meta.template.as_deref(), Some("sa.yaml"));

        fs::remove_dir_all(&dir).ok();
    }
}
