use serde::Deserialize;
use serde_yaml::Value;

use crate::model::manifest::{Manifest, ManifestKind};
use crate::model::result::{Stage, Warning};
use crate::model::workload::{Container, Workload, DEFAULT_SERVICE_ACCOUNT};
use crate::model::WorkloadType;

#[derive(Debug, Deserialize, Default)]
struct PodSpecBody {
    #[serde(default, rename = "serviceAccountName")]
    service_account_name: Option<String>,
    #[serde(default)]
    containers: Vec<Container>,
    #[serde(default, rename = "initContainers")]
    init_containers: Vec<Container>,
}

/// Finds the pod spec `Value` for a workload kind. `CronJob` nests one extra
/// level through `spec.jobTemplate.spec.template.spec`; a bare `Pod` has no
/// `spec.template` indirection at all; every other recognized kind nests
/// through `spec.template.spec`.
fn pod_spec_value<'a>(kind: WorkloadType, body: &'a Value) -> Option<&'a Value> {
    match kind {
        WorkloadType::Pod => body.get("spec"),
        WorkloadType::CronJob => body
            .get("spec")?
            .get("jobTemplate")?
            .get("spec")?
            .get("template")?
            .get("spec"),
        _ => body.get("spec")?.get("template")?.get("spec"),
    }
}

/// Consumes every recognized workload `kind`. For each, finds its pod spec
/// (kind-specific nesting, see [`pod_spec_value`]) and emits one container
/// entry per container/init-container.
pub fn extract(manifests: &[Manifest]) -> (Vec<Workload>, Vec<Warning>) {
    let mut workloads = Vec::new();
    let mut warnings = Vec::new();

    for manifest in manifests {
        let workload_type = match manifest.kind {
            ManifestKind::Workload(wt) => wt,
            _ => continue,
        };

        let spec_value = match pod_spec_value(workload_type, &manifest.body) {
            Some(v) => v,
            None => {
                warnings.push(Warning::new(
                    Stage::Extract,
                    format!(
                        "{} {}/{}: missing pod spec, skipped",
                        workload_type.as_str(),
                        manifest.namespace.clone().unwrap_or_default(),
                        manifest.name,
                    ),
                ));
                continue;
            }
        };

        let pod_spec: PodSpecBody = match serde_yaml::from_value(spec_value.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                warnings.push(Warning::new(
                    Stage::Extract,
                    format!(
                        "{} {}/{}: {}",
                        workload_type.as_str(),
                        manifest.namespace.clone().unwrap_or_default(),
                        manifest.name,
                        e
                    ),
                ));
                continue;
            }
        };

        let mut containers = pod_spec.containers;
        containers.extend(pod_spec.init_containers);

        workloads.push(Workload {
            name: manifest.name.clone(),
            namespace: manifest.namespace.clone().unwrap_or_default(),
            service_account: pod_spec
                .service_account_name
                .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT.to_string()),
            workload_type,
            containers,
        });
    }

    (workloads, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::manifest::{ByteSpan, ManifestMeta};

    fn manifest_from(yaml: &str) -> Manifest {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        Manifest::from_document(value, ByteSpan::default(), ManifestMeta::default()).unwrap()
    }

    #[test]
    fn deployment_attributes_to_default_when_service_account_omitted() {
        let manifest = manifest_from(
            "kind: Deployment\napiVersion: apps/v1\nmetadata:\n  name: web\n  namespace: ns-a\nspec:\n  template:\n    spec:\n      containers:\n        - name: app\n          image: app:1.0\n",
        );
        let (workloads, warnings) = extract(std::slice::from_ref(&manifest));
        assert!(warnings.is_empty());
        assert_eq!(workloads.len(), 1);
        assert_eq!(workloads[0].service_account, "default");
        assert_eq!(workloads[0].containers.len(), 1);
        assert_eq!(workloads[0].containers[0].name, "app");
    }

    #[test]
    fn bare_pod_uses_spec_directly_not_spec_template() {
        let manifest = manifest_from(
            "kind: Pod\napiVersion: v1\nmetadata:\n  name: debugger\n  namespace: ns-a\nspec:\n  serviceAccountName: svc-x\n  containers:\n    - name: shell\n",
        );
        let (workloads, _) = extract(std::slice::from_ref(&manifest));
        assert_eq!(workloads.len(), 1);
        assert_eq!(workloads[0].service_account, "svc-x");
        assert_eq!(workloads[0].workload_type, WorkloadType::Pod);
    }

    #[test]
    fn cronjob_descends_through_jobtemplate_nesting() {
        let manifest = manifest_from(
            "kind: CronJob\napiVersion: batch/v1\nmetadata:\n  name: nightly\n  namespace: ns-a\nspec:\n  jobTemplate:\n    spec:\n      template:\n        spec:\n          serviceAccountName: batch-runner\n          containers:\n            - name: worker\n",
        );
        let (workloads, warnings) = extract(std::slice::from_ref(&manifest));
        assert!(warnings.is_empty());
        assert_eq!(workloads.len(), 1);
        assert_eq!(workloads[0].service_account, "batch-runner");
    }

    #[test]
    fn init_containers_are_included_after_containers() {
        let manifest = manifest_from(
            "kind: Pod\napiVersion: v1\nmetadata:\n  name: p\n  namespace: ns-a\nspec:\n  containers:\n    - name: main\n  initContainers:\n    - name: setup\n",
        );
        let (workloads, _) = extract(std::slice::from_ref(&manifest));
        assert_eq!(workloads[0].containers.len(), 2);
        assert_eq!(workloads[0].containers[0].name, "main");
        assert_eq!(workloads[0].containers[1].name, "setup");
    }
}
