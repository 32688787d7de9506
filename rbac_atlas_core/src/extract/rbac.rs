use std::collections::HashMap;

use crate::model::manifest::{Manifest, ManifestKind};
use crate::model::rbac::{Binding, Permission, Role, RoleType, CLUSTER_SCOPE};
use crate::model::result::{Stage, Warning};

/// Key for the Role/ClusterRole index: `(name, namespace)` for a `Role`,
/// `(name, "")` for a `ClusterRole` — the two kinds never collide because
/// Kubernetes itself forbids a namespaced and cluster-scoped object sharing
/// a name within the same lookup, and a binding always names which kind it
/// references via `roleRef.kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RoleKey {
    name: String,
    namespace: String,
    role_type: RoleType,
}

/// Normalizes a raw `resourceNames` list into the tensor's key convention:
/// empty means "all instances" (kept as a single empty-string key), a
/// non-empty list enumerates each name as its own key, and a literal `"*"`
/// is normalized to `""`.
fn resource_name_keys(resource_names: &[String]) -> Vec<String> {
    if resource_names.is_empty() {
        return vec![String::new()];
    }
    resource_names
        .iter()
        .map(|n| if n == "*" { String::new() } else { n.clone() })
        .collect()
}

/// Expands one role's rules into flattened permission tuples attributed to
/// `(service_account, namespace, role_type)` and the `apiGroup -> resource -> resourceName -> verbSet`
/// tensor it describes.
fn expand_role(role: &Role, role_name: &str, attributed_namespace: &str, attributed_type: RoleType) -> Vec<Permission> {
    let mut permissions = Vec::new();
    for rule in &role.rules {
        let api_groups: Vec<String> = if rule.api_groups.is_empty() {
            vec![String::new()]
        } else {
            rule.api_groups.clone()
        };
        for api_group in &api_groups {
            for resource in &rule.resources {
                for resource_name in resource_name_keys(&rule.resource_names) {
                    let mut verbs = rule.verbs.clone();
                    verbs.sort();
                    verbs.dedup();
                    permissions.push(Permission {
                        namespace: attributed_namespace.to_string(),
                        role_type: attributed_type,
                        role_name: role_name.to_string(),
                        api_group: api_group.clone(),
                        resource: resource.clone(),
                        resource_name,
                        verbs,
                    });
                }
            }
        }
    }
    permissions
}

/// Walks the manifest sequence in two passes: index every `Role`/`ClusterRole`, then expand every
/// `RoleBinding`/`ClusterRoleBinding`'s `ServiceAccount` subjects into
/// permission tuples under that subject's `(name, namespace)` key.
///
/// Returns `(service_account, namespace, permission)` triples rather than a
/// nested map — the orchestrator is the one that needs the map shape, once
/// it also has the Identity view to reconcile synthetic accounts against.
pub fn extract(manifests: &[Manifest]) -> (Vec<(String, String, Permission)>, Vec<Warning>) {
    let mut roles: HashMap<RoleKey, Role> = HashMap::new();
    for manifest in manifests {
        let role_type = match manifest.kind {
            ManifestKind::Role => RoleType::Role,
            ManifestKind::ClusterRole => RoleType::ClusterRole,
            _ => continue,
        };
        let namespace = match role_type {
            RoleType::Role => manifest.namespace.clone().unwrap_or_default(),
            RoleType::ClusterRole => String::new(),
        };
        match manifest.parse_body::<Role>() {
            Ok(role) => {
                roles.insert(RoleKey { name: manifest.name.clone(), namespace, role_type }, role);
            }
            Err(_) => {
                // A malformed Role/ClusterRole body is an extraction failure
                // for that object only; bindings referencing it surface
                // their own "unresolved role" warning below.
            }
        }
    }

    let mut permissions = Vec::new();
    let mut warnings = Vec::new();

    for manifest in manifests {
        let (is_cluster_binding, binding_namespace) = match manifest.kind {
            ManifestKind::RoleBinding => (false, manifest.namespace.clone().unwrap_or_default()),
            ManifestKind::ClusterRoleBinding => (true, String::new()),
            _ => continue,
        };

        let binding: Binding = match manifest.parse_body() {
            Ok(b) => b,
            Err(e) => {
                warnings.push(Warning::new(
                    Stage::Extract,
                    format!("{}/{}: {}", binding_namespace, manifest.name, e),
                ));
                continue;
            }
        };

        let referenced_role_type = match binding.role_ref.kind.as_str() {
            "Role" => RoleType::Role,
            "ClusterRole" => RoleType::ClusterRole,
            other => {
                warnings.push(Warning::new(
                    Stage::Extract,
                    format!(
                        "{}/{}: unknown roleRef.kind '{}'",
                        binding_namespace, manifest.name, other
                    ),
                ));
                continue;
            }
        };

        // A RoleBinding's role lookup is scoped to its own namespace even
        // when it references a ClusterRole by name (Kubernetes allows this
        // to grant a cluster-wide role's rules within one namespace only).
        let role_lookup_namespace = if is_cluster_binding { String::new() } else { binding_namespace.clone() };
        let role_key = RoleKey {
            name: binding.role_ref.name.clone(),
            namespace: role_lookup_namespace,
            role_type: referenced_role_type,
        };

        let role = match roles.get(&role_key) {
            Some(r) => r,
            None => {
                warnings.push(Warning::new(
                    Stage::Extract,
                    format!(
                        "{}/{}: referenced {} '{}' not found in analyzed manifests",
                        binding_namespace, manifest.name, binding.role_ref.kind, binding.role_ref.name
                    ),
                ));
                continue;
            }
        };

        // Attribution invariant: a
        // ClusterRoleBinding always attributes ClusterRole/cluster-scope,
        // a RoleBinding always attributes Role/its own namespace, even when
        // referencing a ClusterRole.
        let (attributed_type, attributed_namespace) = if is_cluster_binding {
            (RoleType::ClusterRole, CLUSTER_SCOPE.to_string())
        } else {
            (RoleType::Role, binding_namespace.clone())
        };

        let expanded = expand_role(role, &binding.role_ref.name, &attributed_namespace, attributed_type);

        for subject in &binding.subjects {
            if subject.kind != "ServiceAccount" {
                continue;
            }
            let sa_namespace = subject
                .namespace
                .clone()
                .unwrap_or_else(|| binding_namespace.clone());
            for permission in &expanded {
                permissions.push((subject.name.clone(), sa_namespace.clone(), permission.clone()));
            }
        }
    }

    (permissions, warnings)
}
