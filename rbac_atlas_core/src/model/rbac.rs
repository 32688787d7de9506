use serde::Deserialize;

use crate::error::ErrorKind;
use crate::error::Result;

/// `Role` or `ClusterRole`, distinguishing namespaced from cluster-wide
/// scope on a binding's attributed permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleType {
    Role,
    ClusterRole,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Role => "Role",
            RoleType::ClusterRole => "ClusterRole",
        }
    }

    pub fn parse(kind: &str) -> Result<RoleType> {
        match kind {
            "Role" => Ok(RoleType::Role),
            "ClusterRole" => Ok(RoleType::ClusterRole),
            other => Err(ErrorKind::InvalidRoleType(other.to_string()).into()),
        }
    }
}

/// Marker used in a [`Permission`]'s `namespace` field for cluster-wide
/// scope, per the ClusterRoleBinding attribution invariant.
pub const CLUSTER_SCOPE: &str = "*";

/// A single rule within a `Role`/`ClusterRole`'s `rules` list.
///
/// Empty `apiGroups` means the core API group (the empty string, never
/// `*`). Empty `resourceNames` means all instances. Subresources (e.g.
/// `pods/exec`) are distinct resources from their parent and are never
/// merged with it.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub resource_names: Vec<String>,
    #[serde(default)]
    pub verbs: Vec<String>,
}

/// Body shared by `Role` and `ClusterRole` manifests — Kubernetes gives
/// both kinds an identical `rules` schema, so one struct covers both.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Role {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// `ClusterRole` bodies are structurally identical to `Role` bodies.
pub type ClusterRole = Role;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    #[serde(default)]
    pub api_group: String,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Body shared by `RoleBinding` and `ClusterRoleBinding` manifests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub role_ref: RoleRef,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

/// The flattened permission tuple the policy evaluator consumes.
///
/// `resource_name == ""` denotes "all instances"; callers must normalize
/// `"*"` to `""` before constructing one of these (the RBAC extractor does
/// this at tensor-expansion time, never at evaluation time).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    pub namespace: String,
    pub role_type: RoleType,
    pub role_name: String,
    pub api_group: String,
    pub resource: String,
    pub resource_name: String,
    pub verbs: Vec<String>,
}

impl Permission {
    /// Cluster scope: `ClusterRole` role type, or an empty namespace.
    pub fn is_cluster_scoped(&self) -> bool {
        self.role_type == RoleType::ClusterRole || self.namespace.is_empty()
    }

    /// A non-empty, non-wildcard `resourceName` narrows the blast radius
    /// to a single object.
    pub fn is_resource_name_restricted(&self) -> bool {
        !self.resource_name.is_empty() && self.resource_name != "*"
    }
}
