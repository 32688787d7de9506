use serde::Serialize;

use super::rbac::Permission;
use super::risk::RiskLevel;
use super::{Identity, Workload};
use crate::catalog::CatalogRule;

/// Chart provenance, populated when the Chart renderer ran.
#[derive(Debug, Clone, Serialize)]
pub struct ChartInfo {
    pub name: String,
    pub version: String,
    pub app_version: Option<String>,
}

/// Top-level metadata block attached to an [`AnalysisResult`].
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub version: String,
    pub name: Option<String>,
    pub source: String,
    pub timestamp: String,
    pub chart: Option<ChartInfo>,
}

/// One matched-or-base catalog rule, carrying whatever the
/// resource-name-restriction override did to its risk level/tags.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedRule {
    pub id: i64,
    pub name: String,
    pub risk_level: RiskLevel,
    pub tags: Vec<String>,
}

impl MatchedRule {
    pub fn from_catalog_rule(rule: &CatalogRule, forced_low: bool) -> MatchedRule {
        let mut tags = rule.tags.clone();
        let risk_level = if forced_low {
            if !tags.iter().any(|t| t == "ResourceNameRestricted") {
                tags.push("ResourceNameRestricted".to_string());
            }
            RiskLevel::Low
        } else {
            rule.risk_level
        };
        MatchedRule { id: rule.id, name: rule.name.clone(), risk_level, tags }
    }
}

/// One entry in the joined result: a permission tuple plus the evaluator's
/// verdict on it.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedPermission {
    pub service_account: String,
    pub namespace: String,
    pub permission: PermissionRow,
    pub matched_rules: Vec<MatchedRule>,
    pub risk_level: RiskLevel,
    pub tags: Vec<String>,
}

/// Serializable projection of [`Permission`] (verbs sorted for deterministic
/// output).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionRow {
    pub role_type: &'static str,
    pub role_name: String,
    pub api_group: String,
    pub resource: String,
    pub resource_name: String,
    pub verbs: Vec<String>,
}

impl From<&Permission> for PermissionRow {
    fn from(p: &Permission) -> PermissionRow {
        let mut verbs = p.verbs.clone();
        verbs.sort();
        PermissionRow {
            role_type: p.role_type.as_str(),
            role_name: p.role_name.clone(),
            api_group: p.api_group.clone(),
            resource: p.resource.clone(),
            resource_name: p.resource_name.clone(),
            verbs,
        }
    }
}

/// The pipeline stage a [`Warning`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Resolve,
    Render,
    Extract,
    Evaluate,
}

/// A non-fatal issue surfaced during ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

impl Warning {
    pub fn new(stage: Stage, message: impl Into<String>) -> Warning {
        Warning { stage, message: message.into() }
    }
}

/// The full joined-and-evaluated analysis, handed to the formatter adapter.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub metadata: Metadata,
    pub identities: Vec<Identity>,
    pub permissions: Vec<EvaluatedPermission>,
    pub workloads: Vec<Workload>,
}
