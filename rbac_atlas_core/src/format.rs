//! Shapes an [`AnalysisResult`] into the row-shaped structures the CLI's
//! JSON/YAML/table/markdown renderers consume. This module only shapes
//! data — rendering to a concrete text format is left to the CLI.

use serde::Serialize;

use crate::model::result::{AnalysisResult, Metadata};
use crate::model::{Identity, Workload};

const RULE_URL_TEMPLATE: &str = "https://rbac-atlas.github.io/rules/";

#[derive(Debug, Clone, Serialize)]
pub struct MatchedRuleRef {
    pub id: i64,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionReportRow {
    pub service_account: String,
    pub namespace: String,
    pub role_type: &'static str,
    pub role_name: String,
    pub api_group: String,
    pub resource: String,
    pub resource_name: String,
    pub verbs: Vec<String>,
    pub risk_level: String,
    pub tags: Vec<String>,
    pub matched_rules: Vec<MatchedRuleRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentityReportRow {
    pub name: String,
    pub namespace: String,
    pub automount_token: bool,
    pub secrets: Vec<String>,
    pub image_pull_secrets: Vec<String>,
    pub synthetic: bool,
}

impl From<&Identity> for IdentityReportRow {
    fn from(identity: &Identity) -> IdentityReportRow {
        IdentityReportRow {
            name: identity.name.clone(),
            namespace: identity.namespace.clone(),
            automount_token: identity.automount_token,
            secrets: identity.secrets.clone(),
            image_pull_secrets: identity.image_pull_secrets.clone(),
            synthetic: identity.synthetic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReportRow {
    pub name: String,
    pub namespace: String,
    pub service_account: String,
    pub workload_type: &'static str,
    pub containers: Vec<String>,
}

impl From<&Workload> for WorkloadReportRow {
    fn from(workload: &Workload) -> WorkloadReportRow {
        WorkloadReportRow {
            name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            service_account: workload.service_account.clone(),
            workload_type: workload.workload_type.as_str(),
            containers: workload.containers.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// The complete shape handed to the CLI's table/JSON/YAML/markdown
/// renderers.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: Metadata,
    pub identities: Vec<IdentityReportRow>,
    pub permissions: Vec<PermissionReportRow>,
    pub workloads: Vec<WorkloadReportRow>,
}

/// Shapes a joined [`AnalysisResult`] into the [`Report`] the formatter
/// collaborator renders.
pub fn shape(result: &AnalysisResult) -> Report {
    let identities = result.identities.iter().map(IdentityReportRow::from).collect();
    let workloads = result.workloads.iter().map(WorkloadReportRow::from).collect();

    let permissions = result
        .permissions
        .iter()
        .map(|p| PermissionReportRow {
            service_account: p.service_account.clone(),
            namespace: p.namespace.clone(),
            role_type: p.permission.role_type,
            role_name: p.permission.role_name.clone(),
            api_group: p.permission.api_group.clone(),
            resource: p.permission.resource.clone(),
            resource_name: p.permission.resource_name.clone(),
            verbs: p.permission.verbs.clone(),
            risk_level: p.risk_level.to_string(),
            tags: p.tags.clone(),
            matched_rules: p
                .matched_rules
                .iter()
                .filter(|r| r.id != 0) // the synthetic base rule has no catalog URL.
                .map(|r| MatchedRuleRef {
                    id: r.id,
                    name: r.name.clone(),
                    url: format!("{}{}/", RULE_URL_TEMPLATE, r.id),
                })
                .collect(),
        })
        .collect();

    Report { metadata: result.metadata.clone(), identities, permissions, workloads }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::Evaluator;
    use crate::model::rbac::{Permission, RoleType};
    use crate::model::result::ChartInfo;

    #[test]
    fn shapes_a_matched_rule_into_a_fixed_url_template() {
        let evaluator = Evaluator::global();
        let permission = Permission {
            namespace: "*".to_string(),
            role_type: RoleType::ClusterRole,
            role_name: "secrets-reader".to_string(),
            api_group: String::new(),
            resource: "secrets".to_string(),
            resource_name: String::new(),
            verbs: vec!["get".to_string(), "list".to_string(), "watch".to_string()],
        };
        let evaluated = evaluator.evaluate("default", &permission);

        let result = AnalysisResult {
            metadata: Metadata {
                version: "0.1.0".to_string(),
                name: None,
                source: "test".to_string(),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
                chart: None::<ChartInfo>,
            },
            identities: Vec::new(),
            permissions: vec![evaluated],
            workloads: Vec::new(),
        };

        let report = shape(&result);
        assert_eq!(report.permissions.len(), 1);
        let matched = &report.permissions[0].matched_rules;
        assert!(!matched.is_empty());
        assert!(matched[0].url.starts_with(RULE_URL_TEMPLATE));
        assert!(matched[0].url.ends_with(&format!("{}/", matched[0].id)));
    }
}
