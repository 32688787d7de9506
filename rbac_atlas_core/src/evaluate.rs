//! The policy evaluator — the hardest piece of this
//! crate. Given a flattened [`Permission`] tuple, returns every catalog rule
//! that matches it plus a synthetic base rule, ordered deterministically.
//!
//! Each axis is encoded as a tagged `Axis` variant rather than open-coded
//! string comparisons, turning the match into a small decision table.

use crate::catalog::{Catalog, CatalogRule};
use crate::model::rbac::{Permission, RoleType};
use crate::model::result::{EvaluatedPermission, MatchedRule, PermissionRow};
use crate::model::risk::RiskLevel;

const WILDCARD: &str = "*";

fn contains_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == WILDCARD)
}

/// API-group/resource axis shape. Order
/// matters: a rule-side wildcard is checked *first* and, if present,
/// requires the policy value to be a literal wildcard too — only once the
/// rule has no wildcard does a wildcard policy value match unconditionally.
fn axis_matches(policy_value: &str, rule_values: &[String]) -> bool {
    if contains_wildcard(rule_values) {
        return policy_value == WILDCARD;
    }
    if policy_value == WILDCARD {
        return true;
    }
    if policy_value.is_empty() {
        return rule_values.iter().any(|r| r.is_empty());
    }
    rule_values.iter().any(|r| r == policy_value)
}

/// Verb axis — the one asymmetric axis: a
/// rule matches a policy's verb set when the rule's verbs are a *subset* of
/// the policy's verbs, not when they're equal or when the policy's verbs
/// are a subset of the rule's.
fn verbs_match(policy_verbs: &[String], rule_verbs: &[String]) -> bool {
    if contains_wildcard(rule_verbs) {
        return contains_wildcard(policy_verbs);
    }
    if contains_wildcard(policy_verbs) {
        return true;
    }
    rule_verbs.iter().all(|rv| policy_verbs.iter().any(|pv| pv == rv))
}

fn role_type_compatible(policy: RoleType, rule: RoleType) -> bool {
    !(policy == RoleType::Role && rule == RoleType::ClusterRole)
}

fn rule_matches(permission: &Permission, rule: &CatalogRule) -> bool {
    role_type_compatible(permission.role_type, rule.role_type)
        && axis_matches(&permission.api_group, &rule.api_groups)
        && axis_matches(&permission.resource, &rule.resources)
        && verbs_match(&permission.verbs, &rule.verbs)
}

/// Scope-and-wildcard base classification, independent
/// of the catalog. Returns the base level before the resource-name override.
fn base_level(permission: &Permission) -> RiskLevel {
    let wildcard_count = [
        contains_wildcard(std::slice::from_ref(&permission.api_group)),
        contains_wildcard(std::slice::from_ref(&permission.resource)),
        contains_wildcard(&permission.verbs),
    ]
    .iter()
    .filter(|w| **w)
    .count();

    if permission.is_cluster_scoped() {
        match wildcard_count {
            3 => RiskLevel::Critical,
            1 | 2 => RiskLevel::High,
            _ => RiskLevel::Low,
        }
    } else if wildcard_count > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

const RESOURCE_NAME_RESTRICTED: &str = "ResourceNameRestricted";

fn base_rule(permission: &Permission) -> MatchedRule {
    let forced_low = permission.is_resource_name_restricted();
    let level = if forced_low { RiskLevel::Low } else { base_level(permission) };
    let mut tags = Vec::new();
    if forced_low {
        tags.push(RESOURCE_NAME_RESTRICTED.to_string());
    }
    MatchedRule { id: 0, name: "base-classification".to_string(), risk_level: level, tags }
}

/// Dedupe tags across matched rules, preserving first-appearance order.
fn merge_tags(rules: &[MatchedRule]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();
    for rule in rules {
        for tag in &rule.tags {
            if seen.insert(tag.clone()) {
                merged.push(tag.clone());
            }
        }
    }
    merged
}

/// Evaluates a single permission tuple against the embedded catalog.
pub struct Evaluator<'a> {
    catalog: &'a Catalog,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a Catalog) -> Evaluator<'a> {
        Evaluator { catalog }
    }

    pub fn global() -> Evaluator<'static> {
        Evaluator { catalog: Catalog::global() }
    }

    /// Returns every matched catalog rule (sorted by `riskLevel` desc, then
    /// `id` asc) plus the base rule appended last.
    fn matched_rules(&self, permission: &Permission) -> Vec<MatchedRule> {
        let forced_low = permission.is_resource_name_restricted();
        let mut matched: Vec<MatchedRule> = self
            .catalog
            .rules
            .iter()
            .filter(|rule| rule_matches(permission, rule))
            .map(|rule| MatchedRule::from_catalog_rule(rule, forced_low))
            .collect();

        matched.sort_by(|a, b| b.risk_level.cmp(&a.risk_level).then(a.id.cmp(&b.id)));
        matched.push(base_rule(permission));
        matched
    }

    pub fn evaluate(&self, service_account: &str, permission: &Permission) -> EvaluatedPermission {
        let matched = self.matched_rules(permission);
        let risk_level = matched.iter().map(|r| r.risk_level).max().unwrap_or(RiskLevel::Low);
        let tags = merge_tags(&matched);
        EvaluatedPermission {
            service_account: service_account.to_string(),
            namespace: permission.namespace.clone(),
            permission: PermissionRow::from(permission),
            matched_rules: matched,
            risk_level,
            tags,
        }
    }

    pub fn evaluate_all(
        &self,
        permissions: &[(String, Permission)],
    ) -> Vec<EvaluatedPermission> {
        permissions.iter().map(|(sa, p)| self.evaluate(sa, p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(role_type: RoleType, namespace: &str, api_group: &str, resource: &str, verbs: &[&str]) -> Permission {
        Permission {
            namespace: namespace.to_string(),
            role_type,
            role_name: "r".to_string(),
            api_group: api_group.to_string(),
            resource: resource.to_string(),
            resource_name: String::new(),
            verbs: verbs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn evaluate_always_returns_at_least_the_base_rule() {
        let evaluator = Evaluator::global();
        let p = permission(RoleType::Role, "ns-a", "apps", "deployments", &["get"]);
        let result = evaluator.evaluate("sa", &p);
        assert!(!result.matched_rules.is_empty());
    }

    #[test]
    fn first_rule_risk_is_at_least_base_level() {
        let evaluator = Evaluator::global();
        let p = permission(RoleType::Role, "ns-a", "", "secrets", &["get", "list", "watch"]);
        let result = evaluator.evaluate("sa", &p);
        let base = base_level(&p);
        assert!(result.matched_rules[0].risk_level >= base);
    }

    #[test]
    fn cluster_admin_wildcard_is_critical_with_expected_tag() {
        let evaluator = Evaluator::global();
        let p = permission(RoleType::ClusterRole, "*", "*", "*", &["*"]);
        let result = evaluator.evaluate("sa", &p);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.tags.iter().any(|t| t == "ClusterAdminAccess"));
    }

    #[test]
    fn cluster_scope_partial_wildcard_is_high() {
        let p = permission(RoleType::ClusterRole, "*", "*", "pods", &["get"]);
        assert_eq!(base_level(&p), RiskLevel::High);
    }

    #[test]
    fn namespaced_no_wildcard_is_low() {
        let p = permission(RoleType::Role, "ns-a", "apps", "deployments", &["get"]);
        assert_eq!(base_level(&p), RiskLevel::Low);
    }

    #[test]
    fn namespaced_any_wildcard_is_medium() {
        let p = permission(RoleType::Role, "ns-a", "*", "deployments", &["get"]);
        assert_eq!(base_level(&p), RiskLevel::Medium);
    }

    #[test]
    fn resource_name_restriction_forces_low_and_tags_every_matched_rule() {
        let evaluator = Evaluator::global();
        let mut p = permission(RoleType::ClusterRole, "*", "", "secrets", &["get", "list", "watch"]);
        p.resource_name = "db-password".to_string();
        let result = evaluator.evaluate("sa", &p);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.tags.iter().any(|t| t == "ResourceNameRestricted"));
        for rule in &result.matched_rules {
            assert_eq!(rule.risk_level, RiskLevel::Low);
        }
        // attribution to the "read secrets" rule must survive the override.
        assert!(result.matched_rules.iter().any(|r| r.name.to_lowercase().contains("secret")));
    }

    #[test]
    fn role_typed_permission_never_matches_a_cluster_role_only_rule() {
        let evaluator = Evaluator::global();
        let p = permission(RoleType::Role, "ns-a", "", "secrets", &["get", "list", "watch"]);
        let result = evaluator.evaluate("sa", &p);
        for rule in &result.matched_rules {
            // base rule (id 0) has no role_type of its own; only check real catalog rules.
            if rule.id != 0 {
                let catalog_rule = Catalog::global().rules.iter().find(|r| r.id == rule.id).unwrap();
                assert_ne!(catalog_rule.role_type, RoleType::ClusterRole);
            }
        }
    }

    #[test]
    fn verb_axis_is_asymmetric_rule_verbs_subset_of_policy_verbs() {
        // rule requires {get, list}; policy grants a superset -> matches.
        let rule_verbs = vec!["get".to_string(), "list".to_string()];
        let policy_verbs = vec!["get".to_string(), "list".to_string(), "watch".to_string()];
        assert!(verbs_match(&policy_verbs, &rule_verbs));

        // policy only grants a subset of what the rule requires -> no match.
        let policy_verbs_subset = vec!["get".to_string()];
        assert!(!verbs_match(&policy_verbs_subset, &rule_verbs));
    }

    #[test]
    fn subresource_does_not_match_parent_resource_rule() {
        let evaluator = Evaluator::global();
        let exec = permission(RoleType::Role, "ns-a", "", "pods/exec", &["create"]);
        let parent = permission(RoleType::Role, "ns-a", "", "pods", &["create"]);
        let exec_result = evaluator.evaluate("sa", &exec);
        let parent_result = evaluator.evaluate("sa", &parent);
        assert!(exec_result.tags.iter().any(|t| t == "PodExec"));
        assert!(!parent_result.tags.iter().any(|t| t == "PodExec"));
    }

    #[test]
    fn tags_are_deduplicated_and_preserve_first_appearance_order() {
        let rules = vec![
            MatchedRule { id: 1, name: "a".to_string(), risk_level: RiskLevel::High, tags: vec!["X".to_string(), "Y".to_string()] },
            MatchedRule { id: 2, name: "b".to_string(), risk_level: RiskLevel::Low, tags: vec!["Y".to_string(), "Z".to_string()] },
        ];
        assert_eq!(merge_tags(&rules), vec!["X".to_string(), "Y".to_string(), "Z".to_string()]);
    }
}
