//! The embedded risk catalog.
//!
//! The catalog is compiled into the binary via `include_str!` and parsed
//! once, lazily, the first time it's touched. A malformed catalog is a
//! build-time defect, not a runtime one the caller should have to handle —
//! so lookup failures panic rather than bubbling a `Result` through every
//! evaluation call.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

use crate::error::{Error, ErrorKind, Result};
use crate::model::risk::RiskLevel;
use crate::model::rbac::RoleType;

const EMBEDDED_RULES: &str = include_str!("rules.yaml");

/// STRIDE-ish classification, carried alongside (not instead of) the
/// catalog's free-form tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Category {
    Spoofing,
    Tampering,
    Repudiation,
    InformationDisclosure,
    DenialOfService,
    ElevationOfPrivilege,
}

fn deserialize_role_type<'de, D>(d: D) -> std::result::Result<RoleType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    RoleType::parse(&raw).map_err(|_| serde::de::Error::custom(format!("invalid roleType: {}", raw)))
}

/// One catalog entry, matched against permission tuples by the evaluator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRule {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub risk_level: RiskLevel,
    #[serde(deserialize_with = "deserialize_role_type")]
    pub role_type: RoleType,
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    rules: Vec<CatalogRule>,
}

/// The parsed, validated risk catalog.
pub struct Catalog {
    pub rules: Vec<CatalogRule>,
}

impl Catalog {
    fn load_embedded() -> Result<Catalog> {
        let doc: CatalogDocument = serde_yaml::from_str(EMBEDDED_RULES)
            .map_err(|e| Error::from(ErrorKind::InvalidCatalog(e.to_string())))?;
        Catalog::validate(&doc.rules)?;
        Ok(Catalog { rules: doc.rules })
    }

    fn validate(rules: &[CatalogRule]) -> Result<()> {
        let mut seen_ids = HashSet::new();
        for rule in rules {
            if !seen_ids.insert(rule.id) {
                return Err(Error::from(ErrorKind::InvalidCatalog(format!(
                    "duplicate catalog rule id {}",
                    rule.id
                ))));
            }
            if rule.name.trim().is_empty() {
                return Err(Error::from(ErrorKind::InvalidCatalog(format!(
                    "catalog rule {} has an empty name",
                    rule.id
                ))));
            }
            if rule.resources.is_empty() || rule.verbs.is_empty() {
                return Err(Error::from(ErrorKind::InvalidCatalog(format!(
                    "catalog rule {} ({}) must name at least one resource and one verb",
                    rule.id, rule.name
                ))));
            }
        }
        Ok(())
    }

    /// The process-wide singleton catalog, parsed and validated on first use.
    pub fn global() -> &'static Catalog {
        &CATALOG
    }
}

static CATALOG: Lazy<Catalog> =
    Lazy::new(|| Catalog::load_embedded().expect("embedded risk catalog must be valid"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses_and_validates() {
        let catalog = Catalog::global();
        assert!(catalog.rules.len() >= 40);
    }

    #[test]
    fn rule_ids_are_unique() {
        let catalog = Catalog::global();
        let mut ids: Vec<i64> = catalog.rules.iter().map(|r| r.id).collect();
        ids.sort();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);
    }

    #[test]
    fn cluster_wide_secret_rule_exists() {
        let catalog = Catalog::global();
        let rule = catalog
            .rules
            .iter()
            .find(|r| r.tags.iter().any(|t| t == "ClusterWideSecretAccess"))
            .expect("cluster-wide secret access rule must exist");
        assert_eq!(rule.risk_level, RiskLevel::Critical);
        assert_eq!(rule.role_type, RoleType::ClusterRole);
    }

    #[test]
    fn cluster_admin_rule_exists() {
        let catalog = Catalog::global();
        let rule = catalog
            .rules
            .iter()
            .find(|r| r.tags.iter().any(|t| t == "ClusterAdminAccess"))
            .expect("cluster admin rule must exist");
        assert_eq!(rule.risk_level, RiskLevel::Critical);
        assert_eq!(rule.resources, vec!["*".to_string()]);
    }

    #[test]
    fn pod_exec_rule_exists() {
        let catalog = Catalog::global();
        let rule = catalog
            .rules
            .iter()
            .find(|r| r.tags.iter().any(|t| t == "PodExec"))
            .expect("pod exec rule must exist");
        assert_eq!(rule.risk_level, RiskLevel::High);
        assert!(rule.resources.iter().any(|r| r == "pods/exec"));
    }
}
