//! Ingestion Orchestrator: composes resolver → renderer
//! → extractors → evaluator → formatter adapter, threading a single
//! [`CancellationToken`] and warning channel through every stage.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use log::warn;

use crate::concurrency::CancellationToken;
use crate::error::Result;
use crate::evaluate::Evaluator;
use crate::extract;
use crate::model::result::{ChartInfo, Metadata, Stage, Warning};
use crate::model::workload::DEFAULT_SERVICE_ACCOUNT;
use crate::model::{AnalysisResult, Identity};
use crate::render::{self, RenderOptions};
use crate::resolver::{self, ResolveOptions};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub concurrency: usize,
    pub follow_symlinks: bool,
    pub validate_yaml: bool,
    pub include_metadata: bool,
    pub values_override: Option<PathBuf>,
}

impl Default for AnalyzeOptions {
    fn default() -> AnalyzeOptions {
        AnalyzeOptions {
            concurrency: 4,
            follow_symlinks: false,
            validate_yaml: true,
            include_metadata: true,
            values_override: None,
        }
    }
}

/// Inserts a synthetic [`Identity`] for `(name, namespace)` if it isn't
/// already known, keeping `known` in sync for O(1) subsequent lookups.
fn ensure_identity(
    name: &str,
    namespace: &str,
    identities: &mut Vec<Identity>,
    known: &mut HashMap<(String, String), usize>,
) {
    let key = (name.to_string(), namespace.to_string());
    if !known.contains_key(&key) {
        known.insert(key, identities.len());
        identities.push(Identity::synthetic(name, namespace));
    }
}

pub struct Orchestrator;

impl Orchestrator {
    /// Runs the full pipeline against `source`, returning the joined,
    /// evaluated result plus every warning collected along the way.
    pub fn run(
        source: &str,
        opts: &AnalyzeOptions,
        token: &CancellationToken,
    ) -> Result<(AnalysisResult, Vec<Warning>)> {
        let mut warnings = Vec::new();

        let resolve_opts = ResolveOptions {
            follow_symlinks: opts.follow_symlinks,
            validate_yaml: opts.validate_yaml,
            concurrency: opts.concurrency,
        };
        let (resolved, mut resolve_warnings) = resolver::resolve(source, &resolve_opts, token)?;
        warnings.append(&mut resolve_warnings);

        let render_opts = RenderOptions {
            values_override: opts.values_override.clone(),
            include_metadata: opts.include_metadata,
            validate_output: opts.validate_yaml,
        };
        let (manifests, mut render_warnings) = render::render(&resolved, &render_opts)?;
        warnings.append(&mut render_warnings);

        let views = extract::extract_all(&manifests);
        warnings.extend(views.warnings);

        let mut identities = views.identities;
        let mut known: HashMap<(String, String), usize> = HashMap::new();
        for (idx, identity) in identities.iter().enumerate() {
            known.insert(identity.key(), idx);
        }

        // Synthetic identities for any SA referenced by a workload or a
        // permission binding but never declared by a `ServiceAccount`
        // manifest.
        for workload in &views.workloads {
            ensure_identity(&workload.service_account, &workload.namespace, &mut identities, &mut known);
        }
        for (sa, ns, _) in &views.permissions {
            if ns != "*" {
                ensure_identity(sa, ns, &mut identities, &mut known);
            }
        }
        // A workload's own namespace is always where its account lives;
        // `default` is only synthesized on demand above, never eagerly.
        let _ = DEFAULT_SERVICE_ACCOUNT;

        let evaluator = Evaluator::global();
        let permission_pairs: Vec<(String, crate::model::rbac::Permission)> = views
            .permissions
            .into_iter()
            .map(|(sa, _ns, perm)| (sa, perm))
            .collect();
        let permissions = evaluator.evaluate_all(&permission_pairs);

        let chart_info: Option<ChartInfo> = None; // populated by the chart renderer's own warning/metadata path when wired by the CLI formatter.

        let metadata = Metadata {
            version: VERSION.to_string(),
            name: None,
            source: source.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            chart: chart_info,
        };

        if token.is_cancelled() {
            warn!("analysis of '{}' observed cancellation after pipeline completion", source);
            return Err(crate::error::Error::from(crate::error::ErrorKind::Cancelled).into());
        }

        let result = AnalysisResult {
            metadata,
            identities,
            permissions,
            workloads: views.workloads,
        };

        Ok((result, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &std::path::Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn end_to_end_secrets_reader_clusterrole_scenario() {
        let dir = std::env::temp_dir()
            .join(format!("rbac-atlas-e2e-secrets-{:?}", std::thread::current().id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        write_file(
            &dir,
            "manifests.yaml",
            "kind: ClusterRole\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: secrets-reader\nrules:\n  - apiGroups: [\"\"]\n    resources: [\"secrets\"]\n    verbs: [\"get\", \"list\", \"watch\"]\n---\nkind: ClusterRoleBinding\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: bind\nroleRef:\n  kind: ClusterRole\n  name: secrets-reader\nsubjects:\n  - kind: ServiceAccount\n    name: default\n    namespace: ns-a\n",
        );

        let opts = AnalyzeOptions::default();
        let token = CancellationToken::new();
        let (result, warnings) = Orchestrator::run(
            dir.join("manifests.yaml").to_str().unwrap(),
            &opts,
            &token,
        )
        .expect("should analyze");
        assert!(warnings.is_empty());
        assert_eq!(result.permissions.len(), 1);
        let perm = &result.permissions[0];
        assert_eq!(perm.risk_level, crate::model::risk::RiskLevel::Critical);
        assert!(perm.tags.iter().any(|t| t == "ClusterWideSecretAccess"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_service_account_produces_synthetic_identity() {
        let dir = std::env::temp_dir()
            .join(format!("rbac-atlas-e2e-synthetic-{:?}", std::thread::current().id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        write_file(
            &dir,
            "manifests.yaml",
            "kind: Deployment\napiVersion: apps/v1\nmetadata:\n  name: web\n  namespace: ns-a\nspec:\n  template:\n    spec:\n      serviceAccountName: svc-x\n      containers:\n        - name: app\n",
        );

        let opts = AnalyzeOptions::default();
        let token = CancellationToken::new();
        let (result, _) = Orchestrator::run(
            dir.join("manifests.yaml").to_str().unwrap(),
            &opts,
            &token,
        )
        .expect("should analyze");

        assert_eq!(result.identities.len(), 1);
        assert_eq!(result.identities[0].name, "svc-x");
        assert_eq!(result.identities[0].namespace, "ns-a");
        assert!(result.identities[0].automount_token);
        assert!(result.permissions.is_empty());

        fs::remove_dir_all(&dir).ok();
    }
}
