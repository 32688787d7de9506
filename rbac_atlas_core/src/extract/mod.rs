//! Extractors: three independent passes over the same
//! manifest sequence, each building one indexed view.

pub mod identity;
pub mod rbac;
pub mod workload;

use crate::model::manifest::Manifest;
use crate::model::rbac::Permission;
use crate::model::result::Warning;
use crate::model::{Identity, Workload};

/// The three indexed views, plus every warning any extractor raised.
pub struct ExtractedViews {
    pub identities: Vec<Identity>,
    pub workloads: Vec<Workload>,
    pub permissions: Vec<(String, String, Permission)>,
    pub warnings: Vec<Warning>,
}

/// Runs all three extractors over `manifests`. They are independent of one
/// another so ordering between them doesn't
/// matter; synthetic-identity reconciliation happens afterward in the
/// orchestrator, which is the only stage that needs all three views at once.
pub fn extract_all(manifests: &[Manifest]) -> ExtractedViews {
    let (identities, mut warnings) = identity::extract(manifests);
    let (workloads, mut workload_warnings) = workload::extract(manifests);
    let (permissions, mut rbac_warnings) = rbac::extract(manifests);

    warnings.append(&mut workload_warnings);
    warnings.append(&mut rbac_warnings);

    ExtractedViews { identities, workloads, permissions, warnings }
}
