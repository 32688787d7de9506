//! Typed representation of the data this crate passes between stages.
//!
//! Split across a handful of small modules rather than one giant file.

pub mod manifest;
pub mod identity;
pub mod workload;
pub mod rbac;
pub mod risk;
pub mod result;

pub use identity::Identity;
pub use manifest::{Manifest, ManifestKind};
pub use rbac::{
    Binding, ClusterRole, Permission, PolicyRule, Role, RoleRef, RoleType, Subject,
};
pub use result::{AnalysisResult, EvaluatedPermission, Metadata, ChartInfo, Stage, Warning};
pub use risk::RiskLevel;
pub use workload::{Container, Workload, WorkloadType};
