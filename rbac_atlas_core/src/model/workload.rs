use serde::{Deserialize, Serialize};

/// Workload kinds this crate recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadType {
    Pod,
    Deployment,
    DaemonSet,
    StatefulSet,
    Job,
    CronJob,
    ReplicaSet,
    ReplicationController,
}

impl WorkloadType {
    pub fn from_kind_str(kind: &str) -> Option<WorkloadType> {
        Some(match kind {
            "Pod" => WorkloadType::Pod,
            "Deployment" => WorkloadType::Deployment,
            "DaemonSet" => WorkloadType::DaemonSet,
            "StatefulSet" => WorkloadType::StatefulSet,
            "Job" => WorkloadType::Job,
            "CronJob" => WorkloadType::CronJob,
            "ReplicaSet" => WorkloadType::ReplicaSet,
            "ReplicationController" => WorkloadType::ReplicationController,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadType::Pod => "Pod",
            WorkloadType::Deployment => "Deployment",
            WorkloadType::DaemonSet => "DaemonSet",
            WorkloadType::StatefulSet => "StatefulSet",
            WorkloadType::Job => "Job",
            WorkloadType::CronJob => "CronJob",
            WorkloadType::ReplicaSet => "ReplicaSet",
            WorkloadType::ReplicationController => "ReplicationController",
        }
    }
}

/// A single container entry within a workload's pod template.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A workload running under a particular service account.
///
/// Keyed by `(name, namespace, serviceAccount)`; a
/// workload omitting `spec.serviceAccountName` is attributed to the
/// synthetic `default` account in its namespace.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub service_account: String,
    pub workload_type: WorkloadType,
    pub containers: Vec<Container>,
}

impl Serialize for WorkloadType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// The default service account name used when a workload doesn't specify
/// one (mirroring Kubernetes' own default).
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";
