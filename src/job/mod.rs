//! Job model and synthesis.
//!
//! A [`SynthesizedJob`] is the platform-neutral description of one action
//! run: identity, ownership labels, a single container and its volumes.
//! [`JobSynthesizer`] builds one from a rule, an action and the alert that
//! triggered it.

mod error;
mod quantity;
mod synthesizer;
mod volume;

pub use error::SynthesisError;
pub use quantity::{Quantity, QuantityError};
pub use synthesizer::JobSynthesizer;
pub use volume::{convert_resources, convert_volumes};

use crate::env::ResolvedEnv;
use crate::rules::{
    ConfigMapVolumeSource, HostPathVolumeSource, PersistentVolumeClaimVolumeSource,
    SecretVolumeSource, VolumeMount,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const JOB_API_VERSION: &str = "batch/v1";
pub const JOB_KIND: &str = "Job";
pub const CONTAINER_NAME: &str = "action";
pub const DEFAULT_TTL_SECONDS: u32 = 300;

pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";
pub const LABEL_ALERT_NAME: &str = "alert-reaction/alert-name";
pub const LABEL_ACTION_NAME: &str = "alert-reaction/action-name";
pub const LABEL_OWNER: &str = "alert-reaction/owner";

pub const JOB_NAME_VALUE: &str = "alert-reaction-job";
pub const JOB_COMPONENT_VALUE: &str = "job";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedJob {
    pub api_version: String,
    pub kind: String,
    pub metadata: JobMetadata,
    pub spec: JobSpec,
}

impl SynthesizedJob {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    /// The single action container.
    pub fn container(&self) -> Option<&Container> {
        self.spec.template.spec.containers.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

/// Ties a job to the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub ttl_seconds_after_finished: u32,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub restart_policy: RestartPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<PodVolume>,
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
    Never,
    OnFailure,
    Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<ResolvedEnv>,
    #[serde(default)]
    pub resources: ContainerResources,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

impl Container {
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerResources {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, Quantity>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, Quantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodVolume {
    pub name: String,
    #[serde(flatten)]
    pub source: PodVolumeSource,
}

/// Exactly one backing source per pod volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PodVolumeSource {
    ConfigMap(ConfigMapVolumeSource),
    Secret(SecretVolumeSource),
    EmptyDir(EmptyDirVolume),
    PersistentVolumeClaim(PersistentVolumeClaimVolumeSource),
    HostPath(HostPathVolumeSource),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyDirVolume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<Quantity>,
}
