use super::{
    convert_resources, convert_volumes, Container, JobMetadata, JobSpec, OwnerReference,
    PodSpec, PodTemplate, RestartPolicy, SynthesisError, SynthesizedJob, CONTAINER_NAME,
    DEFAULT_TTL_SECONDS, JOB_API_VERSION, JOB_COMPONENT_VALUE, JOB_KIND, JOB_NAME_VALUE,
    LABEL_ACTION_NAME, LABEL_ALERT_NAME, LABEL_COMPONENT, LABEL_NAME, LABEL_OWNER,
};
use crate::alert::AlertPayload;
use crate::env::EnvResolver;
use crate::rules::{Action, ReactionRule, RULE_API_VERSION, RULE_KIND};
use crate::sanitize::{sanitize_label_value, unique_job_name};
use chrono::Utc;
use std::collections::BTreeMap;

/// Builds job descriptions from rule actions.
#[derive(Clone)]
pub struct JobSynthesizer {
    env: EnvResolver,
    default_namespace: String,
    ttl_seconds_after_finished: u32,
}

impl JobSynthesizer {
    pub fn new(env: EnvResolver, default_namespace: impl Into<String>) -> Self {
        Self {
            env,
            default_namespace: default_namespace.into(),
            ttl_seconds_after_finished: DEFAULT_TTL_SECONDS,
        }
    }

    pub fn with_ttl(mut self, seconds: u32) -> Self {
        self.ttl_seconds_after_finished = seconds;
        self
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Synthesize the job for one action of a matched rule.
    ///
    /// The job lands in the rule's namespace and carries the ownership
    /// labels used to trace it back to the rule, action and alert.
    pub async fn synthesize(
        &self,
        rule: &ReactionRule,
        action: &Action,
        payload: &AlertPayload,
    ) -> Result<SynthesizedJob, SynthesisError> {
        let namespace = rule.namespace_or(&self.default_namespace).to_string();

        let name = unique_job_name(&rule.name, &action.name, Utc::now().timestamp()).ok_or_else(
            || SynthesisError::EmptyName {
                rule: rule.name.clone(),
                action: action.name.clone(),
            },
        )?;

        let env = self.env.resolve(&namespace, &action.env, payload).await?;
        let resources = convert_resources(action.resources.as_ref())?;
        let volumes = convert_volumes(&rule.volumes)?;

        let container = Container {
            name: CONTAINER_NAME.to_string(),
            image: action.image.clone(),
            command: action.command.clone(),
            args: action.args.clone(),
            env,
            resources,
            volume_mounts: action.volume_mounts.clone(),
        };

        let owner_references = rule
            .uid
            .as_ref()
            .map(|uid| OwnerReference {
                api_version: RULE_API_VERSION.to_string(),
                kind: RULE_KIND.to_string(),
                name: rule.name.clone(),
                uid: uid.clone(),
            })
            .into_iter()
            .collect();

        Ok(SynthesizedJob {
            api_version: JOB_API_VERSION.to_string(),
            kind: JOB_KIND.to_string(),
            metadata: JobMetadata {
                name,
                namespace,
                labels: job_labels(rule, action),
                owner_references,
            },
            spec: JobSpec {
                ttl_seconds_after_finished: self.ttl_seconds_after_finished,
                template: PodTemplate {
                    spec: PodSpec {
                        restart_policy: RestartPolicy::Never,
                        service_account_name: action
                            .service_account
                            .clone()
                            .filter(|s| !s.is_empty()),
                        volumes,
                        containers: vec![container],
                    },
                },
            },
        })
    }
}

fn job_labels(rule: &ReactionRule, action: &Action) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_NAME.to_string(), JOB_NAME_VALUE.to_string()),
        (LABEL_COMPONENT.to_string(), JOB_COMPONENT_VALUE.to_string()),
        (
            LABEL_ALERT_NAME.to_string(),
            sanitize_label_value(&rule.alert_name),
        ),
        (
            LABEL_ACTION_NAME.to_string(),
            sanitize_label_value(&action.name),
        ),
        (LABEL_OWNER.to_string(), sanitize_label_value(&rule.name)),
    ])
}
