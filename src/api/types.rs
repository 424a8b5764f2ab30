//! Alertmanager webhook payload and API response types.

use crate::alert::AlertPayload;
use crate::reactor::ActionFailure;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATUS_FIRING: &str = "firing";
pub const ALERT_NAME_LABEL: &str = "alertname";

/// Body of an Alertmanager webhook notification (version 4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookMessage {
    pub version: String,
    pub group_key: String,
    pub truncated_alerts: u64,
    pub status: String,
    pub receiver: String,
    pub group_labels: BTreeMap<String, String>,
    pub common_labels: BTreeMap<String, String>,
    pub common_annotations: BTreeMap<String, String>,
    #[serde(rename = "externalURL")]
    pub external_url: String,
    pub alerts: Vec<WebhookAlert>,
}

/// One alert of a webhook notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookAlert {
    pub status: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub starts_at: String,
    pub ends_at: String,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
}

impl WebhookAlert {
    pub fn is_firing(&self) -> bool {
        self.status == STATUS_FIRING
    }

    pub fn alert_name(&self) -> Option<&str> {
        self.labels
            .get(ALERT_NAME_LABEL)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    /// Payload with top-level scalars, nested label/annotation maps and
    /// pre-flattened `labels.<k>` / `annotations.<k>` keys.
    pub fn to_payload(&self) -> AlertPayload {
        let mut payload = AlertPayload::new()
            .with_field("status", self.status.as_str())
            .with_field("startsAt", self.starts_at.as_str())
            .with_field("endsAt", self.ends_at.as_str())
            .with_field("generatorURL", self.generator_url.as_str())
            .with_field("fingerprint", self.fingerprint.as_str());
        for (k, v) in &self.labels {
            payload = payload.with_label(k.as_str(), v.as_str());
        }
        for (k, v) in &self.annotations {
            payload = payload.with_annotation(k.as_str(), v.as_str());
        }
        payload.flatten()
    }
}

/// Response to a processed webhook notification.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WebhookSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub alerts_processed: usize,
    pub alerts_skipped: usize,
    pub jobs_created: usize,
    pub errors: Vec<ActionFailure>,
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
}

impl ApiError {
    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
        }
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
