//! Alertmanager webhook ingestion.

use super::types::{ApiError, WebhookMessage, WebhookSummary};
use crate::api::AppState;
use crate::logging::generate_delivery_id;
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// POST /webhook
pub async fn handle(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WebhookSummary>, ApiError> {
    process(state, None, body).await
}

/// POST /webhook/:receiver
pub async fn handle_receiver(
    State(state): State<Arc<AppState>>,
    Path(receiver): Path<String>,
    body: Bytes,
) -> Result<Json<WebhookSummary>, ApiError> {
    process(state, Some(receiver), body).await
}

async fn process(
    state: Arc<AppState>,
    receiver: Option<String>,
    body: Bytes,
) -> Result<Json<WebhookSummary>, ApiError> {
    let message: WebhookMessage = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

    let delivery_id = generate_delivery_id();
    let span = tracing::info_span!(
        "webhook",
        delivery_id = %delivery_id,
        receiver = receiver.as_deref().unwrap_or(message.receiver.as_str()),
        group_key = %message.group_key,
    );

    let summary = async {
        info!(alerts = message.alerts.len(), status = %message.status, "Received webhook");

        let mut summary = WebhookSummary {
            receiver,
            ..Default::default()
        };

        for alert in &message.alerts {
            if !alert.is_firing() {
                debug!(
                    fingerprint = %alert.fingerprint,
                    status = %alert.status,
                    "Skipping alert that is not firing"
                );
                metrics::counter!("karo_alerts_received_total", "status" => "resolved")
                    .increment(1);
                summary.alerts_skipped += 1;
                continue;
            }

            let Some(alert_name) = alert.alert_name() else {
                warn!(fingerprint = %alert.fingerprint, "Skipping alert without alertname label");
                metrics::counter!("karo_alerts_received_total", "status" => "skipped")
                    .increment(1);
                summary.alerts_skipped += 1;
                continue;
            };

            metrics::counter!("karo_alerts_received_total", "status" => "firing").increment(1);
            let report = state
                .reactor
                .handle_alert(alert_name, &alert.to_payload())
                .await;

            summary.alerts_processed += 1;
            summary.jobs_created += report.jobs_created.len();
            summary.errors.extend(report.failures);
        }

        info!(
            processed = summary.alerts_processed,
            skipped = summary.alerts_skipped,
            jobs_created = summary.jobs_created,
            errors = summary.errors.len(),
            "Webhook processed"
        );
        summary
    }
    .instrument(span)
    .await;

    Ok(Json(summary))
}
