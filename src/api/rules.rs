//! Rule listing endpoints.

use super::types::ApiError;
use crate::api::AppState;
use crate::rules::StoredRule;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub rules: Vec<StoredRule>,
}

/// GET /v1/rules - All rules with trigger status, in load order.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<RulesResponse> {
    Json(RulesResponse {
        rules: state.rules.list_stored(),
    })
}

/// GET /v1/rules/:namespace/:name
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<StoredRule>, ApiError> {
    let key = format!("{}/{}", namespace, name);
    state
        .rules
        .get(&key)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Rule '{}' not found", key)))
}
