use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::bearer_token;
use crate::auth::resolve_tenant;
use crate::core::errors::ApiError;
use crate::decision::DecisionMode;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub query: String,
    /// Parsed by hand so an unknown mode is a 400 before any retrieval.
    pub mode: String,
    pub tenant_id: Option<String>,
    pub token: Option<String>,
}

/// `POST /api/decision-mode`: run one of the fixed analytical templates.
pub async fn decision_mode(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mode: DecisionMode = request.mode.parse()?;

    let token = bearer_token(&headers).or(request.token);
    let resolved = resolve_tenant(
        state.verifier.as_ref(),
        token.as_deref(),
        request.tenant_id.as_deref(),
    )
    .await;

    let outcome = state
        .decision
        .decide(&request.query, mode, &resolved.tenant_id)
        .await?;
    Ok(Json(outcome))
}
