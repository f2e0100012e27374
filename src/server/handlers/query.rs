use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::bearer_token;
use crate::auth::resolve_tenant;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub tenant_id: Option<String>,
    pub token: Option<String>,
}

/// `POST /api/query`: answer a question from the tenant's documents.
pub async fn query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let token = bearer_token(&headers).or(request.token);
    let resolved = resolve_tenant(
        state.verifier.as_ref(),
        token.as_deref(),
        request.tenant_id.as_deref(),
    )
    .await;

    let outcome = state.rag.answer(&request.question, &resolved.tenant_id).await?;
    Ok(Json(outcome))
}
