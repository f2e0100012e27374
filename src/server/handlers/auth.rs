use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// `POST /api/auth/verify`: exchange an identity-provider token for the
/// user record. Invalid tokens are a 401 here, unlike the request paths
/// where a token is optional.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.verifier.verify(&request.token).await?;
    Ok(Json(user))
}
