use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g. "openai-compatible").
    fn name(&self) -> &str;

    /// Run a completion request against a specific backend model.
    async fn chat(&self, request: &GenerationRequest, model_id: &str) -> Result<String, ApiError>;
}
