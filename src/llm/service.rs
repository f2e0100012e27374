use std::sync::Arc;

use super::provider::ChatProvider;
use super::types::GenerationRequest;
use crate::core::errors::ApiError;

/// Runs completion requests against an ordered model fallback list.
///
/// Models are tried in order; the first success wins. Only when every model
/// has failed is the last error surfaced. This is the system's only retry
/// logic.
#[derive(Clone)]
pub struct GeneratorService {
    provider: Arc<dyn ChatProvider>,
    models: Vec<String>,
}

impl GeneratorService {
    pub fn new(provider: Arc<dyn ChatProvider>, models: Vec<String>) -> Self {
        Self { provider, models }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        let mut last_error: Option<ApiError> = None;

        for model in &self.models {
            match self.provider.chat(request, model).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    tracing::warn!(
                        "Generation with model {} failed: {}; trying next",
                        model,
                        err
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::Internal("no generator models configured".to_string())))
    }
}
