use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::bearer_token;
use crate::auth::resolve_tenant;
use crate::core::errors::ApiError;
use crate::ingest::{extension_of, DocumentMeta};
use crate::rag::store::DeletionReport;
use crate::state::AppState;

/// `POST /api/upload`: multipart upload. Extract, chunk, embed, store.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut filename: Option<String> = None;
    let mut contents: Option<Vec<u8>> = None;
    let mut explicit_tenant: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                filename = field.file_name().map(|name| name.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                contents = Some(bytes.to_vec());
            }
            "tenant_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.to_string()))?;
                explicit_tenant = Some(value);
            }
            _ => {}
        }
    }

    let filename = sanitize_filename(filename.as_deref())?;
    let contents =
        contents.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    let file_type = extension_of(&filename);
    if !state.settings.allowed_extensions.contains(&file_type) {
        return Err(ApiError::BadRequest(format!(
            "File type {} not allowed. Allowed: {}",
            if file_type.is_empty() { "(none)" } else { &file_type },
            state.settings.allowed_extensions.join(",")
        )));
    }

    if contents.len() > state.settings.max_file_size {
        return Err(ApiError::BadRequest(format!(
            "File size exceeds maximum {} bytes",
            state.settings.max_file_size
        )));
    }

    let token = bearer_token(&headers);
    let resolved = resolve_tenant(
        state.verifier.as_ref(),
        token.as_deref(),
        explicit_tenant.as_deref(),
    )
    .await;

    let uploads_dir = state.settings.data_dir.join("uploads");
    std::fs::create_dir_all(&uploads_dir).map_err(ApiError::internal)?;
    let file_path = uploads_dir.join(&filename);
    std::fs::write(&file_path, &contents).map_err(ApiError::internal)?;

    match ingest_document(&state, &file_path, &filename, &file_type, &resolved.tenant_id).await {
        Ok(chunks_created) => {
            tracing::info!(
                "Processed {} into {} chunks for tenant {}",
                filename,
                chunks_created,
                resolved.tenant_id
            );
            Ok(Json(json!({
                "message": "Document processed successfully",
                "filename": filename,
                "chunks_created": chunks_created,
                "tenant_id": resolved.tenant_id,
                "tenant_resolution": resolved.resolution,
            })))
        }
        Err(err) => {
            let _ = std::fs::remove_file(&file_path);
            Err(err)
        }
    }
}

async fn ingest_document(
    state: &AppState,
    file_path: &Path,
    filename: &str,
    file_type: &str,
    tenant_id: &str,
) -> Result<usize, ApiError> {
    let text = state.extractor.extract(file_path, file_type)?;
    if text.is_empty() {
        return Err(ApiError::Internal(
            "no text extracted from document".to_string(),
        ));
    }

    let meta = DocumentMeta {
        filename: filename.to_string(),
        tenant_id: tenant_id.to_string(),
        file_type: file_type.to_string(),
        source_char_count: text.chars().count(),
    };
    let chunks = state.chunker.chunk(&text, &meta);

    let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
    let vectors = state.embedder.embed(&texts).await?;

    state.store.store(&chunks, &vectors, tenant_id).await
}

fn sanitize_filename(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("missing filename".to_string()))?;
    // Keep only the final path component; uploads must not escape the
    // uploads directory.
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .ok_or_else(|| ApiError::BadRequest(format!("invalid filename: {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub tenant_id: Option<String>,
    pub filename: Option<String>,
    pub token: Option<String>,
}

/// `POST /api/documents/clear`: delete a tenant's chunks, optionally
/// scoped to one filename. Deletion failure is reported, not raised.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ClearRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers).or(request.token);
    let resolved = resolve_tenant(
        state.verifier.as_ref(),
        token.as_deref(),
        request.tenant_id.as_deref(),
    )
    .await;

    let report = DeletionReport::from_result(
        state
            .store
            .delete(&resolved.tenant_id, request.filename.as_deref())
            .await,
    );

    Ok(Json(json!({
        "tenant_id": resolved.tenant_id,
        "filename": request.filename,
        "chunks_deleted": report.chunks_deleted,
        "outcome": report.outcome,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tenant_id: Option<String>,
}

/// `GET /api/documents`: placeholder listing.
pub async fn list(
    State(_state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    Json(json!({
        "message": "Document listing not fully implemented yet",
        "tenant_id": query.tenant_id.unwrap_or_else(|| "default".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename(Some("report.txt")).unwrap(), "report.txt");
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename(Some("../../etc/passwd.txt")).unwrap(),
            "passwd.txt"
        );
    }

    #[test]
    fn sanitize_rejects_empty_and_missing() {
        assert!(sanitize_filename(None).is_err());
        assert!(sanitize_filename(Some("")).is_err());
        assert!(sanitize_filename(Some("..")).is_err());
    }
}
