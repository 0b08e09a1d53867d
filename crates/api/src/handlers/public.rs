//! Handlers for unauthenticated reads of shared documents.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use notebook_core::types::DocumentId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/public/documents/{id}
///
/// Returns 404 `NOT_AVAILABLE` for documents that are unpublished or archived.
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<impl IntoResponse> {
    let doc = state.documents.get_by_id_preview(id).await?;
    Ok(Json(DataResponse { data: doc }))
}

/// GET /api/v1/public/documents/{id}/children
pub async fn children(
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<impl IntoResponse> {
    let docs = state.documents.get_children(id).await?;
    Ok(Json(DataResponse { data: docs }))
}
