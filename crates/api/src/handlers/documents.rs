//! Handlers for the `/documents` resource.
//!
//! Every handler requires an authenticated caller except `update`, which
//! accepts anonymous requests and answers them with `data: null`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use notebook_core::types::DocumentId;
use notebook_db::models::document::{CreateDocument, UpdateDocument};
use serde::Deserialize;

use crate::documents::PropagationTicket;
use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::{SidebarParams, WaitParams};
use crate::response::{DataResponse, PropagatedResponse};
use crate::state::AppState;

/// Request body for `POST /documents/{id}/publish`.
#[derive(Debug, Deserialize)]
pub struct PublishInput {
    pub is_published: bool,
}

/// POST /api/v1/documents
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDocument>,
) -> AppResult<impl IntoResponse> {
    let doc = state.documents.create(&user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: doc })))
}

/// GET /api/v1/documents/sidebar
///
/// Direct, non-archived children of `parent_document`, or the caller's root
/// documents when it is omitted.
pub async fn get_sidebar(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SidebarParams>,
) -> AppResult<impl IntoResponse> {
    let docs = state
        .documents
        .get_sidebar(&user.user_id, params.parent_document)
        .await?;
    Ok(Json(DataResponse { data: docs }))
}

/// GET /api/v1/documents/trash
pub async fn get_trash(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let docs = state.documents.get_trash(&user.user_id).await?;
    Ok(Json(DataResponse { data: docs }))
}

/// GET /api/v1/documents/search
pub async fn get_search(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let docs = state.documents.get_search(&user.user_id).await?;
    Ok(Json(DataResponse { data: docs }))
}

/// GET /api/v1/documents/{id}
pub async fn get_by_id(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<impl IntoResponse> {
    let doc = state.documents.get_by_id(&user.user_id, id).await?;
    Ok(Json(DataResponse { data: doc }))
}

/// PATCH /api/v1/documents/{id}
///
/// Anonymous callers get `200 {"data": null}` and nothing is written.
pub async fn update(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    Json(input): Json<UpdateDocument>,
) -> AppResult<impl IntoResponse> {
    let caller = user.as_ref().map(|u| u.user_id.as_str());
    let doc = state.documents.update(caller, id, &input).await?;
    Ok(Json(DataResponse { data: doc }))
}

/// DELETE /api/v1/documents/{id}
///
/// Deletes the document and every descendant before responding.
pub async fn remove(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<impl IntoResponse> {
    let ack = state.documents.remove(&user.user_id, id).await?;
    Ok(Json(DataResponse { data: ack }))
}

/// POST /api/v1/documents/{id}/archive
pub async fn archive(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    Query(params): Query<WaitParams>,
) -> AppResult<impl IntoResponse> {
    let (doc, ticket) = state.documents.archive(&user.user_id, id).await?;
    Ok(propagated(&state, doc, ticket, params.wait).await)
}

/// POST /api/v1/documents/{id}/restore
pub async fn restore(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    Query(params): Query<WaitParams>,
) -> AppResult<impl IntoResponse> {
    let (doc, ticket) = state.documents.restore(&user.user_id, id).await?;
    Ok(propagated(&state, doc, ticket, params.wait).await)
}

/// POST /api/v1/documents/{id}/publish
pub async fn publish(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
    Query(params): Query<WaitParams>,
    Json(input): Json<PublishInput>,
) -> AppResult<impl IntoResponse> {
    let (doc, ticket) = state
        .documents
        .publish(&user.user_id, id, input.is_published)
        .await?;
    Ok(propagated(&state, doc, ticket, params.wait).await)
}

/// DELETE /api/v1/documents/{id}/icon
pub async fn remove_icon(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<impl IntoResponse> {
    let doc = state.documents.remove_icon(&user.user_id, id).await?;
    Ok(Json(DataResponse { data: doc }))
}

/// DELETE /api/v1/documents/{id}/cover-image
pub async fn remove_cover_image(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DocumentId>,
) -> AppResult<impl IntoResponse> {
    let doc = state.documents.remove_cover_image(&user.user_id, id).await?;
    Ok(Json(DataResponse { data: doc }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Wrap a propagating mutation's result, awaiting the ticket if asked to.
/// The document is the state right after the top-level patch.
async fn propagated<T: serde::Serialize>(
    state: &AppState,
    data: T,
    ticket: PropagationTicket,
    wait: bool,
) -> Json<PropagatedResponse<T>> {
    let propagation = state.documents.settle(ticket, wait).await;
    Json(PropagatedResponse { data, propagation })
}
