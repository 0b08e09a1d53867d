use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::WaitParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/propagations/{id}
///
/// Only the user who started the propagation may read its ticket.
pub async fn get_ticket(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<WaitParams>,
) -> AppResult<impl IntoResponse> {
    let ticket = state
        .documents
        .ticket(&user.user_id, id, params.wait)
        .await?;
    Ok(Json(DataResponse { data: ticket }))
}
