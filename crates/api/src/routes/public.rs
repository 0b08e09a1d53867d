//! Unauthenticated routes for shared documents.

use axum::routing::get;
use axum::Router;

use crate::handlers::public;
use crate::state::AppState;

/// Routes mounted at `/public/documents`.
///
/// ```text
/// GET /{id}            -> preview
/// GET /{id}/children   -> children
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(public::preview))
        .route("/{id}/children", get(public::children))
}
