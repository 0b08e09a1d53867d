//! Route definitions for the `/documents` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Routes mounted at `/documents`.
///
/// ```text
/// POST   /                     -> create
/// GET    /sidebar              -> get_sidebar (?parent_document=)
/// GET    /trash                -> get_trash
/// GET    /search               -> get_search
/// GET    /{id}                 -> get_by_id
/// PATCH  /{id}                 -> update
/// DELETE /{id}                 -> remove
/// POST   /{id}/archive         -> archive
/// POST   /{id}/restore         -> restore
/// POST   /{id}/publish         -> publish
/// DELETE /{id}/icon            -> remove_icon
/// DELETE /{id}/cover-image     -> remove_cover_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(documents::create))
        .route("/sidebar", get(documents::get_sidebar))
        .route("/trash", get(documents::get_trash))
        .route("/search", get(documents::get_search))
        .route(
            "/{id}",
            get(documents::get_by_id)
                .patch(documents::update)
                .delete(documents::remove),
        )
        .route("/{id}/archive", post(documents::archive))
        .route("/{id}/restore", post(documents::restore))
        .route("/{id}/publish", post(documents::publish))
        .route("/{id}/icon", delete(documents::remove_icon))
        .route("/{id}/cover-image", delete(documents::remove_cover_image))
}
