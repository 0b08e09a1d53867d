pub mod documents;
pub mod health;
pub mod propagation;
pub mod public;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /documents                                 create (POST)
/// /documents/sidebar                         sidebar listing (?parent_document=)
/// /documents/trash                           archived documents
/// /documents/search                          non-archived documents
/// /documents/{id}                            get, update (PATCH), remove (DELETE)
/// /documents/{id}/archive                    archive subtree (POST, ?wait=)
/// /documents/{id}/restore                    restore subtree (POST, ?wait=)
/// /documents/{id}/publish                    set publish flag on subtree (POST, ?wait=)
/// /documents/{id}/icon                       clear icon (DELETE)
/// /documents/{id}/cover-image                clear cover image (DELETE)
///
/// /public/documents/{id}                     preview (no auth)
/// /public/documents/{id}/children            published children (no auth)
///
/// /propagations/{id}                         propagation ticket (?wait=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router())
        .nest("/public/documents", public::router())
        .nest("/propagations", propagation::router())
}
