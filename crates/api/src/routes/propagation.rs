use axum::routing::get;
use axum::Router;

use crate::handlers::propagation;
use crate::state::AppState;

/// Routes mounted at `/propagations`.
///
/// ```text
/// GET /{id}   -> get_ticket (?wait=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(propagation::get_ticket))
}
