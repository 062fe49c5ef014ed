//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// POST   /{id}/submit      -> submit_stage
/// POST   /{id}/approve     -> approve_stage
/// POST   /{id}/revision    -> request_revision
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id).put(project::update))
        .route("/{id}/submit", post(project::submit_stage))
        .route("/{id}/approve", post(project::approve_stage))
        .route("/{id}/revision", post(project::request_revision))
}
