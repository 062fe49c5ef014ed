pub mod auth;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                      login (public)
/// /auth/me                         current user (requires auth)
///
/// /projects                        list, create
/// /projects/{id}                   get, update
/// /projects/{id}/submit            submit current stage (assignee)
/// /projects/{id}/approve           approve current stage (can_approve_stages)
/// /projects/{id}/revision          request revision (can_approve_stages)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
}
