//! Capability-gated extractors.
//!
//! Each extractor wraps [`CurrentActor`] and rejects requests whose role
//! lacks the named capability, before any project is loaded.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sonaa_core::access::{Actor, Capability};

use super::auth::CurrentActor;
use crate::error::AppError;
use crate::state::AppState;

async fn require(
    parts: &mut Parts,
    state: &AppState,
    capability: Capability,
) -> Result<Actor, AppError> {
    let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;
    if let Err(e) = actor.require(capability) {
        tracing::warn!(
            user_id = actor.user_id,
            capability = capability.as_str(),
            "Capability check failed"
        );
        return Err(e.into());
    }
    Ok(actor)
}

/// Requires `can_add_project`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn create(RequireProjectCreator(actor): RequireProjectCreator) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireProjectCreator(pub Actor);

impl FromRequestParts<AppState> for RequireProjectCreator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Capability::AddProject)
            .await
            .map(RequireProjectCreator)
    }
}

/// Requires `can_approve_stages`. Rejects with 403 Forbidden otherwise.
pub struct RequireStageReviewer(pub Actor);

impl FromRequestParts<AppState> for RequireStageReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Capability::ApproveStages)
            .await
            .map(RequireStageReviewer)
    }
}
