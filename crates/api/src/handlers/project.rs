//! Handlers for the `/projects` resource and its stage workflow actions.
//!
//! Every handler loads the project, runs one aggregate operation with the
//! acting user, and writes the whole project back in a single save. A
//! rejected operation returns before anything is persisted.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sonaa_core::access::{self, Capability};
use sonaa_core::error::CoreError;
use sonaa_core::pipeline::{Advance, Pipeline};
use sonaa_core::project::{
    NewProject, Project, ProjectDraft, ProjectPatch, ProjectStatus, ProjectType,
};
use sonaa_core::stage::Submission;
use sonaa_core::types::{DbId, Timestamp};

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, JsonOrDefault};
use crate::middleware::auth::CurrentActor;
use crate::middleware::rbac::{RequireProjectCreator, RequireStageReviewer};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /projects/{id}/revision`.
///
/// `notes` may be absent or `null`; the aggregate rejects it as missing.
#[derive(Debug, Default, Deserialize)]
pub struct RevisionRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// A project as returned by the API, with derived fields.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: DbId,
    pub name: String,
    pub client_id: DbId,
    pub project_type: ProjectType,
    pub project_deadline: Timestamp,
    pub project_description: Option<String>,
    /// Reported status; `overdue` when the deadline has passed.
    pub status: ProjectStatus,
    #[serde(flatten)]
    pub pipeline: Pipeline,
    pub progress_percent: f64,
    pub completed_date: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectResponse {
    pub fn new(project: &Project, now: Timestamp) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            client_id: project.client_id,
            project_type: project.project_type,
            project_deadline: project.project_deadline,
            project_description: project.project_description.clone(),
            status: project.reported_status(now),
            pipeline: project.pipeline().clone(),
            progress_percent: project.progress_percent(),
            completed_date: project.completed_date(),
            created_by: project.created_by,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}

async fn load(state: &AppState, id: DbId) -> AppResult<Project> {
    state
        .projects
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn persist(state: &AppState, project: &Project) -> AppResult<Json<ProjectResponse>> {
    let saved = state
        .projects
        .save(project)
        .await?
        .ok_or_else(|| not_found(project.id))?;
    Ok(Json(ProjectResponse::new(&saved, Utc::now())))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireProjectCreator(actor): RequireProjectCreator,
    ApiJson(input): ApiJson<ProjectDraft>,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let new_project = NewProject::from_draft(&actor, input)?;
    let project = state.projects.insert(new_project).await?;

    tracing::info!(
        user_id = actor.user_id,
        project_id = project.id,
        total_stages = project.pipeline().total_stages(),
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new(&project, Utc::now())),
    ))
}

/// GET /api/v1/projects
///
/// Users with `can_see_all_projects` get everything; everyone else gets the
/// projects they created or are assigned to.
pub async fn list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<Vec<ProjectResponse>>> {
    let projects = if actor.has(Capability::SeeAllProjects) {
        state.projects.list_all().await?
    } else {
        state.projects.list_involving(actor.user_id).await?
    };

    let now = Utc::now();
    Ok(Json(
        projects
            .iter()
            .map(|p| ProjectResponse::new(p, now))
            .collect(),
    ))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProjectResponse>> {
    let project = load(&state, id).await?;
    if let Err(e) = access::ensure_can_view(&actor, &project) {
        tracing::warn!(user_id = actor.user_id, project_id = id, "Project view denied");
        return Err(e.into());
    }
    Ok(Json(ProjectResponse::new(&project, Utc::now())))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<DbId>,
    ApiJson(input): ApiJson<ProjectPatch>,
) -> AppResult<Json<ProjectResponse>> {
    let mut project = load(&state, id).await?;
    let replaces_queue = input.workflow.is_some();
    project.apply_patch(&actor, input)?;

    tracing::info!(
        user_id = actor.user_id,
        project_id = id,
        replaces_queue,
        "Project updated"
    );

    persist(&state, &project).await
}

// ---------------------------------------------------------------------------
// Stage workflow
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/submit
pub async fn submit_stage(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<DbId>,
    JsonOrDefault(input): JsonOrDefault<Submission>,
) -> AppResult<Json<ProjectResponse>> {
    let mut project = load(&state, id).await?;
    let stage = project.submit_stage(&actor, input)?.name.clone();

    tracing::info!(
        user_id = actor.user_id,
        project_id = id,
        stage = %stage,
        "Stage submitted for review"
    );

    persist(&state, &project).await
}

/// POST /api/v1/projects/{id}/approve
pub async fn approve_stage(
    State(state): State<AppState>,
    RequireStageReviewer(actor): RequireStageReviewer,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProjectResponse>> {
    let mut project = load(&state, id).await?;
    let advance = project.approve_stage(&actor, Utc::now())?;

    match advance {
        Advance::Promoted => tracing::info!(
            user_id = actor.user_id,
            project_id = id,
            next_stage = project.pipeline().current_stage().map(|s| s.name.as_str()),
            "Stage approved"
        ),
        Advance::Exhausted => tracing::info!(
            user_id = actor.user_id,
            project_id = id,
            "Final stage approved, project completed"
        ),
    }

    persist(&state, &project).await
}

/// POST /api/v1/projects/{id}/revision
pub async fn request_revision(
    State(state): State<AppState>,
    RequireStageReviewer(actor): RequireStageReviewer,
    Path(id): Path<DbId>,
    JsonOrDefault(input): JsonOrDefault<RevisionRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let mut project = load(&state, id).await?;
    let notes = input.notes.as_deref().unwrap_or_default();
    let stage = project.request_revision(&actor, notes)?.name.clone();

    tracing::info!(
        user_id = actor.user_id,
        project_id = id,
        stage = %stage,
        "Revision requested"
    );

    persist(&state, &project).await
}
