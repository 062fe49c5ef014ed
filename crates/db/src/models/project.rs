//! Project row model.
//!
//! Projects are created from a validated [`NewProject`] and written back
//! whole from a [`Project`], so no create/update DTOs live here.

use sonaa_core::error::CoreError;
use sonaa_core::pipeline::Pipeline;
use sonaa_core::project::{Project, ProjectRecord, ProjectStatus, ProjectType};
use sonaa_core::stage::Stage;
use sonaa_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A project row from the `projects` table. Stage lists are JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub name: String,
    pub client_id: DbId,
    pub project_type: String,
    pub project_deadline: Timestamp,
    pub project_description: Option<String>,
    pub status: String,
    pub completed_stages: Json<Vec<Stage>>,
    pub current_stage: Option<Json<Stage>>,
    pub workflow: Json<Vec<Stage>>,
    pub total_stages: i32,
    pub completed_date: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectRow {
    /// Rebuild the aggregate, rejecting rows that break its invariants.
    pub fn into_project(self) -> Result<Project, CoreError> {
        let pipeline = Pipeline::restore(
            self.completed_stages.0,
            self.current_stage.map(|Json(stage)| stage),
            self.workflow.0,
            self.total_stages,
        )?;

        Project::try_from(ProjectRecord {
            id: self.id,
            name: self.name,
            client_id: self.client_id,
            project_type: ProjectType::from_str_db(&self.project_type)?,
            project_deadline: self.project_deadline,
            project_description: self.project_description,
            status: ProjectStatus::from_str_db(&self.status)?,
            pipeline,
            completed_date: self.completed_date,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
