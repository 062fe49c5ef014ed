//! Repository for the `projects` table.

use sonaa_core::project::{NewProject, Project};
use sonaa_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::project::ProjectRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, client_id, project_type, project_deadline, project_description, \
                       status, completed_stages, current_stage, workflow, total_stages, \
                       completed_date, created_by, created_at, updated_at";

/// Stable ordering for listings: newest first.
const ORDER: &str = "ORDER BY created_at DESC, id DESC";

/// Provides persistence for projects and their pipelines.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewProject) -> Result<ProjectRow, sqlx::Error> {
        let pipeline = &input.pipeline;
        let query = format!(
            "INSERT INTO projects (name, client_id, project_type, project_deadline,
                 project_description, completed_stages, current_stage, workflow,
                 total_stages, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(&input.name)
            .bind(input.client_id)
            .bind(input.project_type.as_str())
            .bind(input.project_deadline)
            .bind(&input.project_description)
            .bind(Json(pipeline.completed_stages()))
            .bind(pipeline.current_stage().map(Json))
            .bind(Json(pipeline.workflow()))
            .bind(pipeline.total_stages())
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every project.
    pub async fn list(pool: &PgPool) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects {ORDER}");
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(pool).await
    }

    /// List projects the user created or is assigned to in any pipeline position.
    pub async fn list_involving(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE created_by = $1
                OR (current_stage ->> 'assigned_to')::BIGINT = $1
                OR completed_stages @> jsonb_build_array(jsonb_build_object('assigned_to', $1::BIGINT))
                OR workflow @> jsonb_build_array(jsonb_build_object('assigned_to', $1::BIGINT))
             {ORDER}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Write back every mutable field of a project in a single statement.
    ///
    /// Returns `None` if no row with the project's `id` exists.
    pub async fn save(pool: &PgPool, project: &Project) -> Result<Option<ProjectRow>, sqlx::Error> {
        let pipeline = project.pipeline();
        let query = format!(
            "UPDATE projects SET
                name = $2,
                client_id = $3,
                project_type = $4,
                project_deadline = $5,
                project_description = $6,
                status = $7,
                completed_stages = $8,
                current_stage = $9,
                workflow = $10,
                total_stages = $11,
                completed_date = $12,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(project.id)
            .bind(&project.name)
            .bind(project.client_id)
            .bind(project.project_type.as_str())
            .bind(project.project_deadline)
            .bind(&project.project_description)
            .bind(project.status().as_str())
            .bind(Json(pipeline.completed_stages()))
            .bind(pipeline.current_stage().map(Json))
            .bind(Json(pipeline.workflow()))
            .bind(pipeline.total_stages())
            .bind(project.completed_date())
            .fetch_optional(pool)
            .await
    }
}
