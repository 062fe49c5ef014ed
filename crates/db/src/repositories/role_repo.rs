//! Repository for the `roles` table.

use sonaa_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::{CreateRole, Role};

const COLUMNS: &str = "id, name, can_see_all_projects, can_add_project, can_add_client, \
                       can_approve_stages, can_manage_team, can_see_reports, can_manage_sales, \
                       created_at, updated_at";

/// Provides lookups and inserts for roles.
pub struct RoleRepo;

impl RoleRepo {
    pub async fn create(pool: &PgPool, input: &CreateRole) -> Result<Role, sqlx::Error> {
        let caps = &input.capabilities;
        let query = format!(
            "INSERT INTO roles (name, can_see_all_projects, can_add_project, can_add_client,
                 can_approve_stages, can_manage_team, can_see_reports, can_manage_sales)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(&input.name)
            .bind(caps.can_see_all_projects)
            .bind(caps.can_add_project)
            .bind(caps.can_add_client)
            .bind(caps.can_approve_stages)
            .bind(caps.can_manage_team)
            .bind(caps.can_see_reports)
            .bind(caps.can_manage_sales)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a role by name (case-sensitive).
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
