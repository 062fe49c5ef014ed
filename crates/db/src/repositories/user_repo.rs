//! Repository for the `users` table.
//!
//! Reads always join the user's role so callers get capability flags in
//! one round trip. A user without a role gets every flag `false`.

use sonaa_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UserAccount};

const SELECT_ACCOUNT: &str = "SELECT u.id, u.name, u.email, u.password_hash, u.role_id, \
        r.name AS role_name, \
        COALESCE(r.can_see_all_projects, FALSE) AS can_see_all_projects, \
        COALESCE(r.can_add_project, FALSE) AS can_add_project, \
        COALESCE(r.can_add_client, FALSE) AS can_add_client, \
        COALESCE(r.can_approve_stages, FALSE) AS can_approve_stages, \
        COALESCE(r.can_manage_team, FALSE) AS can_manage_team, \
        COALESCE(r.can_see_reports, FALSE) AS can_see_reports, \
        COALESCE(r.can_manage_sales, FALSE) AS can_manage_sales, \
        u.created_at \
    FROM users u LEFT JOIN roles r ON r.id = u.role_id";

/// Provides user lookups and inserts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the account with its role resolved.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<UserAccount, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (name, email, password_hash, role_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.role_id)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserAccount>, sqlx::Error> {
        let query = format!("{SELECT_ACCOUNT} WHERE u.id = $1");
        sqlx::query_as::<_, UserAccount>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        let query = format!("{SELECT_ACCOUNT} WHERE LOWER(u.email) = LOWER($1)");
        sqlx::query_as::<_, UserAccount>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
