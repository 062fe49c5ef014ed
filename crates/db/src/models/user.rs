//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sonaa_core::access::{Actor, Capabilities};
use sonaa_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A user joined with its role's capability flags.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: Option<DbId>,
    /// `None` when the user has no role.
    pub role_name: Option<String>,
    pub can_see_all_projects: bool,
    pub can_add_project: bool,
    pub can_add_client: bool,
    pub can_approve_stages: bool,
    pub can_manage_team: bool,
    pub can_see_reports: bool,
    pub can_manage_sales: bool,
    pub created_at: Timestamp,
}

impl UserAccount {
    /// Capabilities granted by the user's role. A user without a role has none.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_see_all_projects: self.can_see_all_projects,
            can_add_project: self.can_add_project,
            can_add_client: self.can_add_client,
            can_approve_stages: self.can_approve_stages,
            can_manage_team: self.can_manage_team,
            can_see_reports: self.can_see_reports,
            can_manage_sales: self.can_manage_sales,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.capabilities())
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role_name.clone(),
            permissions: self.capabilities(),
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    /// Resolved role name (e.g. `"Admin"`).
    pub role: Option<String>,
    pub permissions: Capabilities,
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: Option<DbId>,
}
