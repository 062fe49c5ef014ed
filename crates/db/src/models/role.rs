//! Role entity model and DTOs.

use serde::{Deserialize, Serialize};
use sonaa_core::access::Capabilities;
use sonaa_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A role row from the `roles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub can_see_all_projects: bool,
    pub can_add_project: bool,
    pub can_add_client: bool,
    pub can_approve_stages: bool,
    pub can_manage_team: bool,
    pub can_see_reports: bool,
    pub can_manage_sales: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Role {
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
}

/// DTO for creating a role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}
