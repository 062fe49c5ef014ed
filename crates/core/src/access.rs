//! Role capabilities and the project access policy.
//!
//! Roles grant a fixed set of boolean [`Capabilities`]. An [`Actor`] is an
//! authenticated user id together with the capabilities resolved from its
//! role; every policy check takes the actor explicitly.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::Project;
use crate::stage::Stage;
use crate::types::DbId;

/// Capability flags granted by a role. Missing flags default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub can_see_all_projects: bool,
    pub can_add_project: bool,
    pub can_add_client: bool,
    pub can_approve_stages: bool,
    pub can_manage_team: bool,
    pub can_see_reports: bool,
    pub can_manage_sales: bool,
}

/// Names a single capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SeeAllProjects,
    AddProject,
    AddClient,
    ApproveStages,
    ManageTeam,
    SeeReports,
    ManageSales,
}

impl Capability {
    /// Field name of the flag, used in error messages and the `roles` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeeAllProjects => "can_see_all_projects",
            Self::AddProject => "can_add_project",
            Self::AddClient => "can_add_client",
            Self::ApproveStages => "can_approve_stages",
            Self::ManageTeam => "can_manage_team",
            Self::SeeReports => "can_see_reports",
            Self::ManageSales => "can_manage_sales",
        }
    }
}

impl Capabilities {
    /// Every flag set. Matches the seeded `Admin` role.
    pub fn all() -> Self {
        Self {
            can_see_all_projects: true,
            can_add_project: true,
            can_add_client: true,
            can_approve_stages: true,
            can_manage_team: true,
            can_see_reports: true,
            can_manage_sales: true,
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::SeeAllProjects => self.can_see_all_projects,
            Capability::AddProject => self.can_add_project,
            Capability::AddClient => self.can_add_client,
            Capability::ApproveStages => self.can_approve_stages,
            Capability::ManageTeam => self.can_manage_team,
            Capability::SeeReports => self.can_see_reports,
            Capability::ManageSales => self.can_manage_sales,
        }
    }
}

/// The user performing an operation, with its resolved capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub capabilities: Capabilities,
}

impl Actor {
    pub fn new(user_id: DbId, capabilities: Capabilities) -> Self {
        Self {
            user_id,
            capabilities,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.grants(capability)
    }

    /// Fail with `Forbidden` unless the actor holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), CoreError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "Permission denied: {} required",
                capability.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Visibility rule: see-all capability, creator, or assigned to any stage
/// in any position of the pipeline.
pub fn can_view(actor: &Actor, project: &Project) -> bool {
    actor.has(Capability::SeeAllProjects) || project.involves(actor.user_id)
}

pub fn ensure_can_view(actor: &Actor, project: &Project) -> Result<(), CoreError> {
    if can_view(actor, project) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Access denied".into()))
    }
}

/// General edits: project-adding capability or the creator.
pub fn can_edit(actor: &Actor, project: &Project) -> bool {
    actor.has(Capability::AddProject) || project.created_by == actor.user_id
}

pub fn ensure_can_edit(actor: &Actor, project: &Project) -> Result<(), CoreError> {
    if can_edit(actor, project) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Permission denied".into()))
    }
}

pub fn ensure_can_create(actor: &Actor) -> Result<(), CoreError> {
    actor.require(Capability::AddProject)
}

/// Approving a stage or sending it back for revision.
pub fn ensure_can_review(actor: &Actor) -> Result<(), CoreError> {
    actor.require(Capability::ApproveStages)
}

/// Only the assignee may submit work for a stage.
pub fn ensure_can_submit(actor: &Actor, stage: &Stage) -> Result<(), CoreError> {
    if stage.is_assigned_to(actor.user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Stage is not assigned to you".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{NewProject, ProjectDraft};
    use crate::stage::StageDraft;
    use assert_matches::assert_matches;

    const CREATOR: DbId = 1;
    const ASSIGNEE_A: DbId = 2;
    const ASSIGNEE_B: DbId = 3;
    const STRANGER: DbId = 9;

    fn creator() -> Actor {
        Actor::new(
            CREATOR,
            Capabilities {
                can_add_project: true,
                ..Capabilities::default()
            },
        )
    }

    fn plain(user_id: DbId) -> Actor {
        Actor::new(user_id, Capabilities::default())
    }

    fn project() -> Project {
        let draft = ProjectDraft {
            name: "Rebrand".into(),
            client_id: Some(11),
            project_type: Some("one_time".into()),
            project_deadline: Some("2030-01-01".into()),
            project_description: None,
            workflow: vec![
                StageDraft {
                    name: "Logo".into(),
                    assigned_to: Some(ASSIGNEE_A),
                    stage_deadline: None,
                },
                StageDraft {
                    name: "Guidelines".into(),
                    assigned_to: Some(ASSIGNEE_B),
                    stage_deadline: None,
                },
            ],
        };
        NewProject::from_draft(&creator(), draft)
            .unwrap()
            .into_project(1, chrono::Utc::now())
    }

    #[test]
    fn capability_flags_map_to_names() {
        let caps = Capabilities {
            can_approve_stages: true,
            ..Capabilities::default()
        };
        assert!(caps.grants(Capability::ApproveStages));
        assert!(!caps.grants(Capability::SeeAllProjects));
        assert_eq!(Capability::ApproveStages.as_str(), "can_approve_stages");
    }

    #[test]
    fn missing_flags_deserialize_as_false() {
        let caps: Capabilities = serde_json::from_str(r#"{"can_add_client":true}"#).unwrap();
        assert!(caps.can_add_client);
        assert!(!caps.can_add_project);
    }

    #[test]
    fn require_reports_missing_capability() {
        let err = plain(STRANGER).require(Capability::AddProject).unwrap_err();
        assert_matches!(err, CoreError::Forbidden(msg) if msg.contains("can_add_project"));
    }

    #[test]
    fn creator_and_assignees_can_view() {
        let project = project();
        assert!(can_view(&creator(), &project));
        assert!(can_view(&plain(ASSIGNEE_A), &project));
        assert!(can_view(&plain(ASSIGNEE_B), &project));
    }

    #[test]
    fn stranger_cannot_view_without_see_all() {
        let project = project();
        assert_matches!(
            ensure_can_view(&plain(STRANGER), &project),
            Err(CoreError::Forbidden(_))
        );

        let auditor = Actor::new(
            STRANGER,
            Capabilities {
                can_see_all_projects: true,
                ..Capabilities::default()
            },
        );
        assert!(can_view(&auditor, &project));
    }

    #[test]
    fn edit_requires_add_project_or_creator() {
        let project = project();
        assert!(can_edit(&creator(), &project));
        assert!(!can_edit(&plain(ASSIGNEE_A), &project));

        let manager = Actor::new(
            STRANGER,
            Capabilities {
                can_add_project: true,
                ..Capabilities::default()
            },
        );
        assert!(can_edit(&manager, &project));
    }

    #[test]
    fn creator_without_capability_can_still_edit() {
        let project = project();
        assert!(can_edit(&plain(CREATOR), &project));
    }

    #[test]
    fn submit_requires_assignee() {
        let project = project();
        let current = project.pipeline().current_stage().unwrap();
        assert!(ensure_can_submit(&plain(ASSIGNEE_A), current).is_ok());
        assert_matches!(
            ensure_can_submit(&plain(ASSIGNEE_B), current),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn review_requires_approve_capability() {
        assert!(ensure_can_review(&Actor::new(5, Capabilities::all())).is_ok());
        assert!(ensure_can_review(&creator()).is_err());
    }
}
