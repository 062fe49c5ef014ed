//! The project aggregate.
//!
//! A [`Project`] owns its [`Pipeline`] and is only mutated through the
//! workflow operations below (submit, approve, request revision) and the
//! administrative [`Project::apply_patch`]. Each operation takes the acting
//! [`Actor`] and runs the access policy before touching any state; a failed
//! operation leaves the project unchanged.

use serde::{Deserialize, Serialize};

use crate::access::{self, Actor};
use crate::error::CoreError;
use crate::pipeline::{Advance, Pipeline};
use crate::stage::{Stage, StageDraft, Submission};
use crate::types::{parse_deadline, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Commercial arrangement of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    OneTime,
    Subscription,
    Maintenance,
}

impl ProjectType {
    /// Parse a project type. The hyphenated `one-time` spelling used by
    /// older clients is accepted as well.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "one_time" | "one-time" => Ok(Self::OneTime),
            "subscription" => Ok(Self::Subscription),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(CoreError::Validation(format!(
                "Invalid project type '{s}'. Must be one of: one_time, subscription, maintenance"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Subscription => "subscription",
            Self::Maintenance => "maintenance",
        }
    }
}

/// Project status as reported to callers.
///
/// Only `InProgress` and `Completed` are ever stored; `Overdue` is derived
/// at read time by [`Project::reported_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InProgress,
    Completed,
    Overdue,
}

impl ProjectStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid stored project status '{s}'. Must be one of: in_progress, completed"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Request body for creating a project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub client_id: Option<DbId>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub project_deadline: Option<String>,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub workflow: Vec<StageDraft>,
}

/// Request body for an administrative edit. All fields are optional.
///
/// `workflow` holds only the not-yet-reached stages and replaces the queue
/// wholesale. Completed and current stages are never part of it: they stay
/// where they are, and sending them again queues them a second time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub client_id: Option<DbId>,
    pub project_type: Option<String>,
    pub project_deadline: Option<String>,
    pub project_description: Option<String>,
    /// Replacement queue; `None` leaves the queue untouched.
    pub workflow: Option<Vec<StageDraft>>,
}

fn validate_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Project name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn validate_client_id(client_id: DbId) -> Result<DbId, CoreError> {
    if client_id <= 0 {
        return Err(CoreError::Validation(format!(
            "Invalid client_id {client_id}"
        )));
    }
    Ok(client_id)
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// A validated project that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub client_id: DbId,
    pub project_type: ProjectType,
    pub project_deadline: Timestamp,
    pub project_description: Option<String>,
    pub created_by: DbId,
    pub pipeline: Pipeline,
}

impl NewProject {
    /// Check the actor may create projects, validate the draft and start
    /// its pipeline.
    pub fn from_draft(actor: &Actor, draft: ProjectDraft) -> Result<Self, CoreError> {
        access::ensure_can_create(actor)?;

        let name = validate_name(&draft.name)?;
        let client_id = draft
            .client_id
            .ok_or_else(|| CoreError::Validation("client_id is required".into()))
            .and_then(validate_client_id)?;
        let project_type = draft
            .project_type
            .as_deref()
            .ok_or_else(|| CoreError::Validation("project_type is required".into()))
            .and_then(ProjectType::from_str_db)?;
        let project_deadline = draft
            .project_deadline
            .as_deref()
            .ok_or_else(|| CoreError::Validation("project_deadline is required".into()))
            .and_then(|s| parse_deadline("project_deadline", s))?;
        let pipeline = Pipeline::start(draft.workflow)?;

        Ok(Self {
            name,
            client_id,
            project_type,
            project_deadline,
            project_description: normalize_description(draft.project_description),
            created_by: actor.user_id,
            pipeline,
        })
    }

    /// Materialize the project once the store has assigned an id.
    pub fn into_project(self, id: DbId, now: Timestamp) -> Project {
        Project {
            id,
            name: self.name,
            client_id: self.client_id,
            project_type: self.project_type,
            project_deadline: self.project_deadline,
            project_description: self.project_description,
            status: ProjectStatus::InProgress,
            pipeline: self.pipeline,
            completed_date: None,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Every persisted field of a project, as read back from a store.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: DbId,
    pub name: String,
    pub client_id: DbId,
    pub project_type: ProjectType,
    pub project_deadline: Timestamp,
    pub project_description: Option<String>,
    pub status: ProjectStatus,
    pub pipeline: Pipeline,
    pub completed_date: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub client_id: DbId,
    pub project_type: ProjectType,
    pub project_deadline: Timestamp,
    pub project_description: Option<String>,
    status: ProjectStatus,
    pipeline: Pipeline,
    completed_date: Option<Timestamp>,
    /// Immutable after creation.
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProjectRecord> for Project {
    type Error = CoreError;

    fn try_from(record: ProjectRecord) -> Result<Self, Self::Error> {
        match record.status {
            ProjectStatus::Completed => {
                if !record.pipeline.is_exhausted() || record.completed_date.is_none() {
                    return Err(CoreError::Internal(format!(
                        "Project {} is completed but its pipeline is still active",
                        record.id
                    )));
                }
            }
            ProjectStatus::InProgress => {
                if record.completed_date.is_some() {
                    return Err(CoreError::Internal(format!(
                        "Project {} is in progress but has a completion date",
                        record.id
                    )));
                }
            }
            ProjectStatus::Overdue => {
                return Err(CoreError::Internal(format!(
                    "Project {} has a stored overdue status",
                    record.id
                )));
            }
        }

        Ok(Self {
            id: record.id,
            name: record.name,
            client_id: record.client_id,
            project_type: record.project_type,
            project_deadline: record.project_deadline,
            project_description: record.project_description,
            status: record.status,
            pipeline: record.pipeline,
            completed_date: record.completed_date,
            created_by: record.created_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl Project {
    /// Stored status: `InProgress` or `Completed`.
    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Status as reported to callers: an in-progress project whose deadline
    /// has passed is reported `Overdue`. The stored status is untouched.
    pub fn reported_status(&self, now: Timestamp) -> ProjectStatus {
        if self.is_overdue(now) {
            ProjectStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status == ProjectStatus::InProgress && self.project_deadline < now
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn completed_date(&self) -> Option<Timestamp> {
        self.completed_date
    }

    pub fn progress_percent(&self) -> f64 {
        self.pipeline.progress_percent()
    }

    /// Whether `user_id` created the project or is assigned to any of its stages.
    pub fn involves(&self, user_id: DbId) -> bool {
        self.created_by == user_id || self.pipeline.involves(user_id)
    }

    /// Hand in work for the current stage (`InProgress | NeedsRevision -> InReview`).
    pub fn submit_stage(
        &mut self,
        actor: &Actor,
        submission: Submission,
    ) -> Result<&Stage, CoreError> {
        let project_id = self.id;
        let stage = self
            .pipeline
            .current_stage_mut()
            .ok_or(CoreError::NoCurrentStage { project_id })?;

        access::ensure_can_submit(actor, stage)?;
        stage.submit(submission)?;
        Ok(stage)
    }

    /// Approve the current stage (`InReview -> Completed`) and move the
    /// pipeline forward. Approving the last stage completes the project.
    pub fn approve_stage(&mut self, actor: &Actor, now: Timestamp) -> Result<Advance, CoreError> {
        access::ensure_can_review(actor)?;
        if self.pipeline.current_stage().is_none() {
            return Err(CoreError::NoCurrentStage {
                project_id: self.id,
            });
        }

        let advance = self.pipeline.advance(now)?;
        if advance == Advance::Exhausted {
            self.status = ProjectStatus::Completed;
            self.completed_date = Some(now);
        }
        Ok(advance)
    }

    /// Send the current stage back to its assignee (`InReview -> NeedsRevision`).
    pub fn request_revision(&mut self, actor: &Actor, notes: &str) -> Result<&Stage, CoreError> {
        access::ensure_can_review(actor)?;

        let notes = notes.trim();
        if notes.is_empty() {
            return Err(CoreError::Validation("Revision notes are required".into()));
        }

        let project_id = self.id;
        let stage = self
            .pipeline
            .current_stage_mut()
            .ok_or(CoreError::NoCurrentStage { project_id })?;
        stage.send_back(notes.to_string())?;
        Ok(stage)
    }

    /// Administrative edit of project details and of the queued stages.
    ///
    /// Every field is validated before anything is applied. Queuing stages
    /// on a completed project is a conflict.
    pub fn apply_patch(&mut self, actor: &Actor, patch: ProjectPatch) -> Result<(), CoreError> {
        access::ensure_can_edit(actor, self)?;

        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let client_id = patch.client_id.map(validate_client_id).transpose()?;
        let project_type = patch
            .project_type
            .as_deref()
            .map(ProjectType::from_str_db)
            .transpose()?;
        let project_deadline = patch
            .project_deadline
            .as_deref()
            .map(|s| parse_deadline("project_deadline", s))
            .transpose()?;

        if let Some(workflow) = patch.workflow {
            if self.is_completed() && !workflow.is_empty() {
                return Err(CoreError::Conflict(format!(
                    "Project {} is completed; no stages can be queued",
                    self.id
                )));
            }
            if !self.is_completed() {
                self.pipeline.replace_queue(workflow)?;
            }
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(client_id) = client_id {
            self.client_id = client_id;
        }
        if let Some(project_type) = project_type {
            self.project_type = project_type;
        }
        if let Some(project_deadline) = project_deadline {
            self.project_deadline = project_deadline;
        }
        if patch.project_description.is_some() {
            self.project_description = normalize_description(patch.project_description);
        }
        Ok(())
    }
}
