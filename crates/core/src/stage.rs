//! Work stages and their status state machine.
//!
//! A [`Stage`] is one unit of assigned work inside a project's pipeline.
//! Its status only moves along the edges listed in
//! [`state_machine::valid_transitions`]; every mutating method on `Stage`
//! validates the edge first so a rejected transition leaves the stage
//! untouched.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{parse_deadline, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Queued in the workflow, not reached yet.
    Pending,
    InProgress,
    /// Work submitted by the assignee, awaiting an approver.
    InReview,
    NeedsRevision,
    Completed,
}

impl StageStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "in_review" => Ok(Self::InReview),
            "needs_revision" => Ok(Self::NeedsRevision),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid stage status '{s}'. Must be one of: pending, in_progress, \
                 in_review, needs_revision, completed"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::InReview => "in_review",
            Self::NeedsRevision => "needs_revision",
            Self::Completed => "completed",
        }
    }

    /// Validate the move from `self` to `to`, returning `to` on success.
    pub fn transition_to(self, to: StageStatus) -> Result<StageStatus, CoreError> {
        state_machine::validate_transition(self, to).map(|()| to)
    }
}

pub mod state_machine {
    use super::StageStatus;
    use crate::error::CoreError;

    /// Returns the statuses reachable from `from`.
    ///
    /// `Completed` is terminal and returns an empty slice.
    pub fn valid_transitions(from: StageStatus) -> &'static [StageStatus] {
        use StageStatus::*;
        match from {
            // Dequeued into the current slot.
            Pending => &[InProgress],
            // Submit.
            InProgress => &[InReview],
            // Resubmit.
            NeedsRevision => &[InReview],
            // Approve or send back.
            InReview => &[Completed, NeedsRevision],
            Completed => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: StageStatus, to: StageStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning a conflict error for invalid ones.
    pub fn validate_transition(from: StageStatus, to: StageStatus) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Invalid stage transition: {} -> {}",
                from.as_str(),
                to.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Work handed in by the assignee when submitting a stage for review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, alias = "file")]
    pub file_reference: Option<String>,
}

/// One unit of work within a project's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Weak reference to a user; existence is not enforced here.
    pub assigned_to: DbId,
    #[serde(default)]
    pub stage_deadline: Option<Timestamp>,
    pub status: StageStatus,
    #[serde(default)]
    pub completion_date: Option<Timestamp>,
    #[serde(default)]
    pub submission: Option<Submission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_notes: Option<String>,
}

impl Stage {
    /// Whether `user_id` is the assignee of this stage.
    pub fn is_assigned_to(&self, user_id: DbId) -> bool {
        self.assigned_to == user_id
    }

    /// `Pending -> InProgress`, applied when the stage becomes current.
    pub(crate) fn start(&mut self) -> Result<(), CoreError> {
        self.status = self.status.transition_to(StageStatus::InProgress)?;
        Ok(())
    }

    /// `InProgress | NeedsRevision -> InReview`.
    pub(crate) fn submit(&mut self, submission: Submission) -> Result<(), CoreError> {
        self.status = self.status.transition_to(StageStatus::InReview)?;
        self.submission = Some(submission);
        self.revision_notes = None;
        Ok(())
    }

    /// `InReview -> NeedsRevision`.
    pub(crate) fn send_back(&mut self, notes: String) -> Result<(), CoreError> {
        self.status = self.status.transition_to(StageStatus::NeedsRevision)?;
        self.revision_notes = Some(notes);
        Ok(())
    }

    /// `InReview -> Completed`. Consumes the stage because a completed stage
    /// is frozen once it lands in the completed list.
    pub(crate) fn complete(mut self, now: Timestamp) -> Result<Stage, (Stage, CoreError)> {
        match self.status.transition_to(StageStatus::Completed) {
            Ok(status) => {
                self.status = status;
                self.completion_date = Some(now);
                self.revision_notes = None;
                Ok(self)
            }
            Err(e) => Err((self, e)),
        }
    }
}

/// Client-supplied definition of a stage to queue in a workflow.
///
/// Fields are lenient so that missing or malformed values surface as
/// validation errors rather than body-deserialization rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assigned_to: Option<DbId>,
    #[serde(default)]
    pub stage_deadline: Option<String>,
}

impl StageDraft {
    /// Validate the draft and build a queued (`Pending`) stage.
    pub fn into_stage(self) -> Result<Stage, CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Stage name must not be empty".into()));
        }

        let assigned_to = self.assigned_to.ok_or_else(|| {
            CoreError::Validation(format!("Stage '{name}' must be assigned to a user"))
        })?;

        let stage_deadline = self
            .stage_deadline
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_deadline("stage_deadline", s))
            .transpose()?;

        Ok(Stage {
            name: name.to_string(),
            assigned_to,
            stage_deadline,
            status: StageStatus::Pending,
            completion_date: None,
            submission: None,
            revision_notes: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::*;
    use super::StageStatus::*;
    use assert_matches::assert_matches;

    fn draft(name: &str, assignee: Option<DbId>) -> StageDraft {
        StageDraft {
            name: name.to_string(),
            assigned_to: assignee,
            stage_deadline: None,
        }
    }

    fn stage_in(status: StageStatus) -> Stage {
        let mut stage = draft("Design", Some(7)).into_stage().unwrap();
        stage.status = status;
        stage
    }

    // -----------------------------------------------------------------------
    // Transition table
    // -----------------------------------------------------------------------

    #[test]
    fn pending_to_in_progress() {
        assert!(can_transition(Pending, InProgress));
    }

    #[test]
    fn in_progress_to_in_review() {
        assert!(can_transition(InProgress, InReview));
    }

    #[test]
    fn needs_revision_to_in_review() {
        assert!(can_transition(NeedsRevision, InReview));
    }

    #[test]
    fn in_review_to_completed_or_needs_revision() {
        assert!(can_transition(InReview, Completed));
        assert!(can_transition(InReview, NeedsRevision));
    }

    #[test]
    fn cannot_skip_review() {
        assert!(!can_transition(InProgress, Completed));
        assert!(!can_transition(InProgress, NeedsRevision));
        assert!(!can_transition(NeedsRevision, Completed));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(valid_transitions(Completed).is_empty());
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let err = validate_transition(InProgress, Completed).unwrap_err();
        assert_matches!(err, CoreError::Conflict(msg) if msg.contains("in_progress -> completed"));
    }

    #[test]
    fn status_db_round_trip() {
        for status in [Pending, InProgress, InReview, NeedsRevision, Completed] {
            assert_eq!(StageStatus::from_str_db(status.as_str()).unwrap(), status);
        }
        assert!(StageStatus::from_str_db("done").is_err());
    }

    // -----------------------------------------------------------------------
    // Stage mutations
    // -----------------------------------------------------------------------

    #[test]
    fn submit_attaches_submission_and_clears_notes() {
        let mut stage = stage_in(NeedsRevision);
        stage.revision_notes = Some("fix colours".into());

        let submission = Submission {
            comment: Some("v2".into()),
            file_reference: Some("drafts/v2.psd".into()),
        };
        stage.submit(submission.clone()).unwrap();

        assert_eq!(stage.status, InReview);
        assert_eq!(stage.submission, Some(submission));
        assert_eq!(stage.revision_notes, None);
    }

    #[test]
    fn submit_while_in_review_leaves_stage_untouched() {
        let mut stage = stage_in(InReview);
        let before = stage.clone();

        assert_matches!(stage.submit(Submission::default()), Err(CoreError::Conflict(_)));
        assert_eq!(stage, before);
    }

    #[test]
    fn complete_sets_date_and_strips_notes() {
        let mut stage = stage_in(InReview);
        stage.revision_notes = Some("stale".into());
        let now = chrono::Utc::now();

        let done = stage.complete(now).unwrap();
        assert_eq!(done.status, Completed);
        assert_eq!(done.completion_date, Some(now));
        assert_eq!(done.revision_notes, None);
    }

    #[test]
    fn complete_from_in_progress_returns_stage_back() {
        let stage = stage_in(InProgress);
        let (returned, err) = stage.clone().complete(chrono::Utc::now()).unwrap_err();
        assert_eq!(returned, stage);
        assert_matches!(err, CoreError::Conflict(_));
    }

    // -----------------------------------------------------------------------
    // Drafts
    // -----------------------------------------------------------------------

    #[test]
    fn draft_builds_pending_stage() {
        let stage = StageDraft {
            name: "  Copywriting ".into(),
            assigned_to: Some(3),
            stage_deadline: Some("2024-01-20".into()),
        }
        .into_stage()
        .unwrap();

        assert_eq!(stage.name, "Copywriting");
        assert_eq!(stage.status, Pending);
        assert!(stage.stage_deadline.is_some());
    }

    #[test]
    fn draft_requires_name_and_assignee() {
        assert_matches!(draft("  ", Some(1)).into_stage(), Err(CoreError::Validation(_)));
        assert_matches!(draft("Edit", None).into_stage(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn submission_accepts_legacy_file_key() {
        let submission: Submission =
            serde_json::from_str(r#"{"comment":"done","file":"a.zip"}"#).unwrap();
        assert_eq!(submission.file_reference.as_deref(), Some("a.zip"));
    }

    #[test]
    fn revision_notes_omitted_when_absent() {
        let json = serde_json::to_value(stage_in(InProgress)).unwrap();
        assert!(json.get("revision_notes").is_none());
        assert_eq!(json["status"], "in_progress");
    }
}
