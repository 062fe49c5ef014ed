//! Stage ownership across the completed list, the current slot and the
//! workflow queue.
//!
//! The three containers are private to [`Pipeline`]; stages only move
//! between them through methods that migrate one stage at a time, so a
//! stage can never be in two places at once. Callers that need to know
//! where a stage sits use [`Pipeline::stages`], which tags every stage with
//! its [`StagePosition`].

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::CoreError;
use crate::stage::{Stage, StageDraft, StageStatus};
use crate::types::{DbId, Timestamp};

/// Where a stage currently lives inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePosition {
    /// Index into the completed list (completion order).
    Completed(usize),
    Current,
    /// Index into the workflow queue (0 is next in line).
    Queued(usize),
}

/// Result of approving the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The head of the queue became the current stage.
    Promoted,
    /// The queue was empty; no stage is current any more.
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pipeline {
    completed_stages: Vec<Stage>,
    current_stage: Option<Stage>,
    workflow: VecDeque<Stage>,
    /// Pipeline size captured at creation (or at the last structural edit).
    total_stages: i32,
}

impl Pipeline {
    /// Build a pipeline from an initial workflow. The first stage becomes
    /// current and `total_stages` is frozen at the initial size.
    pub fn start(drafts: Vec<StageDraft>) -> Result<Self, CoreError> {
        let workflow = drafts
            .into_iter()
            .map(StageDraft::into_stage)
            .collect::<Result<VecDeque<_>, _>>()?;

        let mut pipeline = Self {
            workflow,
            ..Self::default()
        };
        pipeline.promote_next()?;
        pipeline.total_stages = pipeline.stage_count();
        Ok(pipeline)
    }

    /// Rebuild a pipeline from persisted lists, rejecting combinations that
    /// violate the list invariants.
    pub fn restore(
        completed_stages: Vec<Stage>,
        current_stage: Option<Stage>,
        workflow: Vec<Stage>,
        total_stages: i32,
    ) -> Result<Self, CoreError> {
        if let Some(stage) = completed_stages
            .iter()
            .find(|s| s.status != StageStatus::Completed)
        {
            return Err(CoreError::Internal(format!(
                "Completed list holds stage '{}' with status {}",
                stage.name,
                stage.status.as_str()
            )));
        }

        if let Some(stage) = &current_stage {
            if matches!(stage.status, StageStatus::Pending | StageStatus::Completed) {
                return Err(CoreError::Internal(format!(
                    "Current stage '{}' has status {}",
                    stage.name,
                    stage.status.as_str()
                )));
            }
        }

        if let Some(stage) = workflow.iter().find(|s| s.status != StageStatus::Pending) {
            return Err(CoreError::Internal(format!(
                "Queued stage '{}' has status {}",
                stage.name,
                stage.status.as_str()
            )));
        }

        let pipeline = Self {
            completed_stages,
            current_stage,
            workflow: workflow.into(),
            total_stages,
        };
        if pipeline.stage_count() > total_stages {
            return Err(CoreError::Internal(format!(
                "Pipeline holds {} stages but total_stages is {total_stages}",
                pipeline.stage_count()
            )));
        }
        Ok(pipeline)
    }

    pub fn completed_stages(&self) -> &[Stage] {
        &self.completed_stages
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.current_stage.as_ref()
    }

    pub fn workflow(&self) -> &VecDeque<Stage> {
        &self.workflow
    }

    pub fn total_stages(&self) -> i32 {
        self.total_stages
    }

    /// Number of stages actually held across all three containers.
    pub fn stage_count(&self) -> i32 {
        let count = self.completed_stages.len()
            + usize::from(self.current_stage.is_some())
            + self.workflow.len();
        count as i32
    }

    /// `true` when nothing is current and nothing is queued.
    pub fn is_exhausted(&self) -> bool {
        self.current_stage.is_none() && self.workflow.is_empty()
    }

    /// Every stage with its position, completed first, then current, then queued.
    pub fn stages(&self) -> impl Iterator<Item = (StagePosition, &Stage)> + '_ {
        let completed = self
            .completed_stages
            .iter()
            .enumerate()
            .map(|(i, s)| (StagePosition::Completed(i), s));
        let current = self
            .current_stage
            .iter()
            .map(|s| (StagePosition::Current, s));
        let queued = self
            .workflow
            .iter()
            .enumerate()
            .map(|(i, s)| (StagePosition::Queued(i), s));

        completed.chain(current).chain(queued)
    }

    /// Whether `user_id` is or was assigned to any stage.
    pub fn involves(&self, user_id: DbId) -> bool {
        self.stages().any(|(_, s)| s.is_assigned_to(user_id))
    }

    /// Completed share of `total_stages`, in percent. Zero for an empty pipeline.
    pub fn progress_percent(&self) -> f64 {
        if self.total_stages <= 0 {
            return 0.0;
        }
        self.completed_stages.len() as f64 / f64::from(self.total_stages) * 100.0
    }

    pub(crate) fn current_stage_mut(&mut self) -> Option<&mut Stage> {
        self.current_stage.as_mut()
    }

    /// Complete the current stage, append it to the completed list and
    /// promote the next queued stage. On error nothing moves.
    pub(crate) fn advance(&mut self, now: Timestamp) -> Result<Advance, CoreError> {
        let current = self
            .current_stage
            .take()
            .ok_or_else(|| CoreError::Conflict("No stage is current".into()))?;

        match current.complete(now) {
            Ok(done) => {
                self.completed_stages.push(done);
                self.promote_next()?;
                Ok(if self.current_stage.is_some() {
                    Advance::Promoted
                } else {
                    Advance::Exhausted
                })
            }
            Err((stage, e)) => {
                self.current_stage = Some(stage);
                Err(e)
            }
        }
    }

    /// Replace the not-yet-reached stages. Promotes the new head when no
    /// stage is current and recomputes `total_stages`.
    pub(crate) fn replace_queue(&mut self, drafts: Vec<StageDraft>) -> Result<(), CoreError> {
        let workflow = drafts
            .into_iter()
            .map(StageDraft::into_stage)
            .collect::<Result<VecDeque<_>, _>>()?;

        self.workflow = workflow;
        self.promote_next()?;
        self.total_stages = self.stage_count();
        Ok(())
    }

    fn promote_next(&mut self) -> Result<(), CoreError> {
        if self.current_stage.is_some() {
            return Ok(());
        }
        if let Some(next) = self.workflow.front() {
            next.status.transition_to(StageStatus::InProgress)?;
        }
        if let Some(mut next) = self.workflow.pop_front() {
            next.start()?;
            self.current_stage = Some(next);
        }
        Ok(())
    }
}
