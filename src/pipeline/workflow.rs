//! Per-request state machine shared by the pipeline workflows.

use crate::pipeline::types::{PipelineFailure, Stage};
use std::fmt;

/// Which workflow a state machine is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    /// Fetching → Extracting → Persisting.
    ExtractAndPersist,
    /// Fetching → Extracting → Synthesizing.
    AnswerQuestions,
}

impl WorkflowKind {
    fn stages(self) -> &'static [Stage] {
        match self {
            Self::ExtractAndPersist => &[Stage::Fetching, Stage::Extracting, Stage::Persisting],
            Self::AnswerQuestions => &[Stage::Fetching, Stage::Extracting, Stage::Synthesizing],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::ExtractAndPersist => "extract_and_persist",
            Self::AnswerQuestions => "answer_questions",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Not started.
    Idle,
    /// Running the given stage.
    Running(Stage),
    /// Finished successfully.
    Done,
    /// Terminated in the given stage.
    Failed(Stage),
}

/// Tracks one request through its workflow's stages.
///
/// Stages only move forward; a stage may be skipped (read-through answering goes straight to
/// synthesis) but never revisited.
#[derive(Debug)]
pub(crate) struct Workflow<'a> {
    kind: WorkflowKind,
    document_id: &'a str,
    state: WorkflowState,
    history: Vec<WorkflowState>,
}

impl<'a> Workflow<'a> {
    pub(crate) fn start(kind: WorkflowKind, document_id: &'a str) -> Self {
        tracing::debug!(workflow = %kind, document_id, "Workflow started");
        Self {
            kind,
            document_id,
            state: WorkflowState::Idle,
            history: vec![WorkflowState::Idle],
        }
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        debug_assert!(
            self.can_enter(stage),
            "illegal transition {:?} -> {stage} in {}",
            self.state,
            self.kind
        );
        self.transition(WorkflowState::Running(stage));
        tracing::debug!(workflow = %self.kind, document_id = self.document_id, %stage, "Entering stage");
    }

    /// Fail the running stage with `reason`.
    pub(crate) fn fail(&mut self, reason: impl fmt::Display) -> PipelineFailure {
        let stage = match self.state {
            WorkflowState::Running(stage) | WorkflowState::Failed(stage) => stage,
            WorkflowState::Idle | WorkflowState::Done => self.kind.stages()[0],
        };
        let failure = PipelineFailure::new(stage, reason);
        self.transition(WorkflowState::Failed(stage));
        tracing::warn!(
            workflow = %self.kind,
            document_id = self.document_id,
            %stage,
            reason = %failure.reason,
            "Workflow failed"
        );
        failure
    }

    pub(crate) fn finish(&mut self) {
        self.transition(WorkflowState::Done);
        tracing::debug!(workflow = %self.kind, document_id = self.document_id, "Workflow done");
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> WorkflowState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    fn can_enter(&self, stage: Stage) -> bool {
        let stages = self.kind.stages();
        let Some(target) = stages.iter().position(|candidate| *candidate == stage) else {
            return false;
        };
        match self.state {
            WorkflowState::Idle => true,
            WorkflowState::Running(current) => stages
                .iter()
                .position(|candidate| *candidate == current)
                .is_some_and(|position| target > position),
            WorkflowState::Done | WorkflowState::Failed(_) => false,
        }
    }

    fn transition(&mut self, next: WorkflowState) {
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_forward_progress() {
        let mut workflow = Workflow::start(WorkflowKind::ExtractAndPersist, "report.pdf");
        workflow.enter(Stage::Fetching);
        workflow.enter(Stage::Extracting);
        workflow.enter(Stage::Persisting);
        workflow.finish();

        assert_eq!(
            workflow.history(),
            &[
                WorkflowState::Idle,
                WorkflowState::Running(Stage::Fetching),
                WorkflowState::Running(Stage::Extracting),
                WorkflowState::Running(Stage::Persisting),
                WorkflowState::Done,
            ]
        );
    }

    #[test]
    fn failure_is_tagged_with_running_stage() {
        let mut workflow = Workflow::start(WorkflowKind::AnswerQuestions, "report.pdf");
        workflow.enter(Stage::Fetching);
        workflow.enter(Stage::Extracting);
        let failure = workflow.fail("no text extracted from the document");

        assert_eq!(failure.stage, Stage::Extracting);
        assert_eq!(workflow.state(), WorkflowState::Failed(Stage::Extracting));
    }

    #[test]
    fn answering_may_skip_straight_to_synthesis() {
        let workflow = Workflow::start(WorkflowKind::AnswerQuestions, "report.pdf");
        assert!(workflow.can_enter(Stage::Synthesizing));
        assert!(!workflow.can_enter(Stage::Persisting));
    }

    #[test]
    fn stages_never_move_backwards() {
        let mut workflow = Workflow::start(WorkflowKind::ExtractAndPersist, "report.pdf");
        workflow.enter(Stage::Extracting);
        assert!(!workflow.can_enter(Stage::Fetching));
        assert!(!workflow.can_enter(Stage::Extracting));
        assert!(workflow.can_enter(Stage::Persisting));
    }
}
