//! Run lifecycle.
//!
//! `Start → ResolvingChange → Filtering → ProcessingFiles → Done`, with
//! `Failed` reachable from every non-terminal state. `Done` and `Failed` are
//! terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Start,
    ResolvingChange,
    Filtering,
    ProcessingFiles,
    Done,
    Failed,
}

/// Attempted a transition the lifecycle does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid run state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Start => "start",
            RunState::ResolvingChange => "resolving_change",
            RunState::Filtering => "filtering",
            RunState::ProcessingFiles => "processing_files",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_transition_to(&self, to: RunState) -> bool {
        use RunState::*;
        match (self, to) {
            (from, Failed) => !from.is_terminal(),
            (Start, ResolvingChange)
            | (ResolvingChange, Filtering)
            | (Filtering, ProcessingFiles)
            | (Filtering, Done)
            | (ProcessingFiles, Done) => true,
            _ => false,
        }
    }

    /// Move to `to`, or report why that is not allowed.
    pub fn transition(self, to: RunState) -> Result<RunState, InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
