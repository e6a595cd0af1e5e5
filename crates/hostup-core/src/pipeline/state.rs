//! Pipeline state machine.
//!
//! `Start → priv-check → deps → native-lib → toolchain → account →
//! build-deploy → register → Done`, with `Failed(stage)` reachable from
//! every stage. `Done` and `Failed` are absorbing; a failed run restarts
//! from `Start`.

use std::fmt;

use serde::Serialize;

use crate::types::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "kebab-case")]
pub enum PipelineState {
    Start,
    Running(Stage),
    Done,
    Failed(Stage),
}

/// Result of the step run in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Succeeded,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Next state after `result`. `Start` runs no step, so it always advances
/// to the first stage.
pub fn transition(state: PipelineState, result: StepResult) -> PipelineState {
    match (state, result) {
        (PipelineState::Start, _) => PipelineState::Running(Stage::ORDER[0]),
        (PipelineState::Running(stage), StepResult::Succeeded) => stage
            .next()
            .map(PipelineState::Running)
            .unwrap_or(PipelineState::Done),
        (PipelineState::Running(stage), StepResult::Failed) => PipelineState::Failed(stage),
        (terminal, _) => terminal,
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Start => f.write_str("start"),
            PipelineState::Running(stage) => write!(f, "{stage}"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed(stage) => write!(f, "failed at {stage}"),
        }
    }
}
