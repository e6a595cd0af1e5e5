//! Run reports.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::PipelineState;
use crate::error::ProvisionError;
use crate::types::{Stage, StepOutcome};

/// One completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub stage: Stage,
    pub outcome: StepOutcome,
    pub duration_ms: u128,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub service: String,
    pub unit_path: PathBuf,
    pub service_url: String,
}

impl PipelineReport {
    pub fn outcome_of(&self, stage: Stage) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| record.outcome)
    }
}

/// A run that stopped at `stage`.
#[derive(Debug, Error)]
#[error("provisioning failed at {stage}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ProvisionError,
    /// Steps that finished before the failure
    pub completed: Vec<StepRecord>,
}

impl PipelineError {
    pub fn state(&self) -> PipelineState {
        PipelineState::Failed(self.stage)
    }
}
