//! Ordered, fail-fast execution of the provisioning steps.

pub mod report;
pub mod state;

pub use report::{PipelineError, PipelineReport, StepRecord};
pub use state::{PipelineState, StepResult, transition};

use std::time::Instant;

use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::steps::{Step, default_steps};

/// Drives the state machine, running one step per stage.
pub struct Pipeline<'a> {
    ctx: &'a ProvisionContext,
    config: &'a ProvisionConfig,
    steps: Vec<Box<dyn Step>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(ctx: &'a ProvisionContext, config: &'a ProvisionConfig) -> Self {
        Self::with_steps(ctx, config, default_steps())
    }

    /// Pipeline with a custom step list. Stages without a step pass through.
    pub fn with_steps(
        ctx: &'a ProvisionContext,
        config: &'a ProvisionConfig,
        steps: Vec<Box<dyn Step>>,
    ) -> Self {
        Self { ctx, config, steps }
    }

    pub fn run(&self) -> Result<PipelineReport, PipelineError> {
        let started_at = chrono::Utc::now();
        let mut records = Vec::new();
        let mut state = PipelineState::Start;

        while !state.is_terminal() {
            let PipelineState::Running(stage) = state else {
                state = transition(state, StepResult::Succeeded);
                continue;
            };
            let Some(step) = self.steps.iter().find(|s| s.stage() == stage) else {
                tracing::debug!(%stage, "no step registered, passing through");
                state = transition(state, StepResult::Succeeded);
                continue;
            };

            tracing::info!(%stage, "starting");
            let started = Instant::now();
            match step.run(self.ctx, self.config) {
                Ok(outcome) => {
                    let duration_ms = started.elapsed().as_millis();
                    tracing::info!(%stage, ?outcome, duration_ms, "completed");
                    records.push(StepRecord {
                        stage,
                        outcome,
                        duration_ms,
                    });
                    state = transition(state, StepResult::Succeeded);
                }
                Err(source) => {
                    state = transition(state, StepResult::Failed);
                    tracing::error!(%stage, error = %source, "{}", state);
                    return Err(PipelineError {
                        stage,
                        source,
                        completed: records,
                    });
                }
            }
        }

        Ok(PipelineReport {
            state,
            steps: records,
            started_at,
            finished_at: chrono::Utc::now(),
            service: self.config.service_name().to_string(),
            unit_path: self.config.unit_path(),
            service_url: self.config.service_url(),
        })
    }
}
