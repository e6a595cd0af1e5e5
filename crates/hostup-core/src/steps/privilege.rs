//! Privilege guard.

use super::Step;
use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::types::{Stage, StepOutcome};

/// Refuses to continue unless running with root authority.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrivilegeStep;

impl Step for PrivilegeStep {
    fn stage(&self) -> Stage {
        Stage::PrivCheck
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        _config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        let probe = ctx.privileges();
        if !probe.is_elevated() {
            return Err(ProvisionError::Unauthorized {
                uid: probe.effective_uid(),
            });
        }
        tracing::info!("running with root privileges");
        Ok(StepOutcome::Unchanged)
    }
}
