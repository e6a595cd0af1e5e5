//! Service account provisioning.

use super::Step;
use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::host::SystemAccount;
use crate::types::{Stage, StepOutcome};

/// Creates the non-login system account unless it already exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccountStep;

impl Step for AccountStep {
    fn stage(&self) -> Stage {
        Stage::Account
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        let name = config.account_name();
        if ctx.accounts().exists(name)? {
            tracing::info!(account = name, "service account already exists, skipping");
            return Ok(StepOutcome::Unchanged);
        }

        let account = SystemAccount {
            name: name.to_string(),
            home: config.install_dir().to_path_buf(),
            shell: config.account.shell.clone(),
        };
        ctx.accounts().create_system(&account)?;
        tracing::info!(account = name, "created service account");
        Ok(StepOutcome::Changed)
    }
}
