//! Native dependency installation through the system package manager.

use super::Step;
use crate::config::{PackageManager, ProvisionConfig};
use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::host::CommandSpec;
use crate::types::{Stage, StepOutcome};

/// Refreshes the package index and installs the configured packages.
///
/// Already-installed packages are left to the package manager, which
/// treats them as satisfied.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackagesStep;

impl PackagesStep {
    /// Commands issued for `config`, in order.
    pub fn commands(config: &ProvisionConfig) -> Vec<CommandSpec> {
        match config.packages.manager {
            PackageManager::Apt => {
                let apt = |args: &[&str]| {
                    CommandSpec::new("apt-get")
                        .args(args.iter().copied())
                        .env("DEBIAN_FRONTEND", "noninteractive")
                };
                let mut commands = vec![apt(&["update"])];
                if !config.packages.names.is_empty() {
                    commands.push(
                        apt(&["install", "-y", "--no-install-recommends"])
                            .args(config.packages.names.iter().cloned()),
                    );
                }
                commands
            }
        }
    }
}

impl Step for PackagesStep {
    fn stage(&self) -> Stage {
        Stage::Deps
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        tracing::info!(count = config.packages.names.len(), "installing native packages");
        for spec in Self::commands(config) {
            ctx.runner().run_checked(&spec)?;
        }
        Ok(StepOutcome::Changed)
    }
}
