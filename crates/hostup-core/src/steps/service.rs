//! systemd registration.

use std::fs;

use super::Step;
use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::error::{IoResultExt, ProvisionError};
use crate::host::CommandSpec;
use crate::types::{Stage, StepOutcome};
use crate::unit::ServiceUnit;

/// Writes the unit file, reloads systemd, and enables the unit for boot.
/// The service is not started.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceStep;

impl ServiceStep {
    pub fn supervisor_commands(config: &ProvisionConfig) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("systemctl").arg("daemon-reload"),
            CommandSpec::new("systemctl")
                .arg("enable")
                .arg(format!("{}.service", config.service_name())),
        ]
    }
}

impl Step for ServiceStep {
    fn stage(&self) -> Stage {
        Stage::Register
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        let unit = ServiceUnit::from_config(config);
        let unit_path = config.unit_path();

        fs::create_dir_all(&config.service.unit_dir)
            .io_context(|| format!("Failed to create {}", config.service.unit_dir.display()))?;
        fs::write(&unit_path, unit.render())
            .io_context(|| format!("Failed to write unit file: {}", unit_path.display()))?;
        tracing::info!(path = %unit_path.display(), "wrote service unit");

        for spec in Self::supervisor_commands(config) {
            ctx.runner().run_checked(&spec)?;
        }
        tracing::info!(service = config.service_name(), "service enabled for boot");
        Ok(StepOutcome::Changed)
    }
}
