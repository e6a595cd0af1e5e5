//! Source bootstrap, build, runtime layout, and ownership.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use super::Step;
use crate::config::{ConfigPolicy, ProvisionConfig};
use crate::context::ProvisionContext;
use crate::error::{IoResultExt, ProvisionError};
use crate::fs::{PermissionPolicy, copy_tree, same_location};
use crate::host::CommandSpec;
use crate::types::{Stage, StepOutcome};

/// Fallback search path when the process has no `PATH`.
const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

#[derive(Debug, Default, Clone, Copy)]
pub struct BuildDeployStep;

impl BuildDeployStep {
    /// Copy the source tree into the install dir unless they are the same
    /// directory. Returns whether a copy happened.
    pub fn bootstrap_copy(source_root: &Path, install_dir: &Path) -> Result<bool, ProvisionError> {
        fs::create_dir_all(install_dir)
            .io_context(|| format!("Failed to create {}", install_dir.display()))?;

        if same_location(source_root, install_dir) {
            tracing::info!(path = %install_dir.display(), "already running from install dir, skipping copy");
            return Ok(false);
        }

        let copied = copy_tree(source_root, install_dir, Some(install_dir))?;
        tracing::info!(
            from = %source_root.display(),
            to = %install_dir.display(),
            files = copied,
            "copied source into install dir"
        );
        Ok(true)
    }

    /// Build commands with the toolchain's bin dir ahead of the inherited `PATH`.
    pub fn build_commands(config: &ProvisionConfig) -> Vec<CommandSpec> {
        let path = build_path(&config.toolchain_bin_dir());
        config
            .build
            .commands
            .iter()
            .filter_map(|argv| CommandSpec::from_argv(argv))
            .map(|spec| {
                spec.env("PATH", path.clone())
                    .current_dir(config.install_dir())
            })
            .collect()
    }

    /// Create the runtime data tree and install the default configuration.
    pub fn install_runtime_config(config: &ProvisionConfig) -> Result<StepOutcome, ProvisionError> {
        let config_dir = config.runtime_config_dir();
        fs::create_dir_all(&config_dir)
            .io_context(|| format!("Failed to create {}", config_dir.display()))?;

        let target = config.runtime_config_path();
        if config.runtime.config_policy == ConfigPolicy::IfAbsent && target.exists() {
            tracing::info!(path = %target.display(), "keeping existing runtime configuration");
            return Ok(StepOutcome::Unchanged);
        }

        let source = config.default_config_source();
        if target.exists() {
            tracing::warn!(path = %target.display(), "overwriting runtime configuration with defaults");
        }
        fs::copy(&source, &target).io_context(|| {
            format!(
                "Failed to copy default configuration from {} to {}",
                source.display(),
                target.display()
            )
        })?;
        Ok(StepOutcome::Changed)
    }

    /// Hand the whole install dir to the service account.
    pub fn ownership_command(config: &ProvisionConfig) -> CommandSpec {
        let account = config.account_name();
        CommandSpec::new("chown")
            .arg("-R")
            .arg(format!("{account}:{account}"))
            .path_arg(config.install_dir())
    }
}

impl Step for BuildDeployStep {
    fn stage(&self) -> Stage {
        Stage::BuildDeploy
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        let install_dir = config.install_dir();
        Self::bootstrap_copy(ctx.source_root(), install_dir)?;

        for spec in Self::build_commands(config) {
            tracing::info!(command = %spec.display(), "building");
            ctx.runner().run_checked(&spec)?;
        }

        let artifact = config.artifact_path();
        if !artifact.is_file() {
            return Err(ProvisionError::MissingArtifact(artifact));
        }

        Self::install_runtime_config(config)?;

        ctx.runner().run_checked(&Self::ownership_command(config))?;
        PermissionPolicy::default().apply(&config.data_dir(), &artifact)?;
        tracing::info!(
            account = config.account_name(),
            path = %install_dir.display(),
            "applied ownership and permissions"
        );

        Ok(StepOutcome::Changed)
    }
}

fn build_path(toolchain_bin: &Path) -> String {
    let inherited = std::env::var_os("PATH").unwrap_or_else(|| OsString::from(DEFAULT_PATH));
    let mut entries = vec![toolchain_bin.to_path_buf()];
    entries.extend(std::env::split_paths(&inherited));
    std::env::join_paths(entries)
        .map(|joined| joined.to_string_lossy().into_owned())
        .unwrap_or_else(|_| format!("{}:{}", toolchain_bin.display(), DEFAULT_PATH))
}
