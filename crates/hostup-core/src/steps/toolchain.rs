//! Pinned build toolchain installation.

use std::fs;

use super::Step;
use super::native_lib::archive_file_name;
use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::error::{IoResultExt, ProvisionError};
use crate::fs::archive::single_root;
use crate::fs::{ScratchDir, copy_tree, ensure_path_entry, extract_archive, verifier_for};
use crate::host::release_arch;
use crate::types::{Stage, StepOutcome};

/// Replaces any existing toolchain with the pinned version and puts its
/// bin directory on the system-wide `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolchainStep;

impl Step for ToolchainStep {
    fn stage(&self) -> Stage {
        Stage::Toolchain
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        let toolchain = &config.toolchain;
        let arch = release_arch(ctx.arch())?;
        let url = config
            .toolchain_url(arch)
            .map_err(|e| ProvisionError::Config(e.to_string()))?;
        let install_dir = &toolchain.install_dir;

        if install_dir.exists() {
            tracing::warn!(path = %install_dir.display(), "removing existing toolchain");
            fs::remove_dir_all(install_dir)
                .io_context(|| format!("Failed to remove {}", install_dir.display()))?;
        }

        tracing::info!(
            name = %toolchain.name,
            version = %toolchain.version,
            arch,
            "installing toolchain"
        );

        let scratch =
            ScratchDir::create("hostup-toolchain-", config.app.scratch_parent.as_deref())?;
        let archive = scratch.path().join(archive_file_name(
            &url,
            &format!("{}-{}.tar.gz", toolchain.name, toolchain.version),
        ));
        ctx.downloader().download(&url, &archive)?;
        verifier_for(toolchain.blake3.as_deref()).verify(&archive)?;

        let extract_dir = scratch.path().join("extract");
        extract_archive(&archive, &extract_dir)?;
        let root = single_root(&extract_dir)?.unwrap_or(extract_dir);

        if let Some(parent) = install_dir.parent() {
            fs::create_dir_all(parent)
                .io_context(|| format!("Failed to create {}", parent.display()))?;
        }
        if let Err(err) = fs::rename(&root, install_dir) {
            // Scratch space may sit on another filesystem.
            tracing::debug!(error = %err, "rename failed, copying toolchain instead");
            copy_tree(&root, install_dir, None)?;
        }
        drop(scratch);

        let bin_dir = config.toolchain_bin_dir();
        match ensure_path_entry(&toolchain.profile_path, &bin_dir, &toolchain.name)? {
            StepOutcome::Changed => {
                tracing::info!(profile = %toolchain.profile_path.display(), "added toolchain to PATH")
            }
            StepOutcome::Unchanged => {
                tracing::info!(profile = %toolchain.profile_path.display(), "toolchain already on PATH")
            }
        }

        Ok(StepOutcome::Changed)
    }
}
