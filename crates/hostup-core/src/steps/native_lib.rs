//! Native library built from a pinned source archive.

use std::path::{Path, PathBuf};

use url::Url;

use super::Step;
use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::fs::archive::single_root;
use crate::fs::{ScratchDir, extract_archive, verifier_for};
use crate::host::CommandSpec;
use crate::types::{Stage, StepOutcome};

/// Downloads, configures, compiles, and installs the native library.
///
/// All intermediate files live in a [`ScratchDir`] that is removed
/// whether the build succeeds or fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLibStep;

impl NativeLibStep {
    fn build_in(
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
        url: &Url,
        scratch: &Path,
    ) -> Result<(), ProvisionError> {
        let lib = &config.native_lib;
        let archive = scratch.join(archive_file_name(
            url,
            &format!("{}-{}.tar.gz", lib.name, lib.version),
        ));

        ctx.downloader().download(url, &archive)?;
        verifier_for(lib.blake3.as_deref()).verify(&archive)?;

        let extract_dir = scratch.join("src");
        extract_archive(&archive, &extract_dir)?;
        let source_dir = single_root(&extract_dir)?.unwrap_or(extract_dir);

        for spec in Self::build_commands(config, &source_dir) {
            ctx.runner().run_checked(&spec)?;
        }
        Ok(())
    }

    /// Configure, compile, install, and linker-cache commands for `source_dir`.
    pub fn build_commands(config: &ProvisionConfig, source_dir: &Path) -> Vec<CommandSpec> {
        let lib = &config.native_lib;
        let jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let mut commands = vec![
            CommandSpec::new("./configure")
                .arg(format!("--prefix={}", lib.prefix.display()))
                .args(lib.configure_flags.iter().cloned())
                .current_dir(source_dir),
            CommandSpec::new("make")
                .arg(format!("-j{jobs}"))
                .current_dir(source_dir),
            CommandSpec::new("make")
                .arg("install")
                .current_dir(source_dir),
        ];
        if lib.ldconfig {
            commands.push(CommandSpec::new("ldconfig"));
        }
        commands
    }
}

impl Step for NativeLibStep {
    fn stage(&self) -> Stage {
        Stage::NativeLib
    }

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError> {
        let url = config
            .native_lib_url()
            .map_err(|e| ProvisionError::Config(e.to_string()))?;
        tracing::info!(
            name = %config.native_lib.name,
            version = %config.native_lib.version,
            "building native library from source"
        );

        let scratch = ScratchDir::create("hostup-native-", config.app.scratch_parent.as_deref())?;
        Self::build_in(ctx, config, &url, scratch.path())?;
        Ok(StepOutcome::Changed)
    }
}

/// Last path segment of `url`, or `fallback` when the URL has none.
pub(crate) fn archive_file_name(url: &Url, fallback: &str) -> PathBuf {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_comes_from_url() {
        let url = Url::parse("https://example.com/releases/libwebp-1.4.0.tar.gz").unwrap();
        assert_eq!(
            archive_file_name(&url, "fallback.tar.gz"),
            PathBuf::from("libwebp-1.4.0.tar.gz")
        );
    }

    #[test]
    fn archive_name_falls_back() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            archive_file_name(&url, "fallback.tar.gz"),
            PathBuf::from("fallback.tar.gz")
        );
    }

    #[test]
    fn build_commands_enable_feature_and_parallelism() {
        let config = ProvisionConfig::default();
        let commands = NativeLibStep::build_commands(&config, Path::new("/scratch/src/lib"));

        assert_eq!(
            commands[0].display(),
            "./configure --prefix=/usr/local --enable-libwebpmux"
        );
        assert!(commands[1].args[0].starts_with("-j"));
        assert_eq!(commands[2].display(), "make install");
        assert_eq!(commands[3].display(), "ldconfig");
        assert!(
            commands[..3]
                .iter()
                .all(|c| c.current_dir.as_deref() == Some(Path::new("/scratch/src/lib")))
        );
    }
}
