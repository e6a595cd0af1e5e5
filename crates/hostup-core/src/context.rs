//! Provisioning context for unified dependency injection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::host::{
    AccountDirectory, CommandRunner, Downloader, EffectiveUid, HttpDownloader, PrivilegeProbe,
    SystemAccounts, SystemRunner,
};

/// Shared access to the host ports for every step.
///
/// The CLI creates this once with [`ProvisionContext::system`]; tests
/// build one from fakes with [`ProvisionContext::new`].
#[derive(Clone)]
pub struct ProvisionContext {
    runner: Arc<dyn CommandRunner>,
    downloader: Arc<dyn Downloader>,
    privileges: Arc<dyn PrivilegeProbe>,
    accounts: Arc<dyn AccountDirectory>,
    source_root: PathBuf,
    arch: String,
}

impl ProvisionContext {
    /// Create a new context with explicit ports.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        downloader: Arc<dyn Downloader>,
        privileges: Arc<dyn PrivilegeProbe>,
        accounts: Arc<dyn AccountDirectory>,
        source_root: PathBuf,
    ) -> Self {
        Self {
            runner,
            downloader,
            privileges,
            accounts,
            source_root,
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Context backed by the real host, rooted at the current directory.
    pub fn system() -> anyhow::Result<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let source_root = std::env::current_dir()?;
        Ok(Self::new(
            runner.clone(),
            Arc::new(HttpDownloader::new()?),
            Arc::new(EffectiveUid),
            Arc::new(SystemAccounts::new(runner)),
            source_root,
        ))
    }

    /// Override the host architecture (Rust target naming).
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn downloader(&self) -> &dyn Downloader {
        self.downloader.as_ref()
    }

    pub fn privileges(&self) -> &dyn PrivilegeProbe {
        self.privileges.as_ref()
    }

    pub fn accounts(&self) -> &dyn AccountDirectory {
        self.accounts.as_ref()
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }
}

impl fmt::Debug for ProvisionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionContext")
            .field("source_root", &self.source_root)
            .field("arch", &self.arch)
            .finish_non_exhaustive()
    }
}
