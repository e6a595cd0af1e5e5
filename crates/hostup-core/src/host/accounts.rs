//! System account lookup and creation.

use std::path::PathBuf;
use std::sync::Arc;

use super::command::{CommandRunner, CommandSpec};
use crate::error::ProvisionError;

/// A non-interactive system account request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemAccount {
    pub name: String,
    pub home: PathBuf,
    pub shell: PathBuf,
}

pub trait AccountDirectory: Send + Sync {
    fn exists(&self, name: &str) -> Result<bool, ProvisionError>;

    fn create_system(&self, account: &SystemAccount) -> Result<(), ProvisionError>;
}

/// Account database access through `id` and `useradd`.
pub struct SystemAccounts {
    runner: Arc<dyn CommandRunner>,
}

impl SystemAccounts {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl AccountDirectory for SystemAccounts {
    fn exists(&self, name: &str) -> Result<bool, ProvisionError> {
        let output = self
            .runner
            .run(&CommandSpec::new("id").args(["-u", name]).captured())?;
        Ok(output.success)
    }

    fn create_system(&self, account: &SystemAccount) -> Result<(), ProvisionError> {
        let spec = CommandSpec::new("useradd")
            .args(["--system", "--no-create-home", "--home-dir"])
            .path_arg(&account.home)
            .arg("--shell")
            .path_arg(&account.shell)
            .arg("--user-group")
            .arg(&account.name)
            .captured();
        self.runner.run_checked(&spec)?;
        Ok(())
    }
}
