//! Permission policy for the deployed tree.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::{IoResultExt, ProvisionError};

/// File modes applied after ownership is handed to the service account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    /// Directories under the runtime data tree
    pub data_dir_mode: u32,
    /// Files under the runtime data tree
    pub data_file_mode: u32,
    /// The built executable
    pub artifact_mode: u32,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            data_dir_mode: 0o770,
            data_file_mode: 0o640,
            artifact_mode: 0o770,
        }
    }
}

impl PermissionPolicy {
    /// Apply the policy to the data tree (root included) and the artifact.
    pub fn apply(&self, data_dir: &Path, artifact: &Path) -> Result<(), ProvisionError> {
        self.apply_tree(data_dir)?;
        set_mode(artifact, self.artifact_mode)
    }

    fn apply_tree(&self, dir: &Path) -> Result<(), ProvisionError> {
        set_mode(dir, self.data_dir_mode)?;
        for entry in fs::read_dir(dir).io_context(|| format!("Failed to read dir: {}", dir.display()))?
        {
            let entry =
                entry.io_context(|| format!("Failed to read dir entry: {}", dir.display()))?;
            let path = entry.path();
            let ty = entry
                .file_type()
                .io_context(|| format!("Failed to stat {}", path.display()))?;
            if ty.is_dir() {
                self.apply_tree(&path)?;
            } else if ty.is_file() {
                set_mode(&path, self.data_file_mode)?;
            }
        }
        Ok(())
    }
}

fn set_mode(path: &Path, mode: u32) -> Result<(), ProvisionError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .io_context(|| format!("Failed to set mode {:o} on {}", mode, path.display()))
}
