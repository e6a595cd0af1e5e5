//! Scratch build directories.

use std::path::Path;

use tempfile::TempDir;

use crate::error::{IoResultExt, ProvisionError};

/// A temporary build directory removed when dropped.
///
/// Holding the guard for the whole build sequence guarantees removal on
/// success, on `?` early returns, and on panics that unwind.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a scratch directory under `parent`, or the system temp dir.
    pub fn create(prefix: &str, parent: Option<&Path>) -> Result<Self, ProvisionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).io_context(|| {
                    format!("Failed to create scratch parent: {}", parent.display())
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .io_context(|| "Failed to create scratch directory")?;
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        tracing::debug!(path = %self.dir.path().display(), "removing scratch directory");
    }
}
