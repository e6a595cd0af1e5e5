//! Error taxonomy for provisioning failures.

use std::path::PathBuf;

use thiserror::Error;

/// A fatal provisioning error. Every variant aborts the pipeline.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The invoking principal lacks administrative authority.
    #[error("this command must be run as root (effective uid {uid})")]
    Unauthorized { uid: u32 },

    /// An external command exited with a non-success status.
    #[error("`{command}` failed with {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("failed to launch `{command}`")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("build did not produce the expected artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("unsupported host architecture: {0}")]
    UnsupportedArch(String),

    #[error("unsupported archive format: {}", .0.display())]
    UnsupportedArchive(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProvisionError {
    /// Wrap an I/O error with a description of the failed operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Attach path context to raw I/O results.
pub(crate) trait IoResultExt<T> {
    fn io_context<F, S>(self, f: F) -> Result<T, ProvisionError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T, ProvisionError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| ProvisionError::io(f(), source))
    }
}
