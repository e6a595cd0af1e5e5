//! Ports to the external systems the pipeline mutates.
//!
//! Steps never touch the package manager, network, account database, or
//! systemd directly; they go through these traits so tests can substitute
//! recording fakes.

pub mod accounts;
pub mod command;
pub mod download;
pub mod privilege;

pub use accounts::{AccountDirectory, SystemAccount, SystemAccounts};
pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use download::{Downloader, HttpDownloader};
pub use privilege::{EffectiveUid, PrivilegeProbe};

use crate::error::ProvisionError;

/// Map a Rust target architecture name to the naming used by toolchain
/// release archives.
pub fn release_arch(rust_arch: &str) -> Result<&'static str, ProvisionError> {
    match rust_arch {
        "x86_64" => Ok("amd64"),
        "aarch64" => Ok("arm64"),
        "x86" => Ok("386"),
        "arm" => Ok("armv6l"),
        "powerpc64" if cfg!(target_endian = "little") => Ok("ppc64le"),
        "s390x" => Ok("s390x"),
        other => Err(ProvisionError::UnsupportedArch(other.to_string())),
    }
}
