//! Filesystem primitives shared across steps.

pub mod archive;
pub mod copy;
pub mod permissions;
pub mod profile;
pub mod scratch;
pub mod verify;

pub use archive::extract_archive;
pub use copy::{copy_tree, same_location};
pub use permissions::PermissionPolicy;
pub use profile::ensure_path_entry;
pub use scratch::ScratchDir;
pub use verify::{ArchiveVerifier, Blake3Digest, Unverified, verifier_for};
