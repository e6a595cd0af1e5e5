//! Recursive source tree copy.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, ProvisionError};

/// Whether two paths resolve to the same directory.
///
/// A path that cannot be canonicalized (usually because it does not exist
/// yet) never matches.
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy every entry of `src` into `dst`, hidden entries included.
///
/// Existing files in `dst` are overwritten; nothing is removed. Symlinks
/// are recreated rather than followed. `skip` excludes one path (the
/// destination itself when it lies inside the source tree).
pub fn copy_tree(src: &Path, dst: &Path, skip: Option<&Path>) -> Result<u64, ProvisionError> {
    fs::create_dir_all(dst)
        .io_context(|| format!("Failed to create directory: {}", dst.display()))?;

    let mut copied = 0;
    for entry in fs::read_dir(src).io_context(|| format!("Failed to read dir: {}", src.display()))?
    {
        let entry = entry.io_context(|| format!("Failed to read dir entry: {}", src.display()))?;
        let from = entry.path();
        if skip.is_some_and(|skip| same_location(&from, skip)) {
            tracing::debug!(path = %from.display(), "skipping destination inside source tree");
            continue;
        }

        let ty = entry
            .file_type()
            .io_context(|| format!("Failed to stat dir entry: {}", from.display()))?;
        let to = dst.join(entry.file_name());

        if ty.is_dir() {
            copied += copy_tree(&from, &to, skip)?;
        } else if ty.is_file() {
            fs::copy(&from, &to).io_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    from.display(),
                    to.display()
                )
            })?;
            copied += 1;
        } else if ty.is_symlink() {
            copy_symlink(&from, &to)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), ProvisionError> {
    let target =
        fs::read_link(from).io_context(|| format!("Failed to read link: {}", from.display()))?;
    if fs::symlink_metadata(to).is_ok() {
        fs::remove_file(to).io_context(|| format!("Failed to replace link: {}", to.display()))?;
    }
    std::os::unix::fs::symlink(&target, to)
        .io_context(|| format!("Failed to create symlink: {}", to.display()))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), ProvisionError> {
    fs::copy(from, to)
        .map(|_| ())
        .io_context(|| format!("Failed to copy {}", from.display()))
}
