//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// File name looked up in the source root and the user config directory.
pub const CONFIG_FILE_NAME: &str = "hostup.toml";

/// Find the configuration file to load.
///
/// Lookup order: the explicit path, `<source_root>/hostup.toml`, then
/// `<config_dir>/hostup/hostup.toml`. An explicit path that does not
/// exist is an error; the implicit locations are optional.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    source_root: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let candidates = [
        Some(source_root.join(CONFIG_FILE_NAME)),
        dirs::config_dir().map(|dir| dir.join("hostup").join(CONFIG_FILE_NAME)),
    ];

    Ok(candidates.into_iter().flatten().find(|p| p.is_file()))
}
