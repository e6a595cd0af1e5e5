//! Provisioning configuration.
//!
//! The built-in defaults describe the whole pipeline; an optional
//! `hostup.toml` overrides any subset of fields.

pub mod parser;
pub mod paths;
pub mod schema;

pub use parser::{parse_config, parse_config_str, to_toml};
pub use paths::resolve_config_path;
pub use schema::{
    AccountConfig, AppConfig, BuildConfig, ConfigPolicy, NativeLibConfig, PackageConfig,
    PackageManager, ProvisionConfig, RuntimeConfig, ServiceConfig, ToolchainConfig,
};

use std::path::Path;

/// Load the effective configuration.
///
/// Uses the first file found by [`resolve_config_path`], or the built-in
/// defaults when no file exists.
pub fn load(explicit: Option<&Path>, source_root: &Path) -> anyhow::Result<ProvisionConfig> {
    match resolve_config_path(explicit, source_root)? {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            parse_config(&path)
        }
        None => {
            tracing::debug!("no configuration file found, using built-in defaults");
            let config = ProvisionConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}
