//! Configuration schema for hostup.toml
//!
//! Every section is optional. Missing fields take the built-in defaults,
//! so an empty file describes the same pipeline as no file at all.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure for hostup.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvisionConfig {
    pub app: AppConfig,
    pub packages: PackageConfig,
    pub native_lib: NativeLibConfig,
    pub toolchain: ToolchainConfig,
    pub account: AccountConfig,
    pub build: BuildConfig,
    pub runtime: RuntimeConfig,
    pub service: ServiceConfig,
}

/// The application being installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// Root for installed artifacts, configuration, and runtime data
    pub install_dir: PathBuf,
    /// Service account name (defaults to `name`)
    pub account: Option<String>,
    /// systemd unit name without the `.service` suffix (defaults to `name`)
    pub service_name: Option<String>,
    pub description: Option<String>,
    /// Port reported in the success summary
    pub listen_port: u16,
    /// Parent for scratch download/build directories (system temp dir when absent)
    pub scratch_parent: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            install_dir: PathBuf::from("/opt/app"),
            account: None,
            service_name: None,
            description: None,
            listen_port: 8080,
            scratch_parent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Apt,
}

/// Native packages installed through the system package manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    pub manager: PackageManager,
    pub names: Vec<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        let names = [
            "build-essential",
            "pkg-config",
            "autoconf",
            "automake",
            "libtool",
            "git",
            "curl",
            "ca-certificates",
            "libjpeg-dev",
            "libpng-dev",
            "libtiff-dev",
            "libgif-dev",
        ];
        Self {
            manager: PackageManager::Apt,
            names: names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Native library built from a pinned source archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeLibConfig {
    pub name: String,
    pub version: semver::Version,
    /// Archive URL template; `{name}` and `{version}` are substituted
    pub url: String,
    pub configure_flags: Vec<String>,
    pub prefix: PathBuf,
    /// Expected blake3 hex digest of the archive. Unverified when absent.
    pub blake3: Option<String>,
    /// Refresh the dynamic linker cache after install
    pub ldconfig: bool,
}

impl Default for NativeLibConfig {
    fn default() -> Self {
        Self {
            name: "libwebp".to_string(),
            version: semver::Version::new(1, 4, 0),
            url: "https://storage.googleapis.com/downloads.webmproject.org/releases/webp/{name}-{version}.tar.gz"
                .to_string(),
            configure_flags: vec!["--enable-libwebpmux".to_string()],
            prefix: PathBuf::from("/usr/local"),
            blake3: None,
            ldconfig: true,
        }
    }
}

/// Pinned build toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub name: String,
    pub version: semver::Version,
    /// Archive URL template; `{version}` and `{arch}` are substituted
    pub url: String,
    /// Canonical install path, removed before every install
    pub install_dir: PathBuf,
    pub bin_subdir: PathBuf,
    /// System-wide profile receiving the PATH entry
    pub profile_path: PathBuf,
    pub blake3: Option<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            name: "go".to_string(),
            version: semver::Version::new(1, 22, 5),
            url: "https://go.dev/dl/go{version}.linux-{arch}.tar.gz".to_string(),
            install_dir: PathBuf::from("/usr/local/go"),
            bin_subdir: PathBuf::from("bin"),
            profile_path: PathBuf::from("/etc/profile"),
            blake3: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub shell: PathBuf,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/usr/sbin/nologin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Commands run in order inside the install dir
    pub commands: Vec<Vec<String>>,
    /// Built executable, relative to the install dir (defaults to `bin/<name>`)
    pub artifact: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            commands: vec![
                vec!["make".to_string(), "init".to_string()],
                vec!["make".to_string(), "backend".to_string()],
            ],
            artifact: None,
        }
    }
}

/// What to do with an existing runtime configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigPolicy {
    /// Replace it with the shipped defaults on every run
    #[default]
    Overwrite,
    /// Keep an existing file untouched
    IfAbsent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime data tree, relative to the install dir
    pub data_dir: PathBuf,
    /// Configuration subtree, relative to the data dir
    pub config_dir: PathBuf,
    /// Shipped default configuration, relative to the install dir
    pub default_config: PathBuf,
    pub config_file: String,
    pub config_policy: ConfigPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            config_dir: PathBuf::from("config"),
            default_config: PathBuf::from("config/default.toml"),
            config_file: "config.toml".to_string(),
            config_policy: ConfigPolicy::Overwrite,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub unit_dir: PathBuf,
    pub restart_sec: u32,
    pub wanted_by: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unit_dir: PathBuf::from("/etc/systemd/system"),
            restart_sec: 5,
            wanted_by: "multi-user.target".to_string(),
        }
    }
}

impl ProvisionConfig {
    pub fn account_name(&self) -> &str {
        self.app.account.as_deref().unwrap_or(&self.app.name)
    }

    pub fn service_name(&self) -> &str {
        self.app.service_name.as_deref().unwrap_or(&self.app.name)
    }

    pub fn description(&self) -> String {
        self.app
            .description
            .clone()
            .unwrap_or_else(|| format!("{} service", self.app.name))
    }

    pub fn install_dir(&self) -> &Path {
        &self.app.install_dir
    }

    /// Absolute path of the built executable.
    pub fn artifact_path(&self) -> PathBuf {
        match &self.build.artifact {
            Some(rel) => self.app.install_dir.join(rel),
            None => self.app.install_dir.join("bin").join(&self.app.name),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.app.install_dir.join(&self.runtime.data_dir)
    }

    pub fn runtime_config_dir(&self) -> PathBuf {
        self.data_dir().join(&self.runtime.config_dir)
    }

    pub fn runtime_config_path(&self) -> PathBuf {
        self.runtime_config_dir().join(&self.runtime.config_file)
    }

    pub fn default_config_source(&self) -> PathBuf {
        self.app.install_dir.join(&self.runtime.default_config)
    }

    pub fn unit_path(&self) -> PathBuf {
        self.service
            .unit_dir
            .join(format!("{}.service", self.service_name()))
    }

    pub fn toolchain_bin_dir(&self) -> PathBuf {
        self.toolchain.install_dir.join(&self.toolchain.bin_subdir)
    }

    pub fn service_url(&self) -> String {
        format!("http://localhost:{}", self.app.listen_port)
    }

    /// Download URL of the native library source archive.
    pub fn native_lib_url(&self) -> anyhow::Result<Url> {
        let raw = self
            .native_lib
            .url
            .replace("{name}", &self.native_lib.name)
            .replace("{version}", &self.native_lib.version.to_string());
        Url::parse(&raw).map_err(|e| anyhow::anyhow!("Invalid native_lib.url '{}': {}", raw, e))
    }

    /// Download URL of the toolchain archive for `arch`.
    pub fn toolchain_url(&self, arch: &str) -> anyhow::Result<Url> {
        let raw = self
            .toolchain
            .url
            .replace("{version}", &self.toolchain.version.to_string())
            .replace("{arch}", arch);
        Url::parse(&raw).map_err(|e| anyhow::anyhow!("Invalid toolchain.url '{}': {}", raw, e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.app.name.trim().is_empty() {
            anyhow::bail!("app.name must not be empty");
        }
        validate_account_name(self.account_name())?;
        validate_account_name(self.service_name())
            .map_err(|e| anyhow::anyhow!("Invalid service name: {}", e))?;

        ensure_install_root("app.install_dir", &self.app.install_dir)?;
        ensure_unit_safe_path("app.install_dir", &self.app.install_dir)?;
        if let Some(description) = &self.app.description
            && description.chars().any(char::is_control)
        {
            anyhow::bail!("app.description must be a single line without control characters");
        }
        ensure_absolute("native_lib.prefix", &self.native_lib.prefix)?;
        ensure_install_root("toolchain.install_dir", &self.toolchain.install_dir)?;
        ensure_absolute("toolchain.profile_path", &self.toolchain.profile_path)?;
        ensure_absolute("service.unit_dir", &self.service.unit_dir)?;
        ensure_absolute("account.shell", &self.account.shell)?;

        ensure_relative("toolchain.bin_subdir", &self.toolchain.bin_subdir)?;
        ensure_relative("runtime.data_dir", &self.runtime.data_dir)?;
        ensure_relative("runtime.config_dir", &self.runtime.config_dir)?;
        ensure_relative("runtime.default_config", &self.runtime.default_config)?;
        if let Some(artifact) = &self.build.artifact {
            ensure_relative("build.artifact", artifact)?;
            ensure_unit_safe_path("build.artifact", artifact)?;
        }
        if self.runtime.config_file.is_empty() || self.runtime.config_file.contains('/') {
            anyhow::bail!("runtime.config_file must be a plain file name");
        }

        if self.build.commands.is_empty() {
            anyhow::bail!("build.commands must contain at least one command");
        }
        if self.build.commands.iter().any(|argv| argv.is_empty()) {
            anyhow::bail!("build.commands entries must not be empty");
        }

        self.native_lib_url()?;
        // Any supported arch renders the same shape; amd64 is representative.
        self.toolchain_url("amd64")?;

        for (field, digest) in [
            ("native_lib.blake3", &self.native_lib.blake3),
            ("toolchain.blake3", &self.toolchain.blake3),
        ] {
            if let Some(digest) = digest {
                validate_blake3(field, digest)?;
            }
        }

        Ok(())
    }
}

fn validate_account_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || name.len() > 32 {
        anyhow::bail!("Account name must be 1-32 characters (got '{}')", name);
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if name.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Account name '{}' must not be purely numeric", name);
    }
    if !valid || name.starts_with('-') {
        anyhow::bail!(
            "Account name '{}' may only contain lowercase letters, digits, '_' and '-'",
            name
        );
    }
    Ok(())
}

fn validate_blake3(field: &str, digest: &str) -> anyhow::Result<()> {
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("{} must be a 64-character hex digest", field);
    }
    Ok(())
}

fn ensure_absolute(field: &str, path: &Path) -> anyhow::Result<()> {
    if !path.is_absolute() {
        anyhow::bail!("{} must be an absolute path (got {})", field, path.display());
    }
    Ok(())
}

/// An absolute directory below `/` with no `.`/`..` segments.
fn ensure_install_root(field: &str, path: &Path) -> anyhow::Result<()> {
    ensure_absolute(field, path)?;
    let raw = path.to_string_lossy();
    if raw.split('/').any(|segment| segment == "." || segment == "..") {
        anyhow::bail!("{} must not contain '.' or '..' segments (got {})", field, raw);
    }
    if !path.components().any(|c| matches!(c, Component::Normal(_))) {
        anyhow::bail!("{} must not be the filesystem root", field);
    }
    Ok(())
}

/// Paths rendered into the unit file must survive systemd's word splitting.
fn ensure_unit_safe_path(field: &str, path: &Path) -> anyhow::Result<()> {
    if path
        .to_string_lossy()
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        anyhow::bail!(
            "{} must not contain whitespace or control characters (got {:?})",
            field,
            path
        );
    }
    Ok(())
}

fn ensure_relative(field: &str, path: &Path) -> anyhow::Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("{} must not be empty", field);
    }
    for component in path.components() {
        match component {
            Component::ParentDir => {
                anyhow::bail!("{} must not contain '..' (got {})", field, path.display());
            }
            Component::Prefix(_) | Component::RootDir => {
                anyhow::bail!("{} must be a relative path (got {})", field, path.display());
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ProvisionConfig::default()
            .validate()
            .expect("built-in defaults should validate");
    }

    #[test]
    fn derived_paths_follow_install_dir() {
        let config = ProvisionConfig::default();
        assert_eq!(config.artifact_path(), PathBuf::from("/opt/app/bin/app"));
        assert_eq!(
            config.runtime_config_path(),
            PathBuf::from("/opt/app/data/config/config.toml")
        );
        assert_eq!(
            config.unit_path(),
            PathBuf::from("/etc/systemd/system/app.service")
        );
        assert_eq!(config.toolchain_bin_dir(), PathBuf::from("/usr/local/go/bin"));
    }

    #[test]
    fn urls_substitute_placeholders() {
        let config = ProvisionConfig::default();
        assert_eq!(
            config.toolchain_url("arm64").unwrap().as_str(),
            "https://go.dev/dl/go1.22.5.linux-arm64.tar.gz"
        );
        assert!(
            config
                .native_lib_url()
                .unwrap()
                .as_str()
                .ends_with("/libwebp-1.4.0.tar.gz")
        );
    }

    #[test]
    fn rejects_relative_install_dir() {
        let mut config = ProvisionConfig::default();
        config.app.install_dir = PathBuf::from("opt/app");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_uppercase_account() {
        let mut config = ProvisionConfig::default();
        config.app.account = Some("App".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_traversal_in_data_dir() {
        let mut config = ProvisionConfig::default();
        config.runtime.data_dir = PathBuf::from("../escape");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_root_install_dir() {
        for dir in ["/", "/.", "/opt/../"] {
            let mut config = ProvisionConfig::default();
            config.app.install_dir = PathBuf::from(dir);
            assert!(config.validate().is_err(), "accepted install_dir {dir}");
        }
    }

    #[test]
    fn rejects_dot_segments_in_install_dir() {
        for dir in ["/opt/../etc", "/opt/./app"] {
            let mut config = ProvisionConfig::default();
            config.app.install_dir = PathBuf::from(dir);
            assert!(config.validate().is_err(), "accepted install_dir {dir}");
        }
    }

    #[test]
    fn rejects_root_install_dir_from_toml() {
        let err = crate::config::parse_config_str("[app]\ninstall_dir = \"/\"\n").unwrap_err();
        assert!(err.to_string().contains("filesystem root"), "{err}");
    }

    #[test]
    fn rejects_multiline_description() {
        let mut config = ProvisionConfig::default();
        config.app.description = Some("web app\nExecStartPre=/bin/sh -c 'id'".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_whitespace_in_unit_paths() {
        let mut config = ProvisionConfig::default();
        config.app.install_dir = PathBuf::from("/opt/my app");
        assert!(config.validate().is_err());

        let mut config = ProvisionConfig::default();
        config.build.artifact = Some(PathBuf::from("bin/my\tapp"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_numeric_account() {
        let mut config = ProvisionConfig::default();
        config.app.account = Some("0".to_string());
        assert!(config.validate().is_err());

        config.app.account = Some("app2".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_digest() {
        let mut config = ProvisionConfig::default();
        config.native_lib.blake3 = Some("abc".to_string());
        assert!(config.validate().is_err());
    }
}
