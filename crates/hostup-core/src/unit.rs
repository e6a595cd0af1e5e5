//! systemd service descriptor.

use std::fmt::Write;
use std::path::PathBuf;

use crate::config::ProvisionConfig;

/// Capability granted to the service: binding ports below 1024.
pub const NET_BIND_CAPABILITY: &str = "CAP_NET_BIND_SERVICE";

/// A systemd unit for the deployed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub description: String,
    pub user: String,
    pub group: String,
    pub working_directory: PathBuf,
    pub exec_start: PathBuf,
    pub restart_sec: u32,
    /// The only path the service may write to
    pub read_write_path: PathBuf,
    pub wanted_by: String,
}

impl ServiceUnit {
    pub fn from_config(config: &ProvisionConfig) -> Self {
        let account = config.account_name().to_string();
        Self {
            description: config.description(),
            user: account.clone(),
            group: account,
            working_directory: config.install_dir().to_path_buf(),
            exec_start: config.artifact_path(),
            restart_sec: config.service.restart_sec,
            read_write_path: config.install_dir().to_path_buf(),
            wanted_by: config.service.wanted_by.clone(),
        }
    }

    /// Render the unit file contents.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let sections: [(&str, Vec<(&str, String)>); 3] = [
            (
                "Unit",
                vec![
                    ("Description", self.description.clone()),
                    ("After", "network-online.target".to_string()),
                    ("Wants", "network-online.target".to_string()),
                ],
            ),
            (
                "Service",
                vec![
                    ("Type", "simple".to_string()),
                    ("User", self.user.clone()),
                    ("Group", self.group.clone()),
                    (
                        "WorkingDirectory",
                        self.working_directory.display().to_string(),
                    ),
                    ("ExecStart", self.exec_start.display().to_string()),
                    ("Restart", "always".to_string()),
                    ("RestartSec", self.restart_sec.to_string()),
                    ("NoNewPrivileges", "true".to_string()),
                    ("PrivateTmp", "true".to_string()),
                    ("ProtectSystem", "strict".to_string()),
                    ("ReadWritePaths", self.read_write_path.display().to_string()),
                    ("CapabilityBoundingSet", NET_BIND_CAPABILITY.to_string()),
                    ("AmbientCapabilities", NET_BIND_CAPABILITY.to_string()),
                ],
            ),
            ("Install", vec![("WantedBy", self.wanted_by.clone())]),
        ];

        for (idx, (name, entries)) in sections.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "[{name}]");
            for (key, value) in entries {
                let _ = writeln!(out, "{key}={value}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> String {
        ServiceUnit::from_config(&ProvisionConfig::default()).render()
    }

    #[test]
    fn declares_identity_and_entry_command() {
        let unit = rendered();
        assert!(unit.contains("\nUser=app\n"));
        assert!(unit.contains("\nGroup=app\n"));
        assert!(unit.contains("\nWorkingDirectory=/opt/app\n"));
        assert!(unit.contains("\nExecStart=/opt/app/bin/app\n"));
    }

    #[test]
    fn declares_restart_policy() {
        let unit = rendered();
        assert!(unit.contains("\nType=simple\n"));
        assert!(unit.contains("\nRestart=always\n"));
        assert!(unit.contains("\nRestartSec=5\n"));
    }

    #[test]
    fn declares_sandboxing() {
        let unit = rendered();
        for line in [
            "NoNewPrivileges=true",
            "PrivateTmp=true",
            "ProtectSystem=strict",
            "ReadWritePaths=/opt/app",
            "CapabilityBoundingSet=CAP_NET_BIND_SERVICE",
            "AmbientCapabilities=CAP_NET_BIND_SERVICE",
        ] {
            assert!(unit.lines().any(|l| l == line), "missing {line}");
        }
    }

    #[test]
    fn enabled_for_boot() {
        let unit = rendered();
        assert!(unit.ends_with("[Install]\nWantedBy=multi-user.target\n"));
    }

    #[test]
    fn sections_are_ordered() {
        let unit = rendered();
        let unit_idx = unit.find("[Unit]").unwrap();
        let service_idx = unit.find("[Service]").unwrap();
        let install_idx = unit.find("[Install]").unwrap();
        assert!(unit_idx < service_idx && service_idx < install_idx);
    }
}
