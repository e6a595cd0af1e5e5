#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use url::Url;

use hostup_core::config::ProvisionConfig;
use hostup_core::context::ProvisionContext;
use hostup_core::error::ProvisionError;
use hostup_core::host::{
    AccountDirectory, CommandOutput, CommandRunner, CommandSpec, Downloader, PrivilegeProbe,
    SystemAccount,
};

type Matcher = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;

/// Records every command and succeeds unless a failure rule matches.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    fail_on: Mutex<Option<Matcher>>,
}

impl FakeRunner {
    pub fn fail_when(&self, matcher: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) {
        *self.fail_on.lock().unwrap() = Some(Box::new(matcher));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProvisionError> {
        self.calls.lock().unwrap().push(spec.clone());
        let failing = self
            .fail_on
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|matcher| matcher(spec));
        if failing {
            Ok(CommandOutput::failed(2, "fatal error: simulated failure"))
        } else {
            Ok(CommandOutput::ok())
        }
    }
}

/// Serves the same single-root tarball for every URL.
#[derive(Default)]
pub struct FakeDownloader {
    urls: Mutex<Vec<Url>>,
}

impl FakeDownloader {
    pub fn urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &Url, dest: &Path) -> Result<(), ProvisionError> {
        self.urls.lock().unwrap().push(url.clone());
        write_tarball(dest).map_err(|e| ProvisionError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn write_tarball(dest: &Path) -> std::io::Result<()> {
    let file = fs::File::create(dest)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (path, body) in [
        ("pkg/README", b"fixture\n".as_slice()),
        ("pkg/bin/tool", b"#!/bin/sh\n".as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, body)?;
    }
    builder.into_inner()?.finish()?;
    Ok(())
}

pub struct FakePrivileges(pub u32);

impl PrivilegeProbe for FakePrivileges {
    fn effective_uid(&self) -> u32 {
        self.0
    }
}

#[derive(Default)]
pub struct FakeAccounts {
    existing: Mutex<HashSet<String>>,
    created: Mutex<Vec<SystemAccount>>,
}

impl FakeAccounts {
    pub fn with_existing(name: &str) -> Self {
        let accounts = Self::default();
        accounts.existing.lock().unwrap().insert(name.to_string());
        accounts
    }

    pub fn created(&self) -> Vec<SystemAccount> {
        self.created.lock().unwrap().clone()
    }
}

impl AccountDirectory for FakeAccounts {
    fn exists(&self, name: &str) -> Result<bool, ProvisionError> {
        Ok(self.existing.lock().unwrap().contains(name))
    }

    fn create_system(&self, account: &SystemAccount) -> Result<(), ProvisionError> {
        self.existing.lock().unwrap().insert(account.name.clone());
        self.created.lock().unwrap().push(account.clone());
        Ok(())
    }
}

/// A sandboxed host: every path the pipeline writes lives under one temp dir.
pub struct TestHost {
    pub root: TempDir,
    pub runner: Arc<FakeRunner>,
    pub downloader: Arc<FakeDownloader>,
    pub accounts: Arc<FakeAccounts>,
    pub config: ProvisionConfig,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_accounts(FakeAccounts::default())
    }

    pub fn with_accounts(accounts: FakeAccounts) -> Self {
        let root = TempDir::new().unwrap();
        let base = root.path();

        let source = base.join("src");
        fs::create_dir_all(source.join("bin")).unwrap();
        fs::create_dir_all(source.join("config")).unwrap();
        fs::write(source.join("bin/app"), b"\x7fELF").unwrap();
        fs::write(source.join("config/default.toml"), "port = 8080\n").unwrap();
        fs::write(source.join(".env"), "MODE=prod\n").unwrap();
        fs::write(source.join("Makefile"), "backend:\n").unwrap();

        let mut config = ProvisionConfig::default();
        config.app.install_dir = base.join("opt/app");
        config.app.scratch_parent = Some(base.join("scratch"));
        config.native_lib.prefix = base.join("usr/local");
        config.toolchain.install_dir = base.join("usr/local/go");
        config.toolchain.profile_path = base.join("etc/profile");
        config.service.unit_dir = base.join("etc/systemd/system");

        Self {
            root,
            runner: Arc::new(FakeRunner::default()),
            downloader: Arc::new(FakeDownloader::default()),
            accounts: Arc::new(accounts),
            config,
        }
    }

    pub fn source(&self) -> PathBuf {
        self.root.path().join("src")
    }

    pub fn scratch_parent(&self) -> PathBuf {
        self.root.path().join("scratch")
    }

    pub fn context(&self, uid: u32) -> ProvisionContext {
        self.context_at(uid, self.source())
    }

    pub fn context_at(&self, uid: u32, source_root: PathBuf) -> ProvisionContext {
        ProvisionContext::new(
            self.runner.clone(),
            self.downloader.clone(),
            Arc::new(FakePrivileges(uid)),
            self.accounts.clone(),
            source_root,
        )
        .with_arch("x86_64")
    }

    /// Every file and directory under the sandbox, relative to its root.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut entries = Vec::new();
        collect(self.root.path(), self.root.path(), &mut entries);
        entries.sort();
        entries
    }
}

fn collect(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        out.push(path.strip_prefix(base).unwrap().to_path_buf());
        if path.is_dir() {
            collect(base, &path, out);
        }
    }
}
