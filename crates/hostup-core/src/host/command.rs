//! External command execution.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ProvisionError;

/// A fully described external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    /// Capture stdout/stderr instead of streaming them to the terminal
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            capture: false,
        }
    }

    /// Build from an argv list; the first element is the program.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Human-readable command line for logs and errors.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit status description, e.g. `exit status: 2`
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_string(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: format!("exit status: {code}"),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. A non-zero exit is reported in the
    /// output, not as an error.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProvisionError>;

    /// Run the command and fail on a non-zero exit.
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput, ProvisionError> {
        let output = self.run(spec)?;
        if !output.success {
            return Err(ProvisionError::CommandFailed {
                command: spec.display(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Runs commands on the local host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProvisionError> {
        tracing::debug!(command = %spec.display(), "running");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }

        let spawn_err = |source| ProvisionError::CommandSpawn {
            command: spec.display(),
            source,
        };

        if spec.capture {
            let output = cmd.output().map_err(spawn_err)?;
            Ok(CommandOutput {
                success: output.status.success(),
                status: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd.status().map_err(spawn_err)?;
            Ok(CommandOutput {
                success: status.success(),
                status: status.to_string(),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program() {
        let argv = vec!["make".to_string(), "backend".to_string()];
        let spec = CommandSpec::from_argv(&argv).expect("argv is non-empty");
        assert_eq!(spec.program, "make");
        assert_eq!(spec.args, vec!["backend"]);
        assert_eq!(spec.display(), "make backend");
    }

    #[test]
    fn from_argv_rejects_empty() {
        assert!(CommandSpec::from_argv(&[]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_failure_without_error() {
        let output = SystemRunner
            .run(&CommandSpec::new("false").captured())
            .expect("false should spawn");
        assert!(!output.success);
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_surfaces_stderr() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .captured();
        let err = SystemRunner.run_checked(&spec).unwrap_err();
        match err {
            ProvisionError::CommandFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
