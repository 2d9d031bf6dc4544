//! External command execution
//!
//! Every stage runs a child process with inherited stdout/stderr and the
//! project root as its working directory. The exit status is the only signal
//! the pipeline consumes; failures are logged here and reported as `false`.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info};

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
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
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Command line as logged
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run to completion; `true` on a zero exit status
    pub async fn run(&self, label: &str) -> bool {
        info!("Run: {}", self.display());

        let status = Command::new(resolve_program(&self.cwd, Path::new(&self.program)))
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                info!("{} was successful", label);
                true
            }
            Ok(status) => {
                error!("============== {} failed ===================", label);
                error!("{}: {}", self.display(), status);
                false
            }
            Err(e) => {
                error!("============== {} failed ===================", label);
                error!("Could not start {}: {}", self.program, e);
                false
            }
        }
    }
}

/// Resolve a program path for spawning from `cwd`
///
/// Bare names (`go`) are left for `PATH` lookup. Relative paths with a
/// directory part are anchored at `cwd`, since platforms disagree on whether a
/// relative program is resolved before or after changing directory.
pub fn resolve_program(cwd: &Path, program: &Path) -> PathBuf {
    if program.is_absolute() || (program.components().count() <= 1 && !starts_with_dot(program)) {
        return program.to_path_buf();
    }
    gowatch_core::paths::normalize(&cwd.join(program))
}

fn starts_with_dot(path: &Path) -> bool {
    matches!(
        path.components().next(),
        Some(Component::CurDir) | Some(Component::ParentDir)
    )
}
