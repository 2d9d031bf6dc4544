//! Supervision of the built application
//!
//! The supervisor owns at most one child process. `restart` kills and reaps
//! the current child before spawning the replacement, under one lock, so two
//! supervised instances never coexist. Spawning does not wait for the child to
//! initialize.

use gowatch_core::Config;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::command::resolve_program;

/// How to launch the artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Artifact path, relative to the project root unless absolute
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Added to the inherited environment
    pub env: BTreeMap<String, String>,
}

impl RunSpec {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.build.output.clone(),
            args: config.run.args.clone(),
            env: config.run.env.clone(),
        }
    }
}

/// Broadcast once per successful start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStarted {
    pub pid: u32,
    pub program: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("supervised process {pid} is still running")]
    AlreadyRunning { pid: u32 },

    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to kill process {pid}: {source}")]
    Kill {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

/// Owner of the supervised child process
pub struct Supervisor {
    root: PathBuf,
    child: Mutex<Option<Child>>,
    started: broadcast::Sender<ProcessStarted>,
}

impl Supervisor {
    pub fn new(root: &Path) -> Self {
        let (started, _) = broadcast::channel(16);
        Self {
            root: root.to_path_buf(),
            child: Mutex::new(None),
            started,
        }
    }

    /// Receive a notification for every start
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessStarted> {
        self.started.subscribe()
    }

    /// Launch the artifact; fails if a child is still running
    pub async fn start(&self, spec: &RunSpec) -> Result<u32, SupervisorError> {
        let mut slot = self.child.lock().await;

        // A child that exited on its own leaves the slot free again
        let running = match slot.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => Some(child.id().unwrap_or_default()),
                _ => None,
            },
            None => None,
        };
        if let Some(pid) = running {
            return Err(SupervisorError::AlreadyRunning { pid });
        }

        self.spawn_into(&mut slot, spec)
    }

    /// Forcefully stop the current child, if any, and reap it
    pub async fn kill(&self) -> Result<Option<ExitStatus>, SupervisorError> {
        let mut slot = self.child.lock().await;
        kill_slot(&mut slot).await
    }

    /// Kill the current child, then start a new one
    ///
    /// A failed kill is logged and does not prevent the start.
    pub async fn restart(&self, spec: &RunSpec) -> Result<u32, SupervisorError> {
        let mut slot = self.child.lock().await;

        match kill_slot(&mut slot).await {
            Ok(Some(status)) => info!("Previous process exited: {}", status),
            Ok(None) => {}
            Err(e) => warn!("Kill -> {}", e),
        }

        self.spawn_into(&mut slot, spec)
    }

    /// Pid of the live child
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(Child::id)
    }

    /// True while a child is live
    pub async fn is_running(&self) -> bool {
        match self.child.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn spawn_into(&self, slot: &mut Option<Child>, spec: &RunSpec) -> Result<u32, SupervisorError> {
        let shown = explicit_relative(&spec.program);
        let program = resolve_program(&self.root, &shown);
        info!("Restarting {} ...", shown.display());

        let child = Command::new(&program)
            .args(&spec.args)
            .envs(&spec.env)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: program.clone(),
                source,
            })?;

        let pid = child.id().unwrap_or_default();
        *slot = Some(child);

        info!("Run {} {}", shown.display(), spec.args.join(" "));
        info!("{} is running... (pid {})", shown.display(), pid);

        // No subscribers is fine
        let _ = self.started.send(ProcessStarted { pid, program });
        Ok(pid)
    }
}

async fn kill_slot(slot: &mut Option<Child>) -> Result<Option<ExitStatus>, SupervisorError> {
    let mut child = match slot.take() {
        Some(child) => child,
        None => return Ok(None),
    };

    if let Ok(Some(status)) = child.try_wait() {
        return Ok(Some(status));
    }

    let pid = child.id().unwrap_or_default();
    child
        .kill()
        .await
        .map_err(|source| SupervisorError::Kill { pid, source })?;
    let status = child
        .wait()
        .await
        .map_err(|source| SupervisorError::Kill { pid, source })?;
    Ok(Some(status))
}

/// Give a bare artifact name an explicit relative form (`app` -> `./app`)
pub fn explicit_relative(program: &Path) -> PathBuf {
    match program.components().next() {
        Some(Component::CurDir) | Some(Component::ParentDir) => program.to_path_buf(),
        _ if program.is_absolute() => program.to_path_buf(),
        _ => Path::new(".").join(program),
    }
}
