//! Build pipeline
//!
//! A fixed sequence: pre-commands, code generation, compile, then a restart of
//! the supervised app. Each stage gates the next; a failing stage aborts the
//! run and leaves the running app untouched. Every command runs with the
//! project root as its working directory.

use gowatch_core::config::BuildConfig;
use gowatch_core::{CommandSpec, Config, GenerateTarget};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{error, info};

use crate::command::Invocation;
use crate::supervisor::{RunSpec, Supervisor};

/// Pipeline stage, used to report where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Checking the project root
    Prepare,
    PreCommand,
    Generate,
    Compile,
}

/// Verdict of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All stages passed; `restarted` tells whether the app was (re)started
    Succeeded { restarted: bool },
    /// The named stage failed and no later stage ran
    Aborted(Stage),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

/// The build pipeline for one project
pub struct Pipeline {
    root: PathBuf,
    build: BuildConfig,
    run: RunSpec,
    run_disabled: bool,
    supervisor: Arc<Supervisor>,
}

impl Pipeline {
    /// Create a pipeline from a finalized configuration
    pub fn new(root: &Path, config: &Config, supervisor: Arc<Supervisor>) -> Self {
        Self {
            root: root.to_path_buf(),
            build: config.build.clone(),
            run: RunSpec::from_config(config),
            run_disabled: config.run.disable,
            supervisor,
        }
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// One-time startup work: the `pre_all` commands, then a generate pass
    pub async fn prepare(&self) -> Outcome {
        if !self.root_is_usable() {
            return Outcome::Aborted(Stage::Prepare);
        }
        if !self.run_commands(&self.build.pre_all).await {
            return Outcome::Aborted(Stage::PreCommand);
        }
        if !self.generate().await {
            return Outcome::Aborted(Stage::Generate);
        }
        Outcome::Succeeded { restarted: false }
    }

    /// Run every stage; restart the app on success unless running is disabled
    pub async fn run(&self) -> Outcome {
        info!("Start building...");

        if !self.root_is_usable() {
            return Outcome::Aborted(Stage::Prepare);
        }
        if !self.run_commands(&self.build.pre).await {
            return Outcome::Aborted(Stage::PreCommand);
        }
        if !self.generate().await {
            return Outcome::Aborted(Stage::Generate);
        }
        if !self.compile().await {
            return Outcome::Aborted(Stage::Compile);
        }

        if self.run_disabled {
            return Outcome::Succeeded { restarted: false };
        }

        let restarted = match self.supervisor.restart(&self.run).await {
            Ok(_) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        };
        Outcome::Succeeded { restarted }
    }

    fn root_is_usable(&self) -> bool {
        if self.root.is_dir() {
            return true;
        }
        error!("Chdir Error: {} is not a directory", self.root.display());
        false
    }

    async fn run_commands(&self, commands: &[CommandSpec]) -> bool {
        for spec in commands {
            let ok = Invocation::new(spec.cmd.as_str(), &self.root)
                .args(spec.args.iter().cloned())
                .run(&spec.cmd)
                .await;
            if !ok {
                return false;
            }
        }
        true
    }

    /// Sources whose generated output is missing or not newer than the source
    pub fn stale_sources(&self) -> Vec<PathBuf> {
        self.build
            .generate
            .iter()
            .filter(|target| {
                let fresh = is_up_to_date(&self.root, target);
                if fresh {
                    info!(
                        "{} is up to date, skipping generate",
                        target.output.display()
                    );
                }
                !fresh
            })
            .map(|target| target.source.clone())
            .collect()
    }

    /// Generate stage; vacuously successful when nothing is stale
    pub async fn generate(&self) -> bool {
        let sources = self.stale_sources();
        if sources.is_empty() {
            return true;
        }

        Invocation::new(self.build.toolchain.as_str(), &self.root)
            .arg("generate")
            .args(sources.iter().map(|p| p.to_string_lossy().into_owned()))
            .run("Generate")
            .await
    }

    /// Compiler invocation for the compile stage
    pub fn compile_invocation(&self) -> Invocation {
        let mut inv = Invocation::new(self.build.toolchain.as_str(), &self.root)
            .arg("build")
            .arg("-o")
            .arg(self.build.output.to_string_lossy().into_owned())
            .args(self.build.args.iter().cloned());
        if !self.build.tags.is_empty() {
            inv = inv.arg("-tags").arg(self.build.tags.as_str());
        }
        inv.args(self.build.packages.iter().cloned())
            .env("GOGC", "off")
    }

    async fn compile(&self) -> bool {
        self.compile_invocation().run("Build").await
    }
}

/// True when the output exists and is strictly newer than its source
///
/// A source that cannot be stat'ed never forces regeneration of an existing
/// output.
pub fn is_up_to_date(root: &Path, target: &GenerateTarget) -> bool {
    let output = match mtime(&root.join(&target.output)) {
        Some(t) => t,
        None => return false,
    };
    match mtime(&root.join(&target.source)) {
        Some(source) => output > source,
        None => true,
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
