//! Deployment step executor
//!
//! Drives the FSM through fetch, provision and execute, appending records
//! to the relay as it goes. Exactly one terminal record (SUCCESS or ERROR)
//! is emitted per deployment, always last. On failure the workspace is left
//! as-is for postmortem inspection; an identical retry request will reuse
//! whatever was already fetched.

use std::path::PathBuf;

use tracing::{error, info};

use botdock_wire::DeployRequest;

use crate::deploy::fsm::{DeployEvent, DeployFsm, DeployStep};
use crate::errors::OrchestratorError;
use crate::relay::LogSink;
use crate::runner::{stream_command, CommandSpec};
use crate::settings::Settings;
use crate::workspace::{Workspace, ENTRY_POINT, MANIFEST_FILE};

/// Executor for one deployment request
#[derive(Debug)]
pub struct Pipeline {
    request: DeployRequest,
    workspace: Workspace,
    git_bin: String,
    python_bin: String,
    fetch_timeout: std::time::Duration,
}

impl Pipeline {
    /// Resolve the workspace and build an executor for one request
    pub fn new(settings: &Settings, request: DeployRequest) -> Result<Self, OrchestratorError> {
        // Subprocesses run with their own working directories, so every
        // workspace path handed to them has to be absolute.
        let bots_dir = if settings.bots_dir.is_absolute() {
            settings.bots_dir.clone()
        } else {
            std::env::current_dir()?.join(&settings.bots_dir)
        };

        let workspace = Workspace::resolve(&bots_dir, &request.bot_id, &request.version)?;

        Ok(Self {
            request,
            workspace,
            git_bin: settings.git_bin.clone(),
            python_bin: settings.python_bin.clone(),
            fetch_timeout: settings.fetch_timeout(),
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run the pipeline to completion.
    ///
    /// The terminal record is appended here, after every step (and every
    /// producer task of the running step) has settled, so the consumer
    /// observes it strictly last.
    pub async fn run(&self, sink: &LogSink) -> Result<(), OrchestratorError> {
        info!(
            bot_id = %self.request.bot_id,
            version = %self.request.version,
            "starting deployment"
        );

        let result = self.drive(sink).await;
        match &result {
            Ok(()) => {
                info!(bot_id = %self.request.bot_id, "deployment finished");
                sink.success("Bot finished successfully.");
            }
            Err(e) => {
                error!(bot_id = %self.request.bot_id, "deployment failed: {}", e);
                sink.error(format!("Deployment failed: {}", e));
            }
        }
        result
    }

    async fn drive(&self, sink: &LogSink) -> Result<(), OrchestratorError> {
        let mut fsm = DeployFsm::new();

        while !fsm.is_terminal() {
            let outcome = match fsm.step() {
                DeployStep::Fetch => self.fetch(sink).await,
                DeployStep::Provision => self.provision(sink).await,
                DeployStep::Execute => self.execute(sink).await,
                DeployStep::Done | DeployStep::Failed => break,
            };

            match outcome {
                Ok(()) => fsm
                    .process(DeployEvent::StepSucceeded)
                    .map_err(OrchestratorError::Internal)?,
                Err(e) => {
                    let _ = fsm.process(DeployEvent::StepFailed(e.to_string()));
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// FETCH: clone the requested version, unless the source tree is
    /// already present from an earlier identical request.
    async fn fetch(&self, sink: &LogSink) -> Result<(), OrchestratorError> {
        if self.workspace.has_source().await {
            sink.info("Source already present locally, skipping fetch.");
            return Ok(());
        }

        self.workspace.create().await?;

        let spec = CommandSpec::new(&self.git_bin)
            .arg("clone")
            .arg("-b")
            .arg(&self.request.version)
            .arg(&self.request.git_repo)
            .arg(self.workspace.source_dir())
            .deadline(self.fetch_timeout);

        sink.info(format!("Running: {}", spec.describe()));

        let capture = stream_command(spec, sink)
            .await
            .map_err(|e| OrchestratorError::Fetch(format!("git clone failed: {}", e)))?;

        if !capture.success() {
            return Err(OrchestratorError::Fetch(format!(
                "git clone failed ({}): {}",
                capture.status,
                capture.stderr_summary()
            )));
        }

        sink.success("Fetch finished successfully.");
        Ok(())
    }

    /// PROVISION: create an isolated environment and install the declared
    /// dependencies. Skipped entirely when no manifest exists.
    async fn provision(&self, sink: &LogSink) -> Result<(), OrchestratorError> {
        if !self.workspace.has_manifest().await {
            sink.info(format!(
                "No {} in source/, skipping environment setup.",
                MANIFEST_FILE
            ));
            return Ok(());
        }

        let venv = CommandSpec::new(&self.python_bin)
            .arg("-m")
            .arg("venv")
            .arg(self.workspace.env_dir());

        let capture = stream_command(venv, sink).await.map_err(|e| {
            OrchestratorError::Provision(format!("environment creation failed: {}", e))
        })?;
        if !capture.success() {
            return Err(OrchestratorError::Provision(format!(
                "environment creation failed ({})",
                capture.status
            )));
        }
        sink.success("Runtime environment created.");

        let install = CommandSpec::new(self.workspace.env_pip())
            .arg("install")
            .arg("-r")
            .arg(MANIFEST_FILE)
            .current_dir(self.workspace.source_dir());

        let capture = stream_command(install, sink).await.map_err(|e| {
            OrchestratorError::Provision(format!("dependency install failed: {}", e))
        })?;
        if !capture.success() {
            return Err(OrchestratorError::Provision(format!(
                "dependency install failed ({})",
                capture.status
            )));
        }

        sink.success("Dependencies installed successfully.");
        Ok(())
    }

    /// EXECUTE: run the workload's entry point from the source tree, with
    /// the provisioned interpreter when one exists.
    async fn execute(&self, sink: &LogSink) -> Result<(), OrchestratorError> {
        let interpreter = if self.workspace.has_env().await {
            self.workspace.env_python()
        } else {
            PathBuf::from(&self.python_bin)
        };

        let spec = CommandSpec::new(interpreter)
            .arg(ENTRY_POINT)
            .current_dir(self.workspace.source_dir());

        let capture = stream_command(spec, sink)
            .await
            .map_err(|e| OrchestratorError::Execution(format!("failed to start bot: {}", e)))?;

        if !capture.success() {
            return Err(OrchestratorError::Execution(format!(
                "bot exited with {}",
                capture.status
            )));
        }

        Ok(())
    }
}
