//! Workspace layout for one deployment
//!
//! A workspace is the deterministic filesystem location
//! `{bots_dir}/{bot_id}/{version}` holding a bot's fetched source and, when
//! a dependency manifest exists, its provisioned runtime. The value is
//! computed per request and never shared mutably: two identical requests
//! resolve to the same path, which is how repeated deploys reuse the fetch.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::OrchestratorError;

/// Name of the dependency manifest inside `source/`
pub const MANIFEST_FILE: &str = "requirements.txt";

/// Name of the workload entry point inside `source/`
pub const ENTRY_POINT: &str = "main.py";

/// Filesystem workspace for one (bot_id, version) pair
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Resolve the workspace for a request.
    ///
    /// Both identifiers become single path components, so anything that
    /// could escape the bots directory is rejected up front.
    pub fn resolve(
        bots_dir: &Path,
        bot_id: &str,
        version: &str,
    ) -> Result<Self, OrchestratorError> {
        validate_component("bot_id", bot_id)?;
        validate_component("version", version)?;

        Ok(Self {
            root: bots_dir.join(bot_id).join(version),
        })
    }

    /// Workspace root: `{bots_dir}/{bot_id}/{version}`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fetched source tree
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("source")
    }

    /// Provisioned runtime environment
    pub fn env_dir(&self) -> PathBuf {
        self.root.join("env")
    }

    /// Dependency manifest inside the source tree
    pub fn manifest_file(&self) -> PathBuf {
        self.source_dir().join(MANIFEST_FILE)
    }

    /// Workload entry point inside the source tree
    pub fn entry_point(&self) -> PathBuf {
        self.source_dir().join(ENTRY_POINT)
    }

    /// Python interpreter inside the provisioned environment
    pub fn env_python(&self) -> PathBuf {
        self.env_dir().join("bin").join("python")
    }

    /// Pip inside the provisioned environment
    pub fn env_pip(&self) -> PathBuf {
        self.env_dir().join("bin").join("pip")
    }

    /// Whether the source tree has already been fetched
    pub async fn has_source(&self) -> bool {
        dir_exists(&self.source_dir()).await
    }

    /// Whether a dependency manifest is present in the source tree
    pub async fn has_manifest(&self) -> bool {
        fs::metadata(self.manifest_file())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Whether a runtime environment has been provisioned
    pub async fn has_env(&self) -> bool {
        dir_exists(&self.env_dir()).await
    }

    /// Create the workspace root (and parents)
    pub async fn create(&self) -> Result<(), OrchestratorError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| OrchestratorError::Workspace(format!("{}: {}", self.root.display(), e)))
    }
}

async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

fn validate_component(field: &str, value: &str) -> Result<(), OrchestratorError> {
    if value.is_empty() {
        return Err(OrchestratorError::Validation(format!("{} is empty", field)));
    }
    if value == "." || value == ".." {
        return Err(OrchestratorError::Validation(format!(
            "{} must not be a relative path component",
            field
        )));
    }
    if value.contains('/') || value.contains('\\') || value.contains('\0') {
        return Err(OrchestratorError::Validation(format!(
            "{} must not contain path separators",
            field
        )));
    }
    Ok(())
}
