//! In-memory backend with canned build models.
//!
//! Used by orchestrator tests and by embedding hosts that already know
//! their participants' project structure. Acquisition, model, and stop
//! failures are injectable per participant path, and stops are counted so
//! callers can assert the release guarantee.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use interbuild_shared::{
    BuildModel, DiscoveredProject, InterbuildError, LaunchParameters, ParticipantBuild, Result,
    SessionId,
};

use crate::{BuildRequestContext, SessionServices};

use super::{BuildBackend, BuildSession};

/// Backend serving preconfigured models from memory.
#[derive(Default)]
pub struct MemoryBackend {
    builds: HashMap<PathBuf, Vec<DiscoveredProject>>,
    acquire_failures: HashMap<PathBuf, String>,
    model_failures: HashMap<PathBuf, String>,
    stop_failures: Vec<PathBuf>,
    stop_counts: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant with its discoverable projects.
    pub fn with_build(
        mut self,
        root: impl Into<PathBuf>,
        projects: Vec<DiscoveredProject>,
    ) -> Self {
        self.builds.insert(root.into(), projects);
        self
    }

    /// Make session acquisition itself fail for `root` (no session exists,
    /// so nothing gets stopped).
    pub fn failing_acquire(mut self, root: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        self.acquire_failures.insert(root.into(), message.into());
        self
    }

    /// Make model building fail for `root`'s session, after acquisition.
    pub fn failing_model(mut self, root: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        self.model_failures.insert(root.into(), message.into());
        self
    }

    /// Make `stop()` fail for sessions of `root`.
    pub fn failing_stop(mut self, root: impl Into<PathBuf>) -> Self {
        self.stop_failures.push(root.into());
        self
    }

    /// How many times a session for `root` has been stopped.
    pub fn stop_count(&self, root: impl AsRef<Path>) -> usize {
        self.stop_counts
            .lock()
            .expect("stop counts lock poisoned")
            .get(root.as_ref())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl BuildBackend for MemoryBackend {
    async fn new_session(
        &self,
        parameters: &LaunchParameters,
        request: &BuildRequestContext,
        _services: Arc<SessionServices>,
    ) -> Result<Box<dyn BuildSession>> {
        let root = parameters.project_dir.clone();

        if let Some(message) = self.acquire_failures.get(&root) {
            return Err(InterbuildError::launch(&root, message.clone()));
        }

        let session_id = SessionId::new();
        debug!(session = %session_id, participant = %root.display(), "memory session acquired");

        Ok(Box::new(MemorySession {
            session_id,
            quiet: parameters.log_level.is_quiet(),
            request: request.clone(),
            projects: self.builds.get(&root).cloned(),
            model_failure: self.model_failures.get(&root).cloned(),
            fail_stop: self.stop_failures.contains(&root),
            stop_counts: Arc::clone(&self.stop_counts),
            model: None,
            root,
        }))
    }
}

struct MemorySession {
    session_id: SessionId,
    root: PathBuf,
    quiet: bool,
    request: BuildRequestContext,
    projects: Option<Vec<DiscoveredProject>>,
    model_failure: Option<String>,
    fail_stop: bool,
    stop_counts: Arc<Mutex<HashMap<PathBuf, usize>>>,
    model: Option<BuildModel>,
}

#[async_trait]
impl BuildSession for MemorySession {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    async fn build_model(&mut self) -> Result<&BuildModel> {
        if let Some(message) = &self.model_failure {
            return Err(InterbuildError::launch(&self.root, message.clone()));
        }

        if self.model.is_none() {
            let projects = self
                .projects
                .clone()
                .ok_or_else(|| InterbuildError::launch(&self.root, "unknown participant"))?;

            if !self.quiet {
                for project in &projects {
                    self.request
                        .output
                        .on_line(&format!("> Discovered project {}", project.id));
                }
            }

            self.model = Some(BuildModel {
                participant: ParticipantBuild::new(&self.root),
                projects,
            });
        }

        Ok(self.model.as_ref().expect("model just built"))
    }

    async fn stop(&mut self) -> Result<()> {
        *self
            .stop_counts
            .lock()
            .expect("stop counts lock poisoned")
            .entry(self.root.clone())
            .or_insert(0) += 1;

        if self.fail_stop {
            return Err(InterbuildError::Release(format!(
                "stop failed for {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}
