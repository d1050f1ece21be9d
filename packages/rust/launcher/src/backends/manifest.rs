//! Manifest-scanning backend: discovers projects by walking a participant's
//! tree for recognized build manifests.
//!
//! A directory containing one of the configured manifest file names is one
//! discoverable project. `Cargo.toml` manifests contribute their
//! `[package].name` (cached in the session-parent services); every other
//! manifest kind falls back to the directory name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use walkdir::WalkDir;

use interbuild_shared::{
    BuildModel, DiscoveredProject, DiscoveryConfig, InterbuildError, LaunchParameters,
    ParticipantBuild, ProjectComponentId, Result, SessionId,
};

use crate::{BuildRequestContext, SessionServices};

use super::{BuildBackend, BuildSession};

/// Backend that configures participants by scanning for build manifests.
pub struct ManifestBackend {
    discovery: DiscoveryConfig,
}

impl ManifestBackend {
    pub fn new(discovery: DiscoveryConfig) -> Self {
        Self { discovery }
    }
}

impl Default for ManifestBackend {
    fn default() -> Self {
        Self::new(DiscoveryConfig::default())
    }
}

#[async_trait]
impl BuildBackend for ManifestBackend {
    async fn new_session(
        &self,
        parameters: &LaunchParameters,
        request: &BuildRequestContext,
        services: Arc<SessionServices>,
    ) -> Result<Box<dyn BuildSession>> {
        let session_id = SessionId::new();
        debug!(
            session = %session_id,
            participant = %parameters.project_dir.display(),
            "session acquired"
        );

        Ok(Box::new(ManifestSession {
            session_id,
            discovery: self.discovery.clone(),
            parameters: parameters.clone(),
            request: request.clone(),
            services,
            model: None,
            stopped: false,
        }))
    }
}

/// Session that builds its model by manifest discovery on first use.
struct ManifestSession {
    session_id: SessionId,
    discovery: DiscoveryConfig,
    parameters: LaunchParameters,
    request: BuildRequestContext,
    services: Arc<SessionServices>,
    model: Option<BuildModel>,
    stopped: bool,
}

impl ManifestSession {
    fn is_manifest(&self, file_name: &str) -> bool {
        self.discovery.manifest_names.iter().any(|m| m == file_name)
    }

    fn is_excluded_dir(&self, dir_name: &str) -> bool {
        self.discovery.exclude_dirs.iter().any(|d| d == dir_name)
    }

    /// `[package].name` from a `Cargo.toml`. `Ok(None)` means the manifest
    /// parsed but carries no package table (a workspace-only manifest);
    /// `Err` means it could not be read or parsed at all.
    fn parse_manifest_name(manifest: &Path) -> std::result::Result<Option<String>, String> {
        let content = std::fs::read_to_string(manifest).map_err(|e| e.to_string())?;
        let value: toml::Value = toml::from_str(&content).map_err(|e| e.to_string())?;
        Ok(value
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string))
    }

    fn configure(&self) -> Result<BuildModel> {
        let root = self.parameters.project_dir.clone();
        if !root.is_dir() {
            return Err(InterbuildError::launch(
                &root,
                "participant root is not a directory",
            ));
        }

        let participant = ParticipantBuild::new(&root);
        let participant_name = participant.display_name();
        let quiet = self.parameters.log_level.is_quiet();

        let mut projects: Vec<DiscoveredProject> = Vec::new();
        let mut seen_dirs: Vec<PathBuf> = Vec::new();

        let walker = WalkDir::new(&root)
            .max_depth(self.discovery.max_depth)
            .follow_links(self.discovery.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !self.is_excluded_dir(&name)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.request.error.on_line(&format!("discovery error: {e}"));
                    warn!(participant = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if !self.is_manifest(&file_name) {
                continue;
            }

            let project_dir = entry.path().parent().unwrap_or(&root).to_path_buf();

            // One project per directory, even when several manifests coexist.
            if seen_dirs.contains(&project_dir) {
                continue;
            }
            seen_dirs.push(project_dir.clone());

            let rel = project_dir
                .strip_prefix(&root)
                .unwrap_or(Path::new(""))
                .to_path_buf();

            let manifest_path = entry.path().to_path_buf();
            let fallback = if rel.as_os_str().is_empty() {
                participant_name.clone()
            } else {
                project_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| participant_name.clone())
            };
            let name = self.services.project_name(&manifest_path, || {
                if file_name != "Cargo.toml" {
                    return fallback.clone();
                }
                match Self::parse_manifest_name(&manifest_path) {
                    Ok(Some(name)) => name,
                    // Workspace-only manifest: valid, just no package name.
                    Ok(None) => fallback.clone(),
                    Err(e) => {
                        self.request.error.on_line(&format!(
                            "unreadable manifest {}, using directory name",
                            manifest_path.display()
                        ));
                        warn!(
                            manifest = %manifest_path.display(),
                            error = %e,
                            "manifest parse failed"
                        );
                        fallback.clone()
                    }
                }
            });

            let id = ProjectComponentId::for_project(&participant_name, &rel);
            if !quiet {
                self.request
                    .output
                    .on_line(&format!("> Discovered project {id}"));
            }

            projects.push(DiscoveredProject {
                id,
                dir: project_dir,
                name,
            });
        }

        debug!(
            session = %self.session_id,
            participant = %root.display(),
            projects = projects.len(),
            "participant model built"
        );

        Ok(BuildModel {
            participant,
            projects,
        })
    }
}

#[async_trait]
impl BuildSession for ManifestSession {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    async fn build_model(&mut self) -> Result<&BuildModel> {
        if self.stopped {
            return Err(InterbuildError::launch(
                &self.parameters.project_dir,
                "session already stopped",
            ));
        }
        if self.model.is_none() {
            self.model = Some(self.configure()?);
        }
        Ok(self.model.as_ref().expect("model just built"))
    }

    async fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Err(InterbuildError::Release(format!(
                "session {} stopped twice",
                self.session_id
            )));
        }
        self.stopped = true;
        self.model = None;
        debug!(session = %self.session_id, "session stopped");
        Ok(())
    }
}

impl Drop for ManifestSession {
    fn drop(&mut self) {
        if !self.stopped {
            warn!(session = %self.session_id, "session dropped without stop");
        }
    }
}
