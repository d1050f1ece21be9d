//! Core domain types for composite build sessions.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// LogLevel
// ---------------------------------------------------------------------------

/// Log verbosity carried by launch parameters.
///
/// `Info` is the informational baseline: when a composite session runs at
/// `Info`, per-participant launches are downgraded to `Quiet` so each
/// participant's configuration output does not drown the composite log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Whether per-project progress output should be suppressed.
    pub fn is_quiet(self) -> bool {
        self == Self::Quiet
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Quiet => "quiet",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(Self::Quiet),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// LaunchParameters
// ---------------------------------------------------------------------------

/// Parameters controlling one build session launch.
///
/// The composite session owns a base set; per-participant copies are derived
/// from it, never shared, and discarded after the participant completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchParameters {
    /// Root directory of the build the session operates on.
    pub project_dir: PathBuf,
    /// Log verbosity for the session.
    pub log_level: LogLevel,
    /// Whether projects are configured lazily on demand.
    pub configure_on_demand: bool,
    /// Whether the session may reach the network.
    pub offline: bool,
    /// Whether the session should avoid mutating state on disk.
    pub dry_run: bool,
}

impl LaunchParameters {
    /// Parameters for a build rooted at `project_dir`, with defaults elsewhere.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            log_level: LogLevel::Info,
            configure_on_demand: false,
            offline: false,
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ParticipantBuild
// ---------------------------------------------------------------------------

/// One independent build tree included in a composite session.
///
/// Immutable: the root path is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantBuild {
    root_dir: PathBuf,
}

impl ParticipantBuild {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Short name used to scope this participant's component identifiers.
    /// Falls back to the full path for roots with no final component.
    pub fn display_name(&self) -> String {
        self.root_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root_dir.display().to_string())
    }
}

// ---------------------------------------------------------------------------
// ProjectComponentId
// ---------------------------------------------------------------------------

/// Opaque, globally unique key for one discoverable project.
///
/// Formatted as `participant:path:segments`; a participant's root project is
/// just the participant name. Consumers must not parse the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectComponentId(String);

impl ProjectComponentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Identifier for a project at `rel_path` inside `participant_name`'s tree.
    /// An empty relative path identifies the participant's root project.
    pub fn for_project(participant_name: &str, rel_path: &Path) -> Self {
        let mut id = participant_name.to_string();
        for segment in rel_path.components() {
            id.push(':');
            id.push_str(&segment.as_os_str().to_string_lossy());
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistration
// ---------------------------------------------------------------------------

/// Minimal registration metadata stored per component in the composite
/// build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRegistration {
    /// Root path of the participant that owns the component.
    pub participant_root: PathBuf,
    /// Directory of the discovered project within the participant.
    pub project_dir: PathBuf,
    /// When the component was registered into the composite context.
    pub registered_at: DateTime<Utc>,
}

impl ComponentRegistration {
    pub fn new(participant_root: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            participant_root: participant_root.into(),
            project_dir: project_dir.into(),
            registered_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// BuildModel
// ---------------------------------------------------------------------------

/// A single project discovered inside a participant's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredProject {
    /// Globally unique identifier for the project.
    pub id: ProjectComponentId,
    /// Directory containing the project.
    pub dir: PathBuf,
    /// Human-readable project name.
    pub name: String,
}

/// The build model produced by configuring one participant's session:
/// the participant plus every project discoverable in its tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildModel {
    pub participant: ParticipantBuild,
    pub projects: Vec<DiscoveredProject>,
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for build session identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
