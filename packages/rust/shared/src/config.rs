//! Application configuration for interbuild.
//!
//! User config lives at `~/.interbuild/interbuild.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InterbuildError, Result};
use crate::types::{LaunchParameters, LogLevel};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "interbuild.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".interbuild";

// ---------------------------------------------------------------------------
// Config structs (matching interbuild.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base launch parameter defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Project discovery settings for the manifest backend.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Registered participant build trees.
    #[serde(default)]
    pub participants: Vec<ParticipantEntry>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Base log verbosity for the composite session.
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Replace earlier registrations when two participants expose the
    /// same component identifier.
    #[serde(default)]
    pub overwrite_duplicates: bool,

    /// Forbid network access during participant launches.
    #[serde(default)]
    pub offline: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite_duplicates: false,
            offline: false,
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// `[discovery]` section — how the manifest backend finds projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// File names that mark a directory as a project root.
    #[serde(default = "default_manifest_names")]
    pub manifest_names: Vec<String>,

    /// Directory names skipped during the walk.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Maximum directory depth below the participant root.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Whether the walk follows symlinks.
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            manifest_names: default_manifest_names(),
            exclude_dirs: default_exclude_dirs(),
            max_depth: default_max_depth(),
            follow_symlinks: false,
        }
    }
}

fn default_manifest_names() -> Vec<String> {
    vec![
        "Cargo.toml".into(),
        "package.json".into(),
        "build.gradle".into(),
        "build.gradle.kts".into(),
    ]
}

fn default_exclude_dirs() -> Vec<String> {
    vec![
        ".git".into(),
        "target".into(),
        "node_modules".into(),
        "build".into(),
    ]
}

fn default_max_depth() -> usize {
    6
}

/// `[[participants]]` entry — one registered build tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantEntry {
    /// Human-readable name.
    pub name: String,
    /// Root path of the build tree on disk.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Launch parameters from config
// ---------------------------------------------------------------------------

impl From<&AppConfig> for LaunchParameters {
    /// Base launch parameters for the composite session itself. The project
    /// dir starts empty and is set by the caller (usually the working dir).
    fn from(config: &AppConfig) -> Self {
        Self {
            project_dir: PathBuf::new(),
            log_level: config.defaults.log_level,
            configure_on_demand: false,
            offline: config.defaults.offline,
            dry_run: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.interbuild/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| InterbuildError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.interbuild/interbuild.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| InterbuildError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        InterbuildError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| InterbuildError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| InterbuildError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| InterbuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("log_level"));
        assert!(toml_str.contains("Cargo.toml"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.log_level, LogLevel::Info);
        assert_eq!(parsed.discovery.max_depth, 6);
        assert!(!parsed.defaults.overwrite_duplicates);
    }

    #[test]
    fn config_with_participants() {
        let toml_str = r#"
[defaults]
log_level = "debug"

[[participants]]
name = "library-a"
path = "/work/library-a"

[[participants]]
name = "app"
path = "/work/app"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.participants.len(), 2);
        assert_eq!(config.participants[0].name, "library-a");
        assert_eq!(config.defaults.log_level, LogLevel::Debug);
    }

    #[test]
    fn launch_parameters_from_app_config() {
        let mut config = AppConfig::default();
        config.defaults.offline = true;
        let params = LaunchParameters::from(&config);
        assert_eq!(params.log_level, LogLevel::Info);
        assert!(params.offline);
        assert!(!params.configure_on_demand);
    }
}
