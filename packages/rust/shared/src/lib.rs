//! Shared types, error model, and configuration for interbuild.
//!
//! This crate is the foundation depended on by all other interbuild crates.
//! It provides:
//! - [`InterbuildError`] — the unified error type
//! - Domain types ([`ParticipantBuild`], [`LaunchParameters`], [`BuildModel`],
//!   [`ProjectComponentId`])
//! - Configuration ([`AppConfig`], [`DiscoveryConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, DiscoveryConfig, ParticipantEntry, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{InterbuildError, Result};
pub use types::{
    BuildModel, ComponentRegistration, DiscoveredProject, LaunchParameters, LogLevel,
    ParticipantBuild, ProjectComponentId, SessionId,
};
