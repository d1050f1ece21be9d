//! Backend trait and built-in backends for build session launching.
//!
//! A backend knows how to acquire a build session for one participant and
//! configure its build model. One implementation exists per backend; callers
//! only ever see the [`BuildBackend`] / [`BuildSession`] traits, never a
//! concrete session type.

pub mod manifest;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use interbuild_shared::{BuildModel, LaunchParameters, Result, SessionId};

use crate::{BuildRequestContext, SessionServices};

/// Factory for participant build sessions.
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Acquire a new session for the build rooted at
    /// `parameters.project_dir`, scoped under `services` and forwarding
    /// output to `request`'s listeners.
    ///
    /// Acquisition is cheap; the heavy configuration work happens in
    /// [`BuildSession::build_model`], inside the session's scope, so that
    /// a model failure still releases the session.
    async fn new_session(
        &self,
        parameters: &LaunchParameters,
        request: &BuildRequestContext,
        services: Arc<SessionServices>,
    ) -> Result<Box<dyn BuildSession>>;
}

/// One acquired build session.
///
/// Sessions hold per-launch state (the build model, caches) and must be
/// stopped exactly once; [`crate::with_participant`] enforces this.
#[async_trait]
pub trait BuildSession: Send {
    /// Identifier of this session, for tracing.
    fn session_id(&self) -> SessionId;

    /// Configure the participant and return its build model.
    ///
    /// Idempotent: the model is built on first call and cached for the
    /// session's lifetime.
    async fn build_model(&mut self) -> Result<&BuildModel>;

    /// Release the session and everything scoped to it.
    async fn stop(&mut self) -> Result<()>;
}
