//! Build session launching for composite builds.
//!
//! This crate owns the launch/execute/stop contract consumed by the
//! orchestrator: the [`BuildBackend`] / [`BuildSession`] traits, the
//! request-scoped [`BuildRequestContext`] with its output listeners and
//! cancellation token, the session-parent [`SessionServices`], and the
//! scoped launch helper [`with_participant`] that guarantees every acquired
//! session is stopped exactly once on every exit path.

pub mod backends;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use interbuild_shared::{BuildModel, LaunchParameters, Result};

pub use backends::{BuildBackend, BuildSession};
pub use backends::manifest::ManifestBackend;
pub use backends::memory::MemoryBackend;

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Sink for a session's forwarded output or error lines.
pub trait OutputListener: Send + Sync {
    fn on_line(&self, line: &str);
}

/// Listener that discards everything.
pub struct NullListener;

impl OutputListener for NullListener {
    fn on_line(&self, _line: &str) {}
}

/// Listener that buffers lines in memory, for tests and embedding hosts
/// that post-process participant output.
#[derive(Default)]
pub struct CollectingListener {
    lines: Mutex<Vec<String>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("listener lock poisoned").clone()
    }
}

impl OutputListener for CollectingListener {
    fn on_line(&self, line: &str) {
        self.lines
            .lock()
            .expect("listener lock poisoned")
            .push(line.to_string());
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag carried by the request context.
///
/// Cancellation takes effect only between participants: an in-flight
/// launch always runs to completion (and release) first.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// Request-scoped metadata shared unchanged by every participant launch:
/// the composite session's output sinks and the cancellation token.
///
/// Not owned by any participant; it outlives each of them and spans the
/// whole composite build.
#[derive(Clone)]
pub struct BuildRequestContext {
    pub output: Arc<dyn OutputListener>,
    pub error: Arc<dyn OutputListener>,
    pub cancellation: CancellationToken,
}

impl BuildRequestContext {
    pub fn new(output: Arc<dyn OutputListener>, error: Arc<dyn OutputListener>) -> Self {
        Self {
            output,
            error,
            cancellation: CancellationToken::new(),
        }
    }

    /// A context that swallows all forwarded output.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullListener), Arc::new(NullListener))
    }
}

// ---------------------------------------------------------------------------
// Session-parent services
// ---------------------------------------------------------------------------

/// Services scoped to the composite session and shared by every
/// participant launch parented to it.
///
/// Currently this is the manifest name cache: participants frequently
/// share dependency trees, and re-parsing the same manifest per launch is
/// wasted work.
#[derive(Default)]
pub struct SessionServices {
    manifest_names: Mutex<HashMap<PathBuf, String>>,
}

impl SessionServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached project name for `manifest`, computing and caching
    /// it via `load` on a miss.
    pub fn project_name(
        &self,
        manifest: &PathBuf,
        load: impl FnOnce() -> String,
    ) -> String {
        let mut cache = self.manifest_names.lock().expect("cache lock poisoned");
        cache.entry(manifest.clone()).or_insert_with(load).clone()
    }
}

// ---------------------------------------------------------------------------
// Scoped launch
// ---------------------------------------------------------------------------

/// Acquire a session for one participant, configure its build model, run
/// `action` against it, and stop the session on every exit path.
///
/// Error precedence: a failure from acquisition, model building, or
/// `action` is primary. A `stop()` failure while cleaning up after a
/// primary failure is logged and never masks it; a `stop()` failure after
/// a successful action is the reported failure.
pub async fn with_participant<T, F>(
    backend: &dyn BuildBackend,
    parameters: &LaunchParameters,
    request: &BuildRequestContext,
    services: Arc<SessionServices>,
    action: F,
) -> Result<T>
where
    F: FnOnce(&BuildModel) -> Result<T>,
{
    let mut session = backend.new_session(parameters, request, services).await?;

    let outcome = match session.build_model().await {
        Ok(model) => action(model),
        Err(e) => Err(e),
    };
    let released = session.stop().await;

    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release)) => Err(release),
        (Err(primary), Ok(())) => Err(primary),
        (Err(primary), Err(release)) => {
            warn!(error = %release, "session release failed while handling a launch failure");
            Err(primary)
        }
    }
}
