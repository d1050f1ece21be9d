//! The composite context builder: sequences per-participant launches and
//! aggregates their discoveries into the shared composite build context.

use std::io::Write;
use std::sync::Arc;

use tracing::{info, instrument};

use interbuild_launcher::{
    BuildBackend, BuildRequestContext, SessionServices, with_participant,
};
use interbuild_registry::CompositeBuildContext;
use interbuild_shared::{
    InterbuildError, LaunchParameters, LogLevel, ParticipantBuild, Result,
};

use crate::params::derive_participant_parameters;
use crate::populate::{ContextAction, RegisterDiscoveredProjects};

// ---------------------------------------------------------------------------
// Diagnostic sink
// ---------------------------------------------------------------------------

/// Sink for the orchestrator's human-facing diagnostic lines.
///
/// Injected explicitly so the core carries no ambient logger state; hosts
/// route the lines wherever their surface wants them.
pub trait DiagnosticSink: Send + Sync {
    fn line(&self, message: &str);
}

/// Routes diagnostic lines into `tracing` at info level.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn line(&self, message: &str) {
        info!("{message}");
    }
}

/// Discards diagnostic lines.
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn line(&self, _message: &str) {}
}

/// Buffers diagnostic lines in memory, for tests.
#[derive(Default)]
pub struct CollectingSink {
    lines: std::sync::Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink lock poisoned").clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn line(&self, message: &str) {
        self.lines
            .lock()
            .expect("sink lock poisoned")
            .push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Builds the composite context by configuring every participant, in input
/// order, against the shared registry.
///
/// Owns the session-parent services for the composite session; the registry
/// is supplied by the enclosing session and passed in explicitly.
pub struct CompositeContextBuilder<'a> {
    backend: &'a dyn BuildBackend,
    participants: Vec<ParticipantBuild>,
    services: Arc<SessionServices>,
    diagnostics: Arc<dyn DiagnosticSink>,
    action: Box<dyn ContextAction>,
}

impl<'a> CompositeContextBuilder<'a> {
    pub fn new(backend: &'a dyn BuildBackend, participants: Vec<ParticipantBuild>) -> Self {
        Self {
            backend,
            participants,
            services: Arc::new(SessionServices::new()),
            diagnostics: Arc::new(TracingSink),
            action: Box::new(RegisterDiscoveredProjects),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Replace the population strategy.
    pub fn with_action(mut self, action: Box<dyn ContextAction>) -> Self {
        self.action = action;
        self
    }

    /// Configure every participant and register its components into
    /// `registry`.
    ///
    /// Strictly sequential, in input order. Fail-fast: the first failure
    /// aborts the remaining participants and propagates; registrations
    /// from participants already processed are retained. Every session
    /// that was acquired is stopped exactly once before this returns or
    /// the loop advances. Cancellation via `request` takes effect only
    /// between participants.
    #[instrument(skip_all, fields(participants = self.participants.len()))]
    pub async fn build_composite_context(
        &self,
        base: &LaunchParameters,
        request: &BuildRequestContext,
        registry: &mut CompositeBuildContext,
    ) -> Result<()> {
        let downgraded = base.log_level == LogLevel::Info;

        for participant in &self.participants {
            if request.cancellation.is_cancelled() {
                info!(
                    participant = %participant.root_dir().display(),
                    "cancellation requested, aborting before next participant"
                );
                return Err(InterbuildError::Cancelled);
            }

            let parameters = derive_participant_parameters(base, participant);
            if downgraded {
                self.diagnostics.line(&format!(
                    "[composite-build] Configuring participant: {}",
                    participant.root_dir().display()
                ));
            }

            with_participant(
                self.backend,
                &parameters,
                request,
                Arc::clone(&self.services),
                |model| self.action.populate(registry, model),
            )
            .await?;
        }

        info!(components = registry.len(), "composite context built");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Write one `Found participant: <id>` line per registry entry, in the
/// registry's iteration order.
///
/// Pure read: repeated calls observe identical sequences.
pub fn print_context(registry: &CompositeBuildContext, out: &mut dyn Write) -> Result<()> {
    for id in registry.get_all_projects() {
        writeln!(out, "Found participant: {id}")
            .map_err(|e| InterbuildError::Output(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use interbuild_launcher::{CollectingListener, MemoryBackend};
    use interbuild_shared::{DiscoveredProject, ProjectComponentId};

    fn project(participant: &str, name: &str) -> DiscoveredProject {
        DiscoveredProject {
            id: ProjectComponentId::for_project(participant, Path::new(name)),
            dir: format!("/{participant}/{name}").into(),
            name: name.into(),
        }
    }

    fn participants() -> Vec<ParticipantBuild> {
        vec![
            ParticipantBuild::new("/p1"),
            ParticipantBuild::new("/p2"),
        ]
    }

    fn two_participant_backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_build("/p1", vec![project("p1", "id1")])
            .with_build("/p2", vec![project("p2", "id2")])
    }

    fn base_at(level: LogLevel) -> LaunchParameters {
        let mut base = LaunchParameters::new("/composite");
        base.log_level = level;
        base
    }

    #[tokio::test]
    async fn two_participants_build_the_full_context() {
        let backend = two_participant_backend();
        let sink = Arc::new(CollectingSink::new());
        let output = Arc::new(CollectingListener::new());
        let request = BuildRequestContext::new(
            output.clone(),
            Arc::new(interbuild_launcher::NullListener),
        );
        let builder = CompositeContextBuilder::new(&backend, participants())
            .with_diagnostics(sink.clone());
        let mut registry = CompositeBuildContext::new(false);

        builder
            .build_composite_context(&base_at(LogLevel::Info), &request, &mut registry)
            .await
            .expect("build");

        // One diagnostic line per downgraded participant, in order.
        assert_eq!(
            sink.lines(),
            vec![
                "[composite-build] Configuring participant: /p1",
                "[composite-build] Configuring participant: /p2",
            ]
        );

        // Launches ran quiet, so no per-project output was forwarded.
        assert!(output.lines().is_empty());

        // Registry holds the union, in participant order.
        let ids: Vec<String> = registry
            .get_all_projects()
            .iter()
            .map(|i| i.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["p1:id1", "p2:id2"]);

        // Both sessions were released exactly once.
        assert_eq!(backend.stop_count("/p1"), 1);
        assert_eq!(backend.stop_count("/p2"), 1);
    }

    #[tokio::test]
    async fn explicit_verbosity_emits_no_diagnostics() {
        let backend = two_participant_backend();
        let sink = Arc::new(CollectingSink::new());
        let builder = CompositeContextBuilder::new(&backend, participants())
            .with_diagnostics(sink.clone());
        let mut registry = CompositeBuildContext::new(false);

        builder
            .build_composite_context(
                &base_at(LogLevel::Debug),
                &BuildRequestContext::silent(),
                &mut registry,
            )
            .await
            .expect("build");

        assert!(sink.lines().is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn first_participant_launch_failure_aborts_the_rest() {
        let backend = MemoryBackend::new()
            .failing_model("/p1", "settings evaluation failed")
            .with_build("/p2", vec![project("p2", "id2")]);
        let builder = CompositeContextBuilder::new(&backend, participants());
        let mut registry = CompositeBuildContext::new(false);

        let result = builder
            .build_composite_context(
                &base_at(LogLevel::Info),
                &BuildRequestContext::silent(),
                &mut registry,
            )
            .await;

        assert!(matches!(result, Err(InterbuildError::Launch { .. })));
        // p1 failed before populating anything; p2 was never launched.
        assert!(registry.is_empty());
        assert_eq!(backend.stop_count("/p1"), 1);
        assert_eq!(backend.stop_count("/p2"), 0);
    }

    #[tokio::test]
    async fn failure_at_second_participant_retains_first_registrations() {
        let backend = MemoryBackend::new()
            .with_build("/p1", vec![project("p1", "id1")])
            .failing_model("/p2", "broken build");
        let builder = CompositeContextBuilder::new(&backend, participants());
        let mut registry = CompositeBuildContext::new(false);

        let result = builder
            .build_composite_context(
                &base_at(LogLevel::Warn),
                &BuildRequestContext::silent(),
                &mut registry,
            )
            .await;

        assert!(result.is_err());
        let ids: Vec<String> = registry
            .get_all_projects()
            .iter()
            .map(|i| i.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["p1:id1"]);
        assert_eq!(backend.stop_count("/p2"), 1);
    }

    #[tokio::test]
    async fn populate_failure_still_stops_the_session() {
        struct FailFor(&'static str);

        impl ContextAction for FailFor {
            fn populate(
                &self,
                registry: &mut CompositeBuildContext,
                model: &interbuild_shared::BuildModel,
            ) -> Result<()> {
                if model.participant.root_dir() == Path::new(self.0) {
                    return Err(InterbuildError::Registry("insertion refused".into()));
                }
                RegisterDiscoveredProjects.populate(registry, model)
            }
        }

        let backend = two_participant_backend();
        let builder = CompositeContextBuilder::new(&backend, participants())
            .with_action(Box::new(FailFor("/p2")));
        let mut registry = CompositeBuildContext::new(false);

        let result = builder
            .build_composite_context(
                &base_at(LogLevel::Warn),
                &BuildRequestContext::silent(),
                &mut registry,
            )
            .await;

        assert!(matches!(result, Err(InterbuildError::Registry(_))));
        assert_eq!(registry.len(), 1);
        assert_eq!(backend.stop_count("/p2"), 1);
    }

    #[tokio::test]
    async fn cancellation_takes_effect_between_participants() {
        struct CancelAfterFirst {
            request: BuildRequestContext,
        }

        impl ContextAction for CancelAfterFirst {
            fn populate(
                &self,
                registry: &mut CompositeBuildContext,
                model: &interbuild_shared::BuildModel,
            ) -> Result<()> {
                self.request.cancellation.cancel();
                RegisterDiscoveredProjects.populate(registry, model)
            }
        }

        let backend = two_participant_backend();
        let request = BuildRequestContext::silent();
        let builder = CompositeContextBuilder::new(&backend, participants()).with_action(
            Box::new(CancelAfterFirst {
                request: request.clone(),
            }),
        );
        let mut registry = CompositeBuildContext::new(false);

        let result = builder
            .build_composite_context(&base_at(LogLevel::Warn), &request, &mut registry)
            .await;

        assert!(matches!(result, Err(InterbuildError::Cancelled)));
        // The in-flight participant completed and was released; the next
        // one never launched.
        assert_eq!(registry.len(), 1);
        assert_eq!(backend.stop_count("/p1"), 1);
        assert_eq!(backend.stop_count("/p2"), 0);
    }

    #[tokio::test]
    async fn duplicate_components_follow_registry_policy() {
        let backend = MemoryBackend::new()
            .with_build("/p1", vec![project("shared", "core")])
            .with_build("/p2", vec![project("shared", "core")]);

        let builder = CompositeContextBuilder::new(&backend, participants());
        let mut keep_first = CompositeBuildContext::new(false);
        builder
            .build_composite_context(
                &base_at(LogLevel::Warn),
                &BuildRequestContext::silent(),
                &mut keep_first,
            )
            .await
            .expect("build");

        let id = ProjectComponentId::new("shared:core");
        assert_eq!(keep_first.len(), 1);
        assert_eq!(
            keep_first.registration(&id).expect("registration").participant_root,
            Path::new("/p1")
        );

        let builder = CompositeContextBuilder::new(&backend, participants());
        let mut overwriting = CompositeBuildContext::new(true);
        builder
            .build_composite_context(
                &base_at(LogLevel::Warn),
                &BuildRequestContext::silent(),
                &mut overwriting,
            )
            .await
            .expect("build");

        assert_eq!(
            overwriting.registration(&id).expect("registration").participant_root,
            Path::new("/p2")
        );
    }

    #[tokio::test]
    async fn print_context_lists_entries_in_order_and_is_idempotent() {
        let backend = two_participant_backend();
        let builder = CompositeContextBuilder::new(&backend, participants());
        let mut registry = CompositeBuildContext::new(false);

        builder
            .build_composite_context(
                &base_at(LogLevel::Warn),
                &BuildRequestContext::silent(),
                &mut registry,
            )
            .await
            .expect("build");

        let mut first = Vec::new();
        print_context(&registry, &mut first).expect("print");
        let mut second = Vec::new();
        print_context(&registry, &mut second).expect("print");

        let text = String::from_utf8(first).expect("utf8");
        assert_eq!(
            text,
            "Found participant: p1:id1\nFound participant: p2:id2\n"
        );
        assert_eq!(text, String::from_utf8(second).expect("utf8"));
        assert_eq!(registry.len(), 2);
    }
}
