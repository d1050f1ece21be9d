//! Composite context orchestration for interbuild.
//!
//! This crate drives per-participant build execution and aggregates each
//! participant's discovered project components into the shared composite
//! build context: parameter derivation ([`params`]), the population action
//! ([`populate`]), and the sequencing orchestrator ([`builder`]).

pub mod builder;
pub mod params;
pub mod populate;

pub use builder::{
    CollectingSink, CompositeContextBuilder, DiagnosticSink, SilentSink, TracingSink,
    print_context,
};
pub use params::derive_participant_parameters;
pub use populate::{ContextAction, RegisterDiscoveredProjects};
