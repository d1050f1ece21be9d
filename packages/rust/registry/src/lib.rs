//! The composite build context: the shared registry of project components
//! discovered across all participants of a composite session.
//!
//! The registry is created once per composite session, populated
//! incrementally while participants are configured, and treated as
//! read-only afterwards. It is append-oriented: entries are never removed,
//! and there is deliberately no removal operation.

use std::collections::HashMap;

use serde::Serialize;

use interbuild_shared::{ComponentRegistration, ProjectComponentId};

/// Shared store of discovered project components, keyed by their globally
/// unique identifiers.
///
/// Iteration follows insertion order; a component that is overwritten keeps
/// its original position. Writes are unsynchronized — population is
/// strictly sequential — but once the building phase ends the registry is
/// safe to share immutably across consumers.
#[derive(Debug)]
pub struct CompositeBuildContext {
    entries: HashMap<ProjectComponentId, ComponentRegistration>,
    order: Vec<ProjectComponentId>,
    overwrite: bool,
}

impl CompositeBuildContext {
    /// Create an empty registry.
    ///
    /// `overwrite` fixes the duplicate policy for the registry's lifetime:
    /// `true` means a re-added identifier replaces the stored registration,
    /// `false` means re-adding is idempotent and keeps the first one.
    pub fn new(overwrite: bool) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            overwrite,
        }
    }

    /// Register a component. Returns `true` if the registration was stored
    /// (first insertion, or replacement under the overwrite policy).
    pub fn add(&mut self, id: ProjectComponentId, registration: ComponentRegistration) -> bool {
        match self.entries.entry(id.clone()) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                tracing::debug!(component = %id, "registering component");
                slot.insert(registration);
                self.order.push(id);
                true
            }
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                if self.overwrite {
                    tracing::debug!(component = %id, "replacing registration");
                    slot.insert(registration);
                    true
                } else {
                    tracing::debug!(component = %id, "component already registered, keeping first");
                    false
                }
            }
        }
    }

    /// Whether `id` has been registered.
    pub fn contains(&self, id: &ProjectComponentId) -> bool {
        self.entries.contains_key(id)
    }

    /// All registered identifiers, in insertion order.
    ///
    /// Returns an owned snapshot: re-querying after further additions yields
    /// a consistent view as of each call.
    pub fn get_all_projects(&self) -> Vec<ProjectComponentId> {
        self.order.clone()
    }

    /// The stored registration for `id`, if any.
    pub fn registration(&self, id: &ProjectComponentId) -> Option<&ComponentRegistration> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Serializable view of the registry, in insertion order.
    pub fn snapshot(&self) -> Vec<RegistryEntry<'_>> {
        self.order
            .iter()
            .map(|id| RegistryEntry {
                id,
                registration: &self.entries[id],
            })
            .collect()
    }
}

/// One row of [`CompositeBuildContext::snapshot`].
#[derive(Debug, Serialize)]
pub struct RegistryEntry<'a> {
    pub id: &'a ProjectComponentId,
    #[serde(flatten)]
    pub registration: &'a ComponentRegistration,
}
