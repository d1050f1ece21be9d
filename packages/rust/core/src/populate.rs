//! Context population: registering a participant's build model into the
//! composite build context.

use tracing::debug;

use interbuild_registry::CompositeBuildContext;
use interbuild_shared::{BuildModel, ComponentRegistration, Result};

/// Per-participant population strategy — the declared extension point.
///
/// The default implementation registers every discoverable component;
/// alternative strategies (filtering, metadata enrichment) implement the
/// same contract.
pub trait ContextAction: Send + Sync {
    /// Enumerate `model`'s project components and insert them into
    /// `registry`. Duplicate handling follows the registry's
    /// construction-time overwrite policy.
    fn populate(&self, registry: &mut CompositeBuildContext, model: &BuildModel) -> Result<()>;
}

/// Registers every project discovered in the participant's model.
#[derive(Debug, Default)]
pub struct RegisterDiscoveredProjects;

impl ContextAction for RegisterDiscoveredProjects {
    fn populate(&self, registry: &mut CompositeBuildContext, model: &BuildModel) -> Result<()> {
        let participant_root = model.participant.root_dir();

        for project in &model.projects {
            let registration = ComponentRegistration::new(participant_root, &project.dir);
            registry.add(project.id.clone(), registration);
        }

        debug!(
            participant = %participant_root.display(),
            projects = model.projects.len(),
            "participant components registered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use interbuild_shared::{DiscoveredProject, ParticipantBuild, ProjectComponentId};

    fn model_with(participant: &str, names: &[&str]) -> BuildModel {
        BuildModel {
            participant: ParticipantBuild::new(format!("/work/{participant}")),
            projects: names
                .iter()
                .map(|name| DiscoveredProject {
                    id: ProjectComponentId::for_project(participant, Path::new(name)),
                    dir: format!("/work/{participant}/{name}").into(),
                    name: (*name).into(),
                })
                .collect(),
        }
    }

    #[test]
    fn registers_all_components() {
        let mut registry = CompositeBuildContext::new(false);
        let action = RegisterDiscoveredProjects;

        action
            .populate(&mut registry, &model_with("a", &["core", "net"]))
            .expect("populate");

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&ProjectComponentId::new("a:core")));
        assert!(registry.contains(&ProjectComponentId::new("a:net")));
    }

    #[test]
    fn duplicate_policy_is_the_registrys() {
        let action = RegisterDiscoveredProjects;

        let mut keep_first = CompositeBuildContext::new(false);
        action
            .populate(&mut keep_first, &model_with("a", &["core"]))
            .expect("populate");
        action
            .populate(&mut keep_first, &model_with("a", &["core"]))
            .expect("populate");
        assert_eq!(keep_first.len(), 1);

        let id = ProjectComponentId::new("a:core");
        let first_owner = keep_first.registration(&id).expect("registration").clone();
        assert_eq!(first_owner.participant_root, Path::new("/work/a"));
    }
}
