//! Per-participant launch parameter derivation.

use interbuild_shared::{LaunchParameters, LogLevel, ParticipantBuild};

/// Derive the launch parameters for one participant from the composite
/// session's base parameters.
///
/// The result equals `base` in every field except:
/// - `project_dir` is the participant's root;
/// - `configure_on_demand` is forced off — composite coordination needs
///   every project configured, deterministically, per participant;
/// - `log_level` drops to `Quiet` iff the base sits at the `Info`
///   baseline, so participant configuration noise stays out of the
///   composite log while an explicitly chosen level is respected.
///
/// Pure: `base` is never mutated.
pub fn derive_participant_parameters(
    base: &LaunchParameters,
    participant: &ParticipantBuild,
) -> LaunchParameters {
    let mut parameters = base.clone();
    parameters.project_dir = participant.root_dir().to_path_buf();
    parameters.configure_on_demand = false;
    if base.log_level == LogLevel::Info {
        parameters.log_level = LogLevel::Quiet;
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_at(level: LogLevel) -> LaunchParameters {
        let mut base = LaunchParameters::new("/work/composite");
        base.log_level = level;
        base
    }

    #[test]
    fn project_dir_points_at_participant() {
        let participant = ParticipantBuild::new("/work/library-a");
        let derived = derive_participant_parameters(&base_at(LogLevel::Debug), &participant);
        assert_eq!(derived.project_dir, participant.root_dir());
    }

    #[test]
    fn configure_on_demand_is_always_forced_off() {
        let participant = ParticipantBuild::new("/work/library-a");
        let mut base = base_at(LogLevel::Debug);
        base.configure_on_demand = true;

        let derived = derive_participant_parameters(&base, &participant);
        assert!(!derived.configure_on_demand);
        // The base itself is untouched.
        assert!(base.configure_on_demand);
    }

    #[test]
    fn info_baseline_downgrades_to_quiet() {
        let participant = ParticipantBuild::new("/work/library-a");
        let derived = derive_participant_parameters(&base_at(LogLevel::Info), &participant);
        assert_eq!(derived.log_level, LogLevel::Quiet);
    }

    #[test]
    fn explicit_levels_are_respected() {
        let participant = ParticipantBuild::new("/work/library-a");
        for level in [LogLevel::Quiet, LogLevel::Warn, LogLevel::Debug] {
            let derived = derive_participant_parameters(&base_at(level), &participant);
            assert_eq!(derived.log_level, level);
        }
    }

    #[test]
    fn all_other_fields_match_base() {
        let participant = ParticipantBuild::new("/work/library-a");
        let mut base = base_at(LogLevel::Warn);
        base.offline = true;
        base.dry_run = true;

        let derived = derive_participant_parameters(&base, &participant);
        assert!(derived.offline);
        assert!(derived.dry_run);
        assert_eq!(derived.log_level, base.log_level);
    }
}
