//! Per-state obligation lookup. Pure, no side effects.

use iron_types::{ObligationKind, StandingState};

/// What the subject owes "today" given a standing state.
pub fn obligations_for(state: StandingState) -> &'static [ObligationKind] {
    use ObligationKind::*;
    match state {
        StandingState::PreInduction | StandingState::Inducted => &[Briefing, DailyPractice],
        StandingState::Compliant
        | StandingState::Reconstituted
        | StandingState::Institutional => &[DailyPractice],
        StandingState::Strained | StandingState::BreachRisk => &[ImmediateCorrection],
        StandingState::Violated => &[AcknowledgeFracture, EnterRecovery],
        StandingState::Recovery => &[ReducedPractice, IntentionStatement],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_has_at_least_one_obligation() {
        for state in StandingState::ALL {
            assert!(!obligations_for(state).is_empty(), "{state} must owe something");
        }
    }

    #[test]
    fn violated_owes_acknowledgment_and_recovery() {
        let kinds = obligations_for(StandingState::Violated);
        assert!(kinds.contains(&ObligationKind::AcknowledgeFracture));
        assert!(kinds.contains(&ObligationKind::EnterRecovery));
    }

    #[test]
    fn compliant_family_owes_only_practice() {
        for state in [
            StandingState::Compliant,
            StandingState::Reconstituted,
            StandingState::Institutional,
        ] {
            assert_eq!(obligations_for(state), &[ObligationKind::DailyPractice]);
        }
    }
}
