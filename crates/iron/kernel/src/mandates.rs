//! Mandate generation: the UI-facing instructions sealed at the end of a
//! cycle.
//!
//! Must run last: directives depend on the resolved authority and the
//! selected surface.

use chrono::{DateTime, Utc};
use iron_standing::EvaluationSnapshot;
use iron_types::{Mandate, MandateId, Surface};

use crate::authority::AuthorityGrant;

/// Generate the mandate list for one cycle: one directive for the required
/// surface, one per pending obligation, and a recovery directive when the
/// subject holds that authority.
pub fn generate_mandates(
    snapshot: &EvaluationSnapshot,
    authority: &AuthorityGrant,
    now: DateTime<Utc>,
) -> Vec<Mandate> {
    let mut mandates = Vec::new();

    mandates.push(Mandate {
        mandate_id: MandateId::generate(),
        directive: surface_directive(snapshot.required_surface).to_string(),
        surface: snapshot.required_surface,
        issued_at: now,
    });

    for obligation in &snapshot.obligations {
        mandates.push(Mandate {
            mandate_id: MandateId::generate(),
            directive: obligation.description.clone(),
            surface: snapshot.required_surface,
            issued_at: now,
        });
    }

    if authority.may_enter_recovery {
        mandates.push(Mandate {
            mandate_id: MandateId::generate(),
            directive: "Recovery is open to you; accept it to begin reconstitution".to_string(),
            surface: Surface::Consequence,
            issued_at: now,
        });
    }

    mandates
}

fn surface_directive(surface: Surface) -> &'static str {
    match surface {
        Surface::Induction => "Submit your genesis verdict to be inducted",
        Surface::Consequence => "Your standing is violated; face the record",
        Surface::EvidenceCapture => "Practice was declared; submit your evidence",
        Surface::LedgerClosure => "Evidence awaits acknowledgment; close the ledger",
        Surface::RecoveryObligation => "Complete today's reduced recovery practice",
        Surface::Obligation => "An obligation is pending; discharge it",
        Surface::SystemState => "All obligations discharged; standing holds",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use iron_standing::evaluate;
    use iron_types::Event;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn no_authority() -> AuthorityGrant {
        AuthorityGrant {
            may_declare_practice: false,
            may_submit_evidence: false,
            may_enter_recovery: false,
            may_amend_contracts: false,
            withheld_reasons: vec![],
        }
    }

    #[test]
    fn at_least_one_mandate_is_always_issued() {
        let snapshot = evaluate(&[], at(1, 12));
        let mandates = generate_mandates(&snapshot, &no_authority(), at(1, 12));
        assert!(!mandates.is_empty());
        assert_eq!(mandates[0].surface, Surface::Induction);
    }

    #[test]
    fn pending_obligations_each_get_a_mandate() {
        let ledger = vec![
            Event::new("CONTRACT_CREATED", at(1, 9), "s"),
            Event::new("PRACTICE_COMPLETE", at(1, 9), "s"),
        ];
        // Next day: daily practice owed again.
        let snapshot = evaluate(&ledger, at(2, 12));
        let mandates = generate_mandates(&snapshot, &no_authority(), at(2, 12));
        // Surface directive + one obligation mandate.
        assert_eq!(mandates.len(), 2);
    }

    #[test]
    fn recovery_authority_adds_a_recovery_mandate() {
        let ledger = vec![
            Event::new("CONTRACT_CREATED", at(1, 9), "s"),
            Event::new("PRACTICE_MISSED", at(1, 21), "s"),
        ];
        let snapshot = evaluate(&ledger, at(2, 12));
        let mut authority = no_authority();
        authority.may_enter_recovery = true;
        let mandates = generate_mandates(&snapshot, &authority, at(2, 12));
        assert!(mandates
            .iter()
            .any(|m| m.directive.contains("Recovery is open")));
    }
}
