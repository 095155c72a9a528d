//! The standing evaluator: full-ledger replay into an evaluation snapshot.
//!
//! Folds every event through the transition function from the canonical
//! initial standing, tracks eras and scars on each state change, then
//! resolves today's obligations and selects exactly one required surface.

use chrono::{DateTime, Utc};
use iron_types::{
    Era, Event, EventClass, Obligation, ObligationCycle, ObligationKind, Scar, Standing,
    StandingState, Surface,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::history::HistoryTracker;
use crate::obligations::obligations_for;
use crate::transition::transition;

/// The contract id obligations derived purely from standing are booked
/// under. The genesis accord is implicit in every subject's induction.
pub const STANDING_CONTRACT_ID: &str = "genesis-accord";

/// The sealed result of one evaluation. All fields are owned copies —
/// callers never receive live references into kernel state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSnapshot {
    pub standing: Standing,
    pub obligations: Vec<Obligation>,
    pub eras: Vec<Era>,
    pub current_era: Option<Era>,
    pub scars: Vec<Scar>,
    pub fractures: u32,
    pub recoveries: u32,
    pub required_surface: Surface,
}

/// Day-scoped evidence flags for `now`'s calendar day, collected during
/// replay. These drive obligation stripping and surface selection.
#[derive(Debug, Default)]
struct DayFlags {
    rested: bool,
    declared: bool,
    evidence_submitted: bool,
    evidence_acknowledged: bool,
}

/// Replay the full ledger and derive the current institutional state.
///
/// Deterministic: identical `(events, now)` inputs always produce
/// structurally identical snapshots. The only time dependence is the
/// passed-in `now`.
pub fn evaluate(events: &[Event], now: DateTime<Utc>) -> EvaluationSnapshot {
    evaluate_with_contracts(events, &[], now)
}

/// Like [`evaluate`], but merges obligations imposed by active contracts
/// into the snapshot before surface selection. Contract obligations go
/// through the same discharge rules as standing-derived ones, and an
/// obligation already owed under the same contract is never doubled.
pub fn evaluate_with_contracts(
    events: &[Event],
    contract_obligations: &[Obligation],
    now: DateTime<Utc>,
) -> EvaluationSnapshot {
    let today = now.date_naive();
    let mut standing = Standing::initial(
        events.first().map(|e| e.timestamp).unwrap_or(now),
    );
    let mut tracker = HistoryTracker::new();
    let mut flags = DayFlags::default();

    for event in events {
        if event.timestamp.date_naive() == today {
            match event.class() {
                EventClass::Rest => flags.rested = true,
                EventClass::PracticeDeclared => flags.declared = true,
                EventClass::EvidenceSubmitted => flags.evidence_submitted = true,
                EventClass::EvidenceAcknowledged => flags.evidence_acknowledged = true,
                _ => {}
            }
        }

        let Some(delta) = transition(&standing, event) else {
            continue;
        };
        let from = standing.state;
        delta.apply_to(&mut standing);
        if standing.state != from {
            debug!(%from, to = %standing.state, kind = %event.kind, "Standing transition");
            tracker.observe(from, standing.state, event.timestamp);
        }
    }

    let practiced_today = standing.last_practice_date == Some(today);
    let mut obligations = pending_obligations(standing.state, practiced_today, &flags);
    merge_contract_obligations(&mut obligations, contract_obligations, practiced_today, &flags);
    let required_surface = select_surface(&standing, &obligations, &flags);

    let current_era = tracker.current_era().cloned();
    let (eras, scars, fractures, recoveries) = tracker.into_parts();

    EvaluationSnapshot {
        standing,
        obligations,
        eras,
        current_era,
        scars,
        fractures,
        recoveries,
        required_surface,
    }
}

/// Materialize today's pending obligations. Daily practice is stripped
/// when practice, rest, or evidence was already logged today.
fn pending_obligations(
    state: StandingState,
    practiced_today: bool,
    flags: &DayFlags,
) -> Vec<Obligation> {
    let practice_discharged = practiced_today || flags.rested || flags.evidence_submitted;

    obligations_for(state)
        .iter()
        .filter(|kind| {
            let practice_like = matches!(
                kind,
                ObligationKind::DailyPractice
                    | ObligationKind::ReducedPractice
                    | ObligationKind::ImmediateCorrection
            );
            !(practice_like && practice_discharged)
        })
        .map(|kind| {
            let cycle = match kind {
                ObligationKind::DailyPractice | ObligationKind::ReducedPractice => {
                    ObligationCycle::Daily
                }
                _ => ObligationCycle::Once,
            };
            Obligation::pending(*kind, cycle, STANDING_CONTRACT_ID)
        })
        .collect()
}

/// Merge contract-imposed obligations into the standing-derived list.
/// The same discharge rules apply, and (id, contract) pairs are unique.
fn merge_contract_obligations(
    obligations: &mut Vec<Obligation>,
    contract_obligations: &[Obligation],
    practiced_today: bool,
    flags: &DayFlags,
) {
    let practice_discharged = practiced_today || flags.rested || flags.evidence_submitted;

    for obligation in contract_obligations {
        let practice_like = obligation.required_event == "PRACTICE_COMPLETE";
        if practice_like && practice_discharged {
            continue;
        }
        let already_owed = obligations
            .iter()
            .any(|o| o.id == obligation.id && o.contract_id == obligation.contract_id);
        if !already_owed {
            obligations.push(obligation.clone());
        }
    }
}

/// Pick exactly one required surface. First match wins; the final arm
/// guarantees the "never nothing" postcondition.
fn select_surface(standing: &Standing, obligations: &[Obligation], flags: &DayFlags) -> Surface {
    if standing.state == StandingState::PreInduction {
        return Surface::Induction;
    }
    if standing.state == StandingState::Violated {
        return Surface::Consequence;
    }
    // A declared practice owes evidence even if a completion was also
    // logged today; only submission clears the declaration.
    if flags.declared && !flags.evidence_submitted {
        return Surface::EvidenceCapture;
    }
    if flags.evidence_submitted && !flags.evidence_acknowledged {
        return Surface::LedgerClosure;
    }
    if standing.state == StandingState::Recovery
        && obligations.iter().any(|o| o.id == "reduced_practice")
    {
        return Surface::RecoveryObligation;
    }
    if !obligations.is_empty() {
        return Surface::Obligation;
    }
    Surface::SystemState
}
