//! The standing transition function.
//!
//! Pure and deterministic: `(current standing, event) -> Option<delta>`.
//! `None` means the event has no effect in the current state — unknown or
//! irrelevant events are ignored, never an error.

use chrono::{DateTime, NaiveDate, Utc};
use iron_types::{Event, EventClass, Standing, StandingState};
use serde::{Deserialize, Serialize};

/// Consecutive practice days required to promote COMPLIANT → INSTITUTIONAL.
pub const INSTITUTIONAL_STREAK: u32 = 30;

/// Consecutive recovery practices required to reconstitute.
pub const RECONSTITUTION_STREAK: u32 = 3;

/// Entropy decay per completed recovery practice.
pub const RECOVERY_ENTROPY_DECAY: f64 = 20.0;

/// Entropy penalty applied by AUTHORITY_REALIGNED, in any state.
pub const REALIGNMENT_PENALTY: f64 = 20.0;

/// A partial update to a [`Standing`]. Only the fields the transition
/// touches are set; [`StandingDelta::apply_to`] merges into the current
/// standing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingDelta {
    pub state: Option<StandingState>,
    pub entropy: Option<f64>,
    pub streak: Option<u32>,
    pub last_practice_date: Option<NaiveDate>,
    pub since: Option<DateTime<Utc>>,
}

impl StandingDelta {
    pub fn apply_to(&self, standing: &mut Standing) {
        if let Some(state) = self.state {
            standing.state = state;
        }
        if let Some(entropy) = self.entropy {
            standing.entropy = entropy;
        }
        if let Some(streak) = self.streak {
            standing.streak = streak;
        }
        if let Some(date) = self.last_practice_date {
            standing.last_practice_date = Some(date);
        }
        if let Some(since) = self.since {
            standing.since = since;
        }
    }
}

/// Evaluate one event against the current standing.
///
/// Same-day idempotency: a second practice-complete on the calendar day
/// already recorded in `last_practice_date` refreshes only that date —
/// state and streak are untouched.
pub fn transition(current: &Standing, event: &Event) -> Option<StandingDelta> {
    let day = event.timestamp.date_naive();

    match (current.state, event.class()) {
        (StandingState::PreInduction, EventClass::Induction) => Some(StandingDelta {
            state: Some(StandingState::Inducted),
            entropy: Some(0.0),
            streak: Some(0),
            since: Some(event.timestamp),
            ..Default::default()
        }),

        (StandingState::Inducted, EventClass::PracticeComplete) => {
            if same_day(current, day) {
                return Some(refresh_practice_date(day));
            }
            Some(StandingDelta {
                state: Some(StandingState::Compliant),
                streak: Some(1),
                last_practice_date: Some(day),
                since: Some(event.timestamp),
                ..Default::default()
            })
        }

        // First-day failure is immediately terminal, no STRAINED grace.
        (StandingState::Inducted, EventClass::PracticeMissed) => Some(violated(event.timestamp)),

        (state, EventClass::PracticeComplete) if state.is_compliant_family() => {
            if same_day(current, day) {
                return Some(refresh_practice_date(day));
            }
            let streak = current.streak + 1;
            let promoted =
                state == StandingState::Compliant && streak >= INSTITUTIONAL_STREAK;
            Some(StandingDelta {
                state: promoted.then_some(StandingState::Institutional),
                streak: Some(streak),
                last_practice_date: Some(day),
                since: promoted.then_some(event.timestamp),
                ..Default::default()
            })
        }

        // Authorized rest absorbs risk without advancing the streak.
        (state, EventClass::Rest) if state.is_compliant_family() => Some(StandingDelta {
            entropy: Some(0.0),
            ..Default::default()
        }),

        // Soft failure: one grace step, streak preserved.
        (state, EventClass::PracticeMissed) if state.is_compliant_family() => {
            Some(StandingDelta {
                state: Some(StandingState::Strained),
                entropy: Some(50.0),
                since: Some(event.timestamp),
                ..Default::default()
            })
        }

        (StandingState::Strained, EventClass::PracticeComplete) => {
            if same_day(current, day) {
                return Some(refresh_practice_date(day));
            }
            Some(StandingDelta {
                state: Some(StandingState::Compliant),
                entropy: Some(0.0),
                streak: Some(current.streak + 1),
                last_practice_date: Some(day),
                since: Some(event.timestamp),
                ..Default::default()
            })
        }

        // Second consecutive failure is terminal.
        (StandingState::Strained, EventClass::PracticeMissed) => Some(violated(event.timestamp)),

        (StandingState::Violated, EventClass::EnterRecovery) => Some(StandingDelta {
            state: Some(StandingState::Recovery),
            entropy: Some(50.0),
            since: Some(event.timestamp),
            ..Default::default()
        }),

        (StandingState::Recovery, EventClass::PracticeComplete) => {
            if same_day(current, day) {
                return Some(refresh_practice_date(day));
            }
            let streak = current.streak + 1;
            let reconstituted = streak >= RECONSTITUTION_STREAK;
            Some(StandingDelta {
                state: reconstituted.then_some(StandingState::Reconstituted),
                entropy: Some((current.entropy - RECOVERY_ENTROPY_DECAY).max(0.0)),
                streak: Some(streak),
                last_practice_date: Some(day),
                since: reconstituted.then_some(event.timestamp),
                ..Default::default()
            })
        }

        (StandingState::Recovery, EventClass::PracticeMissed) => Some(violated(event.timestamp)),

        (StandingState::BreachRisk, EventClass::PracticeComplete) => {
            if same_day(current, day) {
                return Some(refresh_practice_date(day));
            }
            Some(StandingDelta {
                state: Some(StandingState::Strained),
                entropy: Some(50.0),
                last_practice_date: Some(day),
                since: Some(event.timestamp),
                ..Default::default()
            })
        }

        (StandingState::BreachRisk, EventClass::PracticeMissed) => Some(violated(event.timestamp)),

        // Global penalty event, applies in every state.
        (_, EventClass::AuthorityRealigned) => Some(StandingDelta {
            entropy: Some((current.entropy + REALIGNMENT_PENALTY).min(100.0)),
            ..Default::default()
        }),

        _ => None,
    }
}

fn same_day(current: &Standing, day: NaiveDate) -> bool {
    current.last_practice_date == Some(day)
}

fn refresh_practice_date(day: NaiveDate) -> StandingDelta {
    StandingDelta {
        last_practice_date: Some(day),
        ..Default::default()
    }
}

fn violated(at: DateTime<Utc>) -> StandingDelta {
    StandingDelta {
        state: Some(StandingState::Violated),
        entropy: Some(100.0),
        streak: Some(0),
        since: Some(at),
        ..Default::default()
    }
}
