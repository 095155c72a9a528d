//! Standing: the subject's state-machine position plus derived metrics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The nine standing states, ordered conceptually from fragile to
/// established. Exactly one is active per subject at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandingState {
    PreInduction,
    Inducted,
    Compliant,
    Strained,
    BreachRisk,
    Violated,
    Recovery,
    Reconstituted,
    Institutional,
}

impl StandingState {
    /// States in which daily practice advances the streak.
    pub fn is_compliant_family(&self) -> bool {
        matches!(
            self,
            Self::Compliant | Self::Reconstituted | Self::Institutional
        )
    }

    pub const ALL: [StandingState; 9] = [
        Self::PreInduction,
        Self::Inducted,
        Self::Compliant,
        Self::Strained,
        Self::BreachRisk,
        Self::Violated,
        Self::Recovery,
        Self::Reconstituted,
        Self::Institutional,
    ];
}

impl std::fmt::Display for StandingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PreInduction => "PRE_INDUCTION",
            Self::Inducted => "INDUCTED",
            Self::Compliant => "COMPLIANT",
            Self::Strained => "STRAINED",
            Self::BreachRisk => "BREACH_RISK",
            Self::Violated => "VIOLATED",
            Self::Recovery => "RECOVERY",
            Self::Reconstituted => "RECONSTITUTED",
            Self::Institutional => "INSTITUTIONAL",
        };
        f.write_str(name)
    }
}

/// The subject's current standing. Mutated only by the transition function,
/// one event at a time; never set directly by a caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub state: StandingState,
    /// Disorder metric in [0, 100]. Displayed integrity is `100 - entropy`.
    pub entropy: f64,
    /// Consecutive valid-practice days. Resets to 0 on violation.
    pub streak: u32,
    /// When the current state was entered.
    pub since: DateTime<Utc>,
    /// Calendar day of the most recent accepted practice.
    pub last_practice_date: Option<NaiveDate>,
}

impl Standing {
    /// The canonical initial standing every replay starts from.
    pub fn initial(since: DateTime<Utc>) -> Self {
        Self {
            state: StandingState::PreInduction,
            entropy: 0.0,
            streak: 0,
            since,
            last_practice_date: None,
        }
    }

    pub fn integrity(&self) -> f64 {
        100.0 - self.entropy
    }
}
