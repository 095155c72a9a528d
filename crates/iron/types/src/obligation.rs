//! Obligations: actions required of the subject within a time window.

use serde::{Deserialize, Serialize};

/// The well-known obligation kinds the resolver hands out per standing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    /// Read the institutional briefing.
    Briefing,
    /// Complete the daily practice.
    DailyPractice,
    /// Correct a strained standing immediately.
    ImmediateCorrection,
    /// Acknowledge a fracture on the record.
    AcknowledgeFracture,
    /// Enter the recovery track.
    EnterRecovery,
    /// Reduced practice load while in recovery.
    ReducedPractice,
    /// State an intention for the recovery period.
    IntentionStatement,
}

impl ObligationKind {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Briefing => "briefing",
            Self::DailyPractice => "daily_practice",
            Self::ImmediateCorrection => "immediate_correction",
            Self::AcknowledgeFracture => "acknowledge_fracture",
            Self::EnterRecovery => "enter_recovery",
            Self::ReducedPractice => "reduced_practice",
            Self::IntentionStatement => "intention_statement",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Briefing => "Read the institutional briefing",
            Self::DailyPractice => "Complete today's practice",
            Self::ImmediateCorrection => "Correct course immediately",
            Self::AcknowledgeFracture => "Acknowledge the fracture on the record",
            Self::EnterRecovery => "Enter the recovery track",
            Self::ReducedPractice => "Complete the reduced recovery practice",
            Self::IntentionStatement => "State your intention for this recovery",
        }
    }

    /// The ledger event that discharges this obligation.
    pub fn required_event(&self) -> &'static str {
        match self {
            Self::Briefing => "BRIEFING_READ",
            Self::DailyPractice => "PRACTICE_COMPLETE",
            Self::ImmediateCorrection => "PRACTICE_COMPLETE",
            Self::AcknowledgeFracture => "FRACTURE_ACKNOWLEDGED",
            Self::EnterRecovery => "ENTER_RECOVERY",
            Self::ReducedPractice => "PRACTICE_COMPLETE",
            Self::IntentionStatement => "INTENTION_STATED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObligationCycle {
    Daily,
    Weekly,
    Once,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObligationStatus {
    Pending,
    Met,
    Expired,
}

/// A concrete obligation instance, owned by a contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub description: String,
    pub required_event: String,
    pub cycle: ObligationCycle,
    pub contract_id: String,
    pub status: ObligationStatus,
}

impl Obligation {
    pub fn pending(kind: ObligationKind, cycle: ObligationCycle, contract_id: &str) -> Self {
        Self {
            id: kind.id().to_string(),
            description: kind.description().to_string(),
            required_event: kind.required_event().to_string(),
            cycle,
            contract_id: contract_id.to_string(),
            status: ObligationStatus::Pending,
        }
    }
}
