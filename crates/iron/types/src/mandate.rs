//! Mandates and required surfaces: what the presentation layer must show.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The surface the subject must be shown next. Evaluation always selects
/// exactly one — "never nothing" is a hard postcondition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Subject has not yet been inducted.
    Induction,
    /// Standing is VIOLATED; consequences must be faced.
    Consequence,
    /// Practice was declared today but no evidence submitted.
    EvidenceCapture,
    /// Evidence submitted today but not yet acknowledged.
    LedgerClosure,
    /// Recovery-mode obligation outstanding.
    RecoveryObligation,
    /// An ordinary pending obligation.
    Obligation,
    /// Nothing is owed; show the system state.
    SystemState,
}

impl Surface {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Induction => "induction",
            Self::Consequence => "consequence",
            Self::EvidenceCapture => "evidence_capture",
            Self::LedgerClosure => "ledger_closure",
            Self::RecoveryObligation => "recovery_obligation",
            Self::Obligation => "obligation",
            Self::SystemState => "system_state",
        }
    }
}

/// Identifier for a mandate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MandateId(pub String);

impl MandateId {
    pub fn generate() -> Self {
        Self(format!("mandate-{}", Uuid::new_v4()))
    }
}

/// A UI-facing instruction generated at the end of an evaluation cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mandate {
    pub mandate_id: MandateId,
    pub directive: String,
    pub surface: Surface,
    pub issued_at: DateTime<Utc>,
}
