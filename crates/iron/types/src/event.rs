//! Behavioral events and their classification.
//!
//! The raw event `kind` is an open string set — external collaborators may
//! log anything. The kernel only reacts to kinds it can classify; everything
//! else replays as a no-op rather than an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single behavioral event. Immutable once appended to the ledger.
///
/// Ordering is significant: replay is order-dependent and the ledger
/// guarantees no retroactive reordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Raw event kind, e.g. "PRACTICE_COMPLETE".
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    /// Free-form payload owned by the emitting collaborator.
    #[serde(default)]
    pub payload: Value,
    pub actor: String,
}

impl Event {
    pub fn new(kind: impl Into<String>, timestamp: DateTime<Utc>, actor: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            payload: Value::Null,
            actor: actor.into(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Classify the raw kind string into the classes the state machine
    /// understands. Several raw kinds collapse into one class.
    pub fn class(&self) -> EventClass {
        EventClass::from_kind(&self.kind)
    }
}

/// Semantic classification of raw event kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventClass {
    /// CONTRACT_CREATED, GENESIS_VERDICT_SUBMITTED
    Induction,
    /// PRACTICE_COMPLETE, SESSION_ENDED, FIRST_COMPLIANCE, TRAINING_COMPLETED
    PracticeComplete,
    /// PRACTICE_MISSED, SESSION_MISSED
    PracticeMissed,
    /// REST_TAKEN, REST_OBSERVED, RECOVERY_COMPLETED
    Rest,
    /// ENTER_RECOVERY, ACCEPT_RECOVERY
    EnterRecovery,
    /// AUTHORITY_REALIGNED — global entropy penalty
    AuthorityRealigned,
    /// PRACTICE_DECLARED — intent logged, evidence still owed
    PracticeDeclared,
    /// EVIDENCE_SUBMITTED
    EvidenceSubmitted,
    /// EVIDENCE_ACKNOWLEDGED, LEDGER_CLOSED
    EvidenceAcknowledged,
    /// Anything the kernel does not recognize. Replays as a no-op.
    Unknown(String),
}

impl EventClass {
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "CONTRACT_CREATED" | "GENESIS_VERDICT_SUBMITTED" => Self::Induction,
            "PRACTICE_COMPLETE" | "SESSION_ENDED" | "FIRST_COMPLIANCE" | "TRAINING_COMPLETED" => {
                Self::PracticeComplete
            }
            "PRACTICE_MISSED" | "SESSION_MISSED" => Self::PracticeMissed,
            "REST_TAKEN" | "REST_OBSERVED" | "RECOVERY_COMPLETED" => Self::Rest,
            "ENTER_RECOVERY" | "ACCEPT_RECOVERY" => Self::EnterRecovery,
            "AUTHORITY_REALIGNED" => Self::AuthorityRealigned,
            "PRACTICE_DECLARED" => Self::PracticeDeclared,
            "EVIDENCE_SUBMITTED" => Self::EvidenceSubmitted,
            "EVIDENCE_ACKNOWLEDGED" | "LEDGER_CLOSED" => Self::EvidenceAcknowledged,
            other => Self::Unknown(other.to_string()),
        }
    }
}
