//! Institutional history: eras of good standing and permanent scars.
//!
//! Scars are never deleted — institutional memory is never erased.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for an era.
///
/// Era ids are assigned sequentially during replay so that identical
/// ledgers always produce identical histories.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EraId(pub String);

impl EraId {
    pub fn from_sequence(n: u32) -> Self {
        Self(format!("era-{n:04}"))
    }
}

/// Identifier for a scar. Sequential for the same reason as [`EraId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScarId(pub String);

impl ScarId {
    pub fn from_sequence(n: u32) -> Self {
        Self(format!("scar-{n:04}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EraStatus {
    Active,
    Closed,
}

/// A contiguous span of good standing, opened at induction or
/// reconstitution and closed by the next violation. Eras never overlap;
/// at most one is active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Era {
    pub era_id: EraId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: EraStatus,
}

impl Era {
    pub fn open(era_id: EraId, started_at: DateTime<Utc>) -> Self {
        Self {
            era_id,
            started_at,
            ended_at: None,
            status: EraStatus::Active,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScarKind {
    /// Entry into VIOLATED.
    Fracture,
    /// Completed passage out of RECOVERY.
    Recovery,
}

/// A permanent record of a past fracture or recovery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scar {
    pub scar_id: ScarId,
    pub kind: ScarKind,
    pub date: NaiveDate,
    /// The era that was active when the scar formed, if any.
    pub era_id: Option<EraId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_era_is_active_and_open_ended() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let era = Era::open(EraId::from_sequence(1), t);
        assert_eq!(era.status, EraStatus::Active);
        assert!(era.ended_at.is_none());
    }

    #[test]
    fn sequential_ids_are_deterministic() {
        assert_eq!(EraId::from_sequence(1), EraId::from_sequence(1));
        assert_ne!(EraId::from_sequence(1), EraId::from_sequence(2));
    }
}
