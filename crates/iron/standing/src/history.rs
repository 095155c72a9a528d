//! Era and scar tracking across standing transitions.
//!
//! The tracker observes each (from, to) state change during replay and
//! derives the institutional history: eras of good standing and the
//! permanent scars left by fractures and recoveries.

use chrono::{DateTime, Utc};
use iron_types::{Era, EraId, EraStatus, Scar, ScarId, ScarKind, StandingState};
use tracing::debug;

/// Accumulates eras and scars while a ledger is replayed.
///
/// Ids are assigned sequentially so identical ledgers produce identical
/// histories.
#[derive(Debug, Default)]
pub struct HistoryTracker {
    eras: Vec<Era>,
    scars: Vec<Scar>,
    fractures: u32,
    recoveries: u32,
    next_era: u32,
    next_scar: u32,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed state change.
    pub fn observe(&mut self, from: StandingState, to: StandingState, at: DateTime<Utc>) {
        if from == to {
            return;
        }

        // Induction and reconstitution both open a fresh era.
        let opens_era = (from == StandingState::PreInduction && to == StandingState::Inducted)
            || (from == StandingState::Recovery && to == StandingState::Reconstituted);

        if to == StandingState::Violated {
            let era_id = self.close_active_era(at);
            self.fractures += 1;
            self.push_scar(ScarKind::Fracture, at, era_id);
        }

        if from == StandingState::Recovery
            && (to == StandingState::Reconstituted || to == StandingState::Compliant)
        {
            self.recoveries += 1;
            // The recovery scar belongs to the era being opened, if any.
            let era_id = opens_era.then(|| EraId::from_sequence(self.next_era + 1));
            self.push_scar(ScarKind::Recovery, at, era_id);
        }

        if opens_era {
            self.next_era += 1;
            let era = Era::open(EraId::from_sequence(self.next_era), at);
            debug!(era = %era.era_id.0, %from, %to, "Era opened");
            self.eras.push(era);
        }
    }

    fn close_active_era(&mut self, at: DateTime<Utc>) -> Option<EraId> {
        let era = self
            .eras
            .iter_mut()
            .find(|e| e.status == EraStatus::Active)?;
        era.status = EraStatus::Closed;
        era.ended_at = Some(at);
        debug!(era = %era.era_id.0, "Era closed by violation");
        Some(era.era_id.clone())
    }

    fn push_scar(&mut self, kind: ScarKind, at: DateTime<Utc>, era_id: Option<EraId>) {
        self.next_scar += 1;
        self.scars.push(Scar {
            scar_id: ScarId::from_sequence(self.next_scar),
            kind,
            date: at.date_naive(),
            era_id,
        });
    }

    pub fn current_era(&self) -> Option<&Era> {
        self.eras.iter().find(|e| e.status == EraStatus::Active)
    }

    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    pub fn scars(&self) -> &[Scar] {
        &self.scars
    }

    pub fn fractures(&self) -> u32 {
        self.fractures
    }

    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    pub fn into_parts(self) -> (Vec<Era>, Vec<Scar>, u32, u32) {
        (self.eras, self.scars, self.fractures, self.recoveries)
    }
}
