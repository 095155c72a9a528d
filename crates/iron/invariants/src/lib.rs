//! IRON Invariants - Periodic sweep asserting global system truths
//!
//! An independent battery of checks runs against sealed snapshots. Any
//! failure escalates the sweep status to a constitutional crisis; the
//! response orchestration (lockdown, escalation) is an external
//! collaborator, not part of this crate.
//!
//! Sweep reports are retained in an append-only history for audit.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use iron_types::{StandingState, Surface};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// The slice of a sealed snapshot the invariant battery inspects.
///
/// Constructed by the cycle controller after evaluation; the previous
/// sweep's view is kept so monotonicity can be checked across snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvariantContext {
    pub standing_state: StandingState,
    pub entropy: f64,
    pub streak: u32,
    pub ledger_length: usize,
    pub ledger_head: Option<DateTime<Utc>>,
    pub active_eras: usize,
    pub scar_count: usize,
    pub required_surface: Surface,
    /// Optional bounded-in-[0,1] fitness vector, when the caller tracks one.
    pub fitness: Option<Vec<f64>>,
}

/// Severity of an invariant violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The system must escalate; the snapshot is not trustworthy.
    Constitutional,
    /// Log and alert, but the system may continue.
    Warning,
}

/// A single failed check.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvariantViolation {
    pub invariant_id: String,
    pub message: String,
    pub severity: Severity,
}

/// Invariant trait — one global truth per implementation.
pub trait Invariant: Send + Sync {
    /// Unique invariant identifier (e.g., "INV-ENTROPY").
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    fn severity(&self) -> Severity {
        Severity::Constitutional
    }

    /// Check against the current context; `prev` is the context from the
    /// previous sweep, when one exists.
    fn check(
        &self,
        ctx: &InvariantContext,
        prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation>;
}

fn violation(id: &str, severity: Severity, message: impl Into<String>) -> InvariantViolation {
    InvariantViolation {
        invariant_id: id.to_string(),
        message: message.into(),
        severity,
    }
}

// =========================================================================
// THE STANDING INVARIANT BATTERY
// =========================================================================

/// Entropy (and therefore integrity) stays in [0, 100].
pub struct EntropyBoundsInvariant;

impl Invariant for EntropyBoundsInvariant {
    fn id(&self) -> &str {
        "INV-ENTROPY"
    }
    fn name(&self) -> &str {
        "Entropy Bounds"
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        _prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        if !(0.0..=100.0).contains(&ctx.entropy) || !ctx.entropy.is_finite() {
            return Err(violation(
                self.id(),
                self.severity(),
                format!("entropy {} outside [0, 100]", ctx.entropy),
            ));
        }
        Ok(())
    }
}

/// A non-zero streak only exists in states where practice accrues.
pub struct StreakConsistencyInvariant;

impl Invariant for StreakConsistencyInvariant {
    fn id(&self) -> &str {
        "INV-STREAK"
    }
    fn name(&self) -> &str {
        "Streak Consistency"
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        _prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        if ctx.streak > 0 && ctx.standing_state == StandingState::Violated {
            return Err(violation(
                self.id(),
                self.severity(),
                format!("violated standing carries streak {}", ctx.streak),
            ));
        }
        Ok(())
    }
}

/// The ledger is append-only: length never decreases across sweeps and
/// the head timestamp never moves backwards.
pub struct LedgerMonotonicityInvariant;

impl Invariant for LedgerMonotonicityInvariant {
    fn id(&self) -> &str {
        "INV-LEDGER"
    }
    fn name(&self) -> &str {
        "Ledger Monotonicity"
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        let Some(prev) = prev else { return Ok(()) };
        if ctx.ledger_length < prev.ledger_length {
            return Err(violation(
                self.id(),
                self.severity(),
                format!(
                    "ledger shrank from {} to {} events",
                    prev.ledger_length, ctx.ledger_length
                ),
            ));
        }
        if let (Some(head), Some(prev_head)) = (ctx.ledger_head, prev.ledger_head) {
            if head < prev_head {
                return Err(violation(
                    self.id(),
                    self.severity(),
                    format!("ledger head moved backwards: {prev_head} -> {head}"),
                ));
            }
        }
        Ok(())
    }
}

/// At most one era is ever active.
pub struct SingleActiveEraInvariant;

impl Invariant for SingleActiveEraInvariant {
    fn id(&self) -> &str {
        "INV-ERA"
    }
    fn name(&self) -> &str {
        "Single Active Era"
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        _prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        if ctx.active_eras > 1 {
            return Err(violation(
                self.id(),
                self.severity(),
                format!("{} eras active simultaneously", ctx.active_eras),
            ));
        }
        Ok(())
    }
}

/// Scars are never erased: the count never decreases across sweeps.
pub struct ScarPermanenceInvariant;

impl Invariant for ScarPermanenceInvariant {
    fn id(&self) -> &str {
        "INV-SCAR"
    }
    fn name(&self) -> &str {
        "Scar Permanence"
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        if let Some(prev) = prev {
            if ctx.scar_count < prev.scar_count {
                return Err(violation(
                    self.id(),
                    self.severity(),
                    format!(
                        "scar count decreased from {} to {}",
                        prev.scar_count, ctx.scar_count
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Terminal standings pin the required surface: a VIOLATED subject must
/// face the consequence surface, an uninducted one the induction surface.
pub struct SurfaceConsistencyInvariant;

impl Invariant for SurfaceConsistencyInvariant {
    fn id(&self) -> &str {
        "INV-SURFACE"
    }
    fn name(&self) -> &str {
        "Surface Consistency"
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        _prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        let required = match ctx.standing_state {
            StandingState::Violated => Some(Surface::Consequence),
            StandingState::PreInduction => Some(Surface::Induction),
            _ => None,
        };
        if let Some(required) = required {
            if ctx.required_surface != required {
                return Err(violation(
                    self.id(),
                    self.severity(),
                    format!(
                        "{} standing requires surface {:?}, found {:?}",
                        ctx.standing_state, required, ctx.required_surface
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Fitness vectors, when present, are bounded in [0, 1].
pub struct FitnessBoundsInvariant;

impl Invariant for FitnessBoundsInvariant {
    fn id(&self) -> &str {
        "INV-FITNESS"
    }
    fn name(&self) -> &str {
        "Fitness Bounds"
    }
    fn severity(&self) -> Severity {
        Severity::Warning
    }
    fn check(
        &self,
        ctx: &InvariantContext,
        _prev: Option<&InvariantContext>,
    ) -> Result<(), InvariantViolation> {
        if let Some(fitness) = &ctx.fitness {
            for (i, value) in fitness.iter().enumerate() {
                if !(0.0..=1.0).contains(value) || !value.is_finite() {
                    return Err(violation(
                        self.id(),
                        self.severity(),
                        format!("fitness[{i}] = {value} outside [0, 1]"),
                    ));
                }
            }
        }
        Ok(())
    }
}

// =========================================================================
// SWEEP ENGINE
// =========================================================================

/// Sweep status: nominal, or a constitutional crisis on any failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SweepStatus {
    Nominal,
    ConstitutionalCrisis,
}

/// Per-check detail line in a report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckDetail {
    pub invariant_id: String,
    pub severity: Severity,
    pub passed: bool,
    pub message: Option<String>,
}

/// Structured result of one sweep; history is retained for audit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvariantReport {
    pub timestamp: DateTime<Utc>,
    pub tick: u64,
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub status: SweepStatus,
    pub details: Vec<CheckDetail>,
}

/// Runs the invariant battery against snapshots and keeps an append-only
/// report history.
pub struct InvariantEngine {
    invariants: Vec<Box<dyn Invariant>>,
    previous: Option<InvariantContext>,
    history: Vec<InvariantReport>,
}

impl InvariantEngine {
    /// An empty engine with no invariants loaded.
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
            previous: None,
            history: Vec::new(),
        }
    }

    /// An engine loaded with the full standing battery.
    pub fn with_standing_battery() -> Self {
        let mut engine = Self::new();
        engine.register(Box::new(EntropyBoundsInvariant));
        engine.register(Box::new(StreakConsistencyInvariant));
        engine.register(Box::new(LedgerMonotonicityInvariant));
        engine.register(Box::new(SingleActiveEraInvariant));
        engine.register(Box::new(ScarPermanenceInvariant));
        engine.register(Box::new(SurfaceConsistencyInvariant));
        engine.register(Box::new(FitnessBoundsInvariant));
        info!(count = engine.invariants.len(), "Invariant battery loaded");
        engine
    }

    pub fn register(&mut self, invariant: Box<dyn Invariant>) {
        debug!(id = invariant.id(), name = invariant.name(), "Invariant registered");
        self.invariants.push(invariant);
    }

    /// Run every invariant against the snapshot context, record the report,
    /// and remember the context for cross-sweep checks.
    pub fn sweep(&mut self, tick: u64, ctx: &InvariantContext, now: DateTime<Utc>) -> InvariantReport {
        let mut details = Vec::with_capacity(self.invariants.len());
        let mut failed = 0;

        for invariant in &self.invariants {
            match invariant.check(ctx, self.previous.as_ref()) {
                Ok(()) => {
                    details.push(CheckDetail {
                        invariant_id: invariant.id().to_string(),
                        severity: invariant.severity(),
                        passed: true,
                        message: None,
                    });
                }
                Err(v) => {
                    error!(
                        tick,
                        id = %v.invariant_id,
                        message = %v.message,
                        severity = ?v.severity,
                        "INVARIANT VIOLATION"
                    );
                    failed += 1;
                    details.push(CheckDetail {
                        invariant_id: v.invariant_id,
                        severity: v.severity,
                        passed: false,
                        message: Some(v.message),
                    });
                }
            }
        }

        let total_checks = details.len();
        let report = InvariantReport {
            timestamp: now,
            tick,
            total_checks,
            passed: total_checks - failed,
            failed,
            status: if failed == 0 {
                SweepStatus::Nominal
            } else {
                SweepStatus::ConstitutionalCrisis
            },
            details,
        };

        self.previous = Some(ctx.clone());
        self.history.push(report.clone());
        report
    }

    /// Copies of all retained reports, oldest first.
    pub fn history(&self) -> Vec<InvariantReport> {
        self.history.clone()
    }

    pub fn count(&self) -> usize {
        self.invariants.len()
    }
}

impl Default for InvariantEngine {
    fn default() -> Self {
        Self::new()
    }
}
