//! The cycle controller: one evaluation pass per ingested event, in
//! strict order, sealed atomically.

use chrono::{DateTime, NaiveDate, Utc};
use iron_invariants::{InvariantContext, InvariantEngine, InvariantReport, SweepStatus};
use iron_ledger::EventLedger;
use iron_rules::{ComplianceGate, GateOutcome, RuleContext, RuleDefinition, RuleEngine, RuleVerdict};
use iron_standing::{evaluate_with_contracts, EvaluationSnapshot};
use iron_types::{Event, EraStatus, Mandate, StandingState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::authority::{register_builtin_rules, resolve_authority, AuthorityGrant};
use crate::contracts::{Contract, ContractRegistry};
use crate::error::KernelError;
use crate::mandates::generate_mandates;

/// Rules guarding event ingestion.
pub const RULE_ACTOR_PRESENT: &str = "actor-present";
pub const RULE_KIND_PRESENT: &str = "event-kind-present";

/// Identifier for one sealed cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub String);

impl CycleId {
    pub fn generate() -> Self {
        Self(format!("cycle-{}", Uuid::new_v4()))
    }
}

/// The sealed result of one evaluation cycle. Copies only — callers never
/// hold live references into kernel state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle_id: CycleId,
    pub tick: u64,
    pub cycle_day: NaiveDate,
    /// True when the cycle completed and the invariant sweep was nominal.
    pub success: bool,
    pub snapshot: EvaluationSnapshot,
    pub authority: AuthorityGrant,
    pub mandates: Vec<Mandate>,
    pub invariant_report: InvariantReport,
    pub activated_contracts: Vec<String>,
    pub retired_contracts: Vec<String>,
}

/// The IRON kernel: owns the ledger, rules, contracts, and invariants,
/// and runs the evaluation cycle.
pub struct Kernel {
    ledger: EventLedger,
    rules: RuleEngine,
    contracts: ContractRegistry,
    invariants: InvariantEngine,
    tick: u64,
    sealed: Option<CycleResult>,
}

impl Kernel {
    /// A kernel with the built-in compliance rules, the genesis accord,
    /// and the full invariant battery.
    pub fn new() -> Result<Self, KernelError> {
        let rules = RuleEngine::new();
        register_builtin_rules(&rules)?;
        register_ingest_rules(&rules)?;

        Ok(Self {
            ledger: EventLedger::new(),
            rules,
            contracts: ContractRegistry::with_genesis(),
            invariants: InvariantEngine::with_standing_battery(),
            tick: 0,
            sealed: None,
        })
    }

    /// Append one event and run a cycle.
    ///
    /// The append itself is gated: a blocked event never reaches the
    /// ledger, and the full rejection-reason list is surfaced.
    pub fn ingest(&mut self, event: Event) -> Result<CycleResult, KernelError> {
        let ctx = RuleContext::new()
            .with("actor", event.actor.as_str())
            .with("kind", event.kind.as_str());
        let outcome = self.authorize("ingest_event", &ctx, &[RULE_ACTOR_PRESENT, RULE_KIND_PRESENT])?;
        if !outcome.allowed {
            warn!(kind = %event.kind, reasons = ?outcome.rejection_reasons, "Ingest blocked");
            return Err(KernelError::Blocked {
                action: outcome.action,
                reasons: outcome.rejection_reasons,
            });
        }

        let now = event.timestamp;
        self.ledger.append(event)?;
        self.run_cycle(now)
    }

    /// Run one evaluation cycle against the current ledger.
    ///
    /// Order is fixed: phase, contracts, standing, authority, mandates,
    /// invariants. Mutations are staged and committed together at the
    /// end; if any step fails, the previously sealed result is untouched.
    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleResult, KernelError> {
        let tick = self.tick + 1;

        // 1. Resolve phase.
        let cycle_day = now.date_naive();
        debug!(tick, %cycle_day, "Cycle started");

        // 2. Contract activations/retirements, staged on a copy.
        // Activation conditions see pre-recompute standing.
        let prior_state = self
            .sealed
            .as_ref()
            .map(|r| r.snapshot.standing.state)
            .unwrap_or(StandingState::PreInduction);
        let events = self.ledger.events()?;
        let mut staged_contracts = self.contracts.clone();
        let activated_contracts = staged_contracts.activate_pending(events.len(), prior_state);
        let retired_contracts = staged_contracts.retire_expired(now, prior_state);

        // 3. Recompute standing from the full ledger, owing the
        // obligations the active contracts impose.
        let contract_obligations = staged_contracts.active_obligations();
        let snapshot = evaluate_with_contracts(&events, &contract_obligations, now);

        // 4. Resolve authority from post-recompute standing.
        let authority = resolve_authority(&snapshot, &self.rules)?;

        // 5. Generate mandates from post-resolution authority.
        let mandates = generate_mandates(&snapshot, &authority, now);

        // 6. Invariant sweep over the about-to-be-sealed snapshot. This is
        // the commit point: every fallible step is behind us.
        let invariant_ctx = InvariantContext {
            standing_state: snapshot.standing.state,
            entropy: snapshot.standing.entropy,
            streak: snapshot.standing.streak,
            ledger_length: events.len(),
            ledger_head: events.last().map(|e| e.timestamp),
            active_eras: snapshot
                .eras
                .iter()
                .filter(|e| e.status == EraStatus::Active)
                .count(),
            scar_count: snapshot.scars.len(),
            required_surface: snapshot.required_surface,
            fitness: None,
        };
        let invariant_report = self.invariants.sweep(tick, &invariant_ctx, now);
        let success = invariant_report.status == SweepStatus::Nominal;

        let result = CycleResult {
            cycle_id: CycleId::generate(),
            tick,
            cycle_day,
            success,
            snapshot,
            authority,
            mandates,
            invariant_report,
            activated_contracts,
            retired_contracts,
        };

        // 7. Commit atomically.
        self.contracts = staged_contracts;
        self.tick = tick;
        self.sealed = Some(result.clone());
        info!(tick, success, surface = result.snapshot.required_surface.id(), "Cycle sealed");
        Ok(result)
    }

    /// Run named rules against a context through the compliance gate.
    pub fn authorize(
        &self,
        action: &str,
        ctx: &RuleContext,
        rule_ids: &[&str],
    ) -> Result<GateOutcome, KernelError> {
        let gate = ComplianceGate::new(&self.rules);
        Ok(gate.intercept(action, ctx, rule_ids)?)
    }

    /// Copy of the most recently sealed cycle result.
    pub fn sealed(&self) -> Option<CycleResult> {
        self.sealed.clone()
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    pub fn register_contract(&mut self, contract: Contract) -> Result<(), KernelError> {
        Ok(self.contracts.register(contract)?)
    }

    pub fn retire_contract(&mut self, id: &str) -> Result<(), KernelError> {
        Ok(self.contracts.retire(id)?)
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    /// Copies of all invariant sweep reports, oldest first.
    pub fn invariant_history(&self) -> Vec<InvariantReport> {
        self.invariants.history()
    }
}

fn register_ingest_rules(engine: &RuleEngine) -> Result<(), iron_rules::RuleError> {
    engine.register(RuleDefinition::new(
        RULE_ACTOR_PRESENT,
        "every event must name its actor",
        |ctx| {
            let present = ctx
                .get_str("actor")
                .map(|a| !a.trim().is_empty())
                .unwrap_or(false);
            if present {
                RuleVerdict::Allow
            } else {
                RuleVerdict::Deny("event actor is missing".to_string())
            }
        },
    ))?;

    engine.register(RuleDefinition::new(
        RULE_KIND_PRESENT,
        "every event must carry a kind",
        |ctx| {
            let present = ctx
                .get_str("kind")
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false);
            RuleVerdict::Plain(present)
        },
    ))?;

    Ok(())
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("tick", &self.tick)
            .field("sealed", &self.sealed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn ev(kind: &str, t: DateTime<Utc>) -> Event {
        Event::new(kind, t, "subject")
    }

    #[test]
    fn ingest_appends_and_seals_a_cycle() {
        let mut kernel = Kernel::new().unwrap();
        let result = kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        assert!(result.success);
        assert_eq!(result.tick, 1);
        assert_eq!(result.snapshot.standing.state, StandingState::Inducted);
        assert_eq!(kernel.ledger().len().unwrap(), 1);
        assert!(!result.mandates.is_empty());
    }

    #[test]
    fn blocked_event_never_reaches_the_ledger() {
        let mut kernel = Kernel::new().unwrap();
        let err = kernel
            .ingest(Event::new("PRACTICE_COMPLETE", at(1, 9), "  "))
            .unwrap_err();
        match err {
            KernelError::Blocked { reasons, .. } => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("actor"));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(kernel.ledger().is_empty().unwrap());
        assert!(kernel.sealed().is_none());
    }

    #[test]
    fn genesis_accord_activates_on_first_cycle() {
        let mut kernel = Kernel::new().unwrap();
        let result = kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        assert_eq!(result.activated_contracts, vec!["genesis-accord".to_string()]);
        assert!(result.retired_contracts.is_empty());
    }

    #[test]
    fn contract_obligations_reach_the_snapshot_and_mandates() {
        use crate::contracts::{ActivationCondition, Contract, ObligationTemplate};
        use iron_types::{ObligationCycle, ObligationKind};

        let mut kernel = Kernel::new().unwrap();
        kernel
            .register_contract(Contract::dormant(
                "intention-compact",
                "Intention Compact",
                ActivationCondition::OnFirstEvent,
                vec![ObligationTemplate {
                    kind: ObligationKind::IntentionStatement,
                    cycle: ObligationCycle::Once,
                }],
            ))
            .unwrap();

        let result = kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        assert!(result
            .snapshot
            .obligations
            .iter()
            .any(|o| o.id == "intention_statement" && o.contract_id == "intention-compact"));
        assert!(result
            .mandates
            .iter()
            .any(|m| m.directive.contains("intention")));
    }

    #[test]
    fn expired_contract_is_retired_during_the_cycle() {
        use crate::contracts::{ActivationCondition, Contract, ObligationTemplate, RetirementCondition};
        use iron_types::{ObligationCycle, ObligationKind};

        let mut kernel = Kernel::new().unwrap();
        kernel
            .register_contract(
                Contract::dormant(
                    "intention-compact",
                    "Intention Compact",
                    ActivationCondition::OnFirstEvent,
                    vec![ObligationTemplate {
                        kind: ObligationKind::IntentionStatement,
                        cycle: ObligationCycle::Once,
                    }],
                )
                .with_retirement(RetirementCondition::After(at(2, 0))),
            )
            .unwrap();

        let result = kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        assert!(result.activated_contracts.contains(&"intention-compact".to_string()));

        let result = kernel.ingest(ev("PRACTICE_COMPLETE", at(2, 9))).unwrap();
        assert_eq!(result.retired_contracts, vec!["intention-compact".to_string()]);
        // The retired contract's obligation is void.
        assert!(!result
            .snapshot
            .obligations
            .iter()
            .any(|o| o.contract_id == "intention-compact"));
        assert_eq!(
            kernel.contracts().get("intention-compact").unwrap().status,
            crate::contracts::ContractStatus::Retired
        );
    }

    #[test]
    fn failed_cycle_leaves_previous_seal_intact() {
        let mut kernel = Kernel::new().unwrap();
        kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        let sealed_before = kernel.sealed().unwrap();

        // Non-monotonic append fails inside ingest, before any cycle
        // mutation is committed.
        let err = kernel
            .ingest(ev("PRACTICE_COMPLETE", at(1, 8)))
            .unwrap_err();
        assert!(matches!(err, KernelError::Ledger(_)));

        let sealed_after = kernel.sealed().unwrap();
        assert_eq!(sealed_after.tick, sealed_before.tick);
        assert_eq!(sealed_after.cycle_id, sealed_before.cycle_id);
    }

    #[test]
    fn ticks_increase_per_cycle() {
        let mut kernel = Kernel::new().unwrap();
        kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        let result = kernel.ingest(ev("PRACTICE_COMPLETE", at(1, 10))).unwrap();
        assert_eq!(result.tick, 2);
        assert_eq!(kernel.invariant_history().len(), 2);
    }

    #[test]
    fn authority_sees_post_recompute_standing() {
        let mut kernel = Kernel::new().unwrap();
        kernel.ingest(ev("CONTRACT_CREATED", at(1, 9))).unwrap();
        // The miss fractures standing in this very cycle; authority must
        // already reflect the violation.
        let result = kernel.ingest(ev("PRACTICE_MISSED", at(1, 21))).unwrap();
        assert_eq!(result.snapshot.standing.state, StandingState::Violated);
        assert!(!result.authority.may_declare_practice);
        assert!(result.authority.may_enter_recovery);
    }

    #[test]
    fn authorize_surfaces_all_reasons() {
        let kernel = Kernel::new().unwrap();
        let ctx = RuleContext::new().with("actor", "").with("kind", "");
        let outcome = kernel
            .authorize("ingest_event", &ctx, &[RULE_ACTOR_PRESENT, RULE_KIND_PRESENT])
            .unwrap();
        assert!(!outcome.allowed);
        assert_eq!(outcome.rejection_reasons.len(), 2);
    }
}
