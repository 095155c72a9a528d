//! Authority resolution: which actions the subject may take, derived from
//! post-recompute standing and gated through the compliance rules.

use iron_rules::{ComplianceGate, RuleContext, RuleEngine, RuleError};
use iron_standing::EvaluationSnapshot;
use iron_types::StandingState;
use serde::{Deserialize, Serialize};

/// Rule ids the kernel registers at construction and consults here.
pub const RULE_ENTROPY_BOUNDED: &str = "entropy-bounded";
pub const RULE_NO_ACTION_WHILE_VIOLATED: &str = "no-action-while-violated";

/// The permission set sealed into each cycle result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorityGrant {
    pub may_declare_practice: bool,
    pub may_submit_evidence: bool,
    pub may_enter_recovery: bool,
    pub may_amend_contracts: bool,
    /// Reasons any permission above was withheld, in gate order.
    pub withheld_reasons: Vec<String>,
}

/// Resolve the subject's authority from the evaluated snapshot.
///
/// Must run after standing recomputation: the permissions depend on the
/// post-replay state, never on stale standing.
pub fn resolve_authority(
    snapshot: &EvaluationSnapshot,
    engine: &RuleEngine,
) -> Result<AuthorityGrant, RuleError> {
    let gate = ComplianceGate::new(engine);
    let ctx = RuleContext::new()
        .with("state", snapshot.standing.state.to_string())
        .with("entropy", snapshot.standing.entropy)
        .with("streak", snapshot.standing.streak as i64)
        .with(
            "violated",
            snapshot.standing.state == StandingState::Violated,
        );

    let practice_outcome = gate.intercept(
        "declare_practice",
        &ctx,
        &[RULE_ENTROPY_BOUNDED, RULE_NO_ACTION_WHILE_VIOLATED],
    )?;

    let state = snapshot.standing.state;
    let practicing_state = state != StandingState::PreInduction;

    Ok(AuthorityGrant {
        may_declare_practice: practice_outcome.allowed && practicing_state,
        may_submit_evidence: practice_outcome.allowed && practicing_state,
        may_enter_recovery: state == StandingState::Violated,
        may_amend_contracts: state == StandingState::Institutional,
        withheld_reasons: practice_outcome.rejection_reasons,
    })
}

/// Register the kernel's built-in compliance rules on a fresh engine.
pub fn register_builtin_rules(engine: &RuleEngine) -> Result<(), RuleError> {
    use iron_rules::{RuleDefinition, RuleVerdict};

    engine.register(RuleDefinition::new(
        RULE_ENTROPY_BOUNDED,
        "entropy must stay within [0, 100]",
        |ctx| {
            let entropy = ctx.get_f64("entropy").unwrap_or(f64::NAN);
            if (0.0..=100.0).contains(&entropy) {
                RuleVerdict::Allow
            } else {
                RuleVerdict::Deny(format!("entropy {entropy} outside [0, 100]"))
            }
        },
    ))?;

    engine.register(RuleDefinition::new(
        RULE_NO_ACTION_WHILE_VIOLATED,
        "no ordinary action is permitted while standing is VIOLATED",
        |ctx| {
            if ctx.get_bool("violated").unwrap_or(false) {
                RuleVerdict::Deny(
                    "standing is VIOLATED; acknowledge the fracture and enter recovery"
                        .to_string(),
                )
            } else {
                RuleVerdict::Allow
            }
        },
    ))?;

    Ok(())
}
