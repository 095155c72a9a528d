//! The compliance gate: the conjunctive authorization checkpoint every
//! state mutation must pass.
//!
//! All listed rules are evaluated sequentially against the same context,
//! so the aggregated rejection-reason list has stable ordering. Any single
//! denial blocks the action, and every reason is surfaced — callers always
//! get the full explanation, never just the first failure.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{RuleContext, RuleDecision, RuleEngine, RuleError};

/// Aggregated result of one gate interception.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub action: String,
    pub allowed: bool,
    /// Every rejection reason, in rule-list order. Empty iff allowed.
    pub rejection_reasons: Vec<String>,
    pub decisions: Vec<RuleDecision>,
}

/// The decision interceptor guarding state mutations.
pub struct ComplianceGate<'a> {
    engine: &'a RuleEngine,
}

impl<'a> ComplianceGate<'a> {
    pub fn new(engine: &'a RuleEngine) -> Self {
        Self { engine }
    }

    /// Run every listed rule against the context. Conjunctive: the action
    /// is allowed only if all rules allow it.
    ///
    /// A rule id that is not registered is a configuration error and fails
    /// the check — a compliance gate must never silently pass an unknown
    /// rule.
    pub fn intercept(
        &self,
        action: &str,
        ctx: &RuleContext,
        rule_ids: &[&str],
    ) -> Result<GateOutcome, RuleError> {
        let mut decisions = Vec::with_capacity(rule_ids.len());
        let mut rejection_reasons = Vec::new();

        for rule_id in rule_ids {
            let decision = match self.engine.evaluate(rule_id, ctx) {
                Ok(decision) => decision,
                Err(RuleError::UnknownRule(id)) => {
                    warn!(action, rule = %id, "Gate referenced an unregistered rule");
                    RuleDecision {
                        rule_id: id.clone(),
                        allowed: false,
                        reason: format!("configuration error: unknown rule '{id}'"),
                    }
                }
                Err(other) => return Err(other),
            };

            if !decision.allowed {
                rejection_reasons.push(decision.reason.clone());
            }
            decisions.push(decision);
        }

        let allowed = rejection_reasons.is_empty();
        if allowed {
            debug!(action, rules = rule_ids.len(), "Gate passed");
        } else {
            debug!(
                action,
                rejections = rejection_reasons.len(),
                "Gate blocked action"
            );
        }

        Ok(GateOutcome {
            action: action.to_string(),
            allowed,
            rejection_reasons,
            decisions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RuleDefinition, RuleVerdict};

    fn engine_with_rules() -> RuleEngine {
        let engine = RuleEngine::new();
        engine
            .register(RuleDefinition::new("allow-a", "a allows", |_| {
                RuleVerdict::Allow
            }))
            .unwrap();
        engine
            .register(RuleDefinition::new("allow-b", "b allows", |_| {
                RuleVerdict::Plain(true)
            }))
            .unwrap();
        engine
            .register(RuleDefinition::new("deny-x", "x denies", |_| {
                RuleVerdict::Deny("x says no".to_string())
            }))
            .unwrap();
        engine
            .register(RuleDefinition::new("deny-y", "y denies", |_| {
                RuleVerdict::Deny("y says no".to_string())
            }))
            .unwrap();
        engine
    }

    #[test]
    fn allowed_when_every_rule_allows() {
        let engine = engine_with_rules();
        let gate = ComplianceGate::new(&engine);
        let outcome = gate
            .intercept("append_event", &RuleContext::new(), &["allow-a", "allow-b"])
            .unwrap();
        assert!(outcome.allowed);
        assert!(outcome.rejection_reasons.is_empty());
        assert_eq!(outcome.decisions.len(), 2);
    }

    #[test]
    fn single_denial_blocks_the_action() {
        let engine = engine_with_rules();
        let gate = ComplianceGate::new(&engine);
        let outcome = gate
            .intercept("append_event", &RuleContext::new(), &["allow-a", "deny-x"])
            .unwrap();
        assert!(!outcome.allowed);
        assert_eq!(outcome.rejection_reasons, vec!["x says no".to_string()]);
    }

    #[test]
    fn all_rejection_reasons_are_accumulated_in_order() {
        let engine = engine_with_rules();
        let gate = ComplianceGate::new(&engine);
        let outcome = gate
            .intercept("append_event", &RuleContext::new(), &["deny-x", "deny-y"])
            .unwrap();
        assert!(!outcome.allowed);
        assert_eq!(
            outcome.rejection_reasons,
            vec!["x says no".to_string(), "y says no".to_string()]
        );
    }

    #[test]
    fn unknown_rule_fails_the_check_with_reason() {
        let engine = engine_with_rules();
        let gate = ComplianceGate::new(&engine);
        let outcome = gate
            .intercept("append_event", &RuleContext::new(), &["allow-a", "ghost"])
            .unwrap();
        assert!(!outcome.allowed);
        assert_eq!(outcome.rejection_reasons.len(), 1);
        assert!(outcome.rejection_reasons[0].contains("unknown rule 'ghost'"));
    }

    #[test]
    fn empty_rule_list_allows() {
        let engine = engine_with_rules();
        let gate = ComplianceGate::new(&engine);
        let outcome = gate
            .intercept("noop", &RuleContext::new(), &[])
            .unwrap();
        assert!(outcome.allowed);
    }
}
