//! The rule engine: an explicit registry of named predicates.
//!
//! No global state — each engine instance is constructed at process start
//! and passed by reference to consumers, so every test gets a fresh
//! registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Context handed to rule logic: an ordered map of named values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleContext(pub BTreeMap<String, Value>);

impl RuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }
}

/// What rule logic may return. The source domain allowed plain booleans
/// alongside structured objects; this tagged union replaces runtime type
/// inspection.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleVerdict {
    Allow,
    Deny(String),
    /// Bare boolean verdict; the engine supplies default reason text.
    Plain(bool),
}

type RuleLogic = Box<dyn Fn(&RuleContext) -> RuleVerdict + Send + Sync>;

/// A rule as registered: id, human description, and its logic.
pub struct RuleDefinition {
    pub id: String,
    pub description: String,
    pub logic: RuleLogic,
}

impl RuleDefinition {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        logic: impl Fn(&RuleContext) -> RuleVerdict + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            logic: Box::new(logic),
        }
    }
}

/// The normalized output of evaluating any rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDecision {
    pub rule_id: String,
    pub allowed: bool,
    pub reason: String,
}

/// Registry of named rules with normalized evaluation.
pub struct RuleEngine {
    rules: RwLock<HashMap<String, RuleDefinition>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// Register a rule. Empty ids and duplicate ids are rejected —
    /// re-registration under an existing id is an error, never a silent
    /// overwrite.
    pub fn register(&self, rule: RuleDefinition) -> Result<(), RuleError> {
        if rule.id.trim().is_empty() {
            return Err(RuleError::MissingId);
        }
        let mut rules = self.rules.write().map_err(|_| RuleError::LockError)?;
        if rules.contains_key(&rule.id) {
            return Err(RuleError::DuplicateRule(rule.id));
        }
        debug!(rule = %rule.id, "Rule registered");
        rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    /// Evaluate one rule against a context.
    ///
    /// An unknown id fails fast with [`RuleError::UnknownRule`]. A panic
    /// inside rule logic is caught and normalized into a denial — rule
    /// evaluation never propagates a panic to the caller.
    pub fn evaluate(&self, rule_id: &str, ctx: &RuleContext) -> Result<RuleDecision, RuleError> {
        let rules = self.rules.read().map_err(|_| RuleError::LockError)?;
        let rule = rules
            .get(rule_id)
            .ok_or_else(|| RuleError::UnknownRule(rule_id.to_string()))?;

        let verdict = catch_unwind(AssertUnwindSafe(|| (rule.logic)(ctx)));

        let decision = match verdict {
            Ok(RuleVerdict::Allow) | Ok(RuleVerdict::Plain(true)) => RuleDecision {
                rule_id: rule.id.clone(),
                allowed: true,
                reason: format!("rule '{}' allows", rule.id),
            },
            Ok(RuleVerdict::Plain(false)) => RuleDecision {
                rule_id: rule.id.clone(),
                allowed: false,
                reason: format!("rule '{}' denies: {}", rule.id, rule.description),
            },
            Ok(RuleVerdict::Deny(reason)) => RuleDecision {
                rule_id: rule.id.clone(),
                allowed: false,
                reason,
            },
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(rule = %rule.id, %message, "Rule logic panicked");
                RuleDecision {
                    rule_id: rule.id.clone(),
                    allowed: false,
                    reason: format!("runtime error in rule '{}': {}", rule.id, message),
                }
            }
        };

        Ok(decision)
    }

    /// Look up a rule's description, if registered.
    pub fn get_description(&self, rule_id: &str) -> Result<Option<String>, RuleError> {
        let rules = self.rules.read().map_err(|_| RuleError::LockError)?;
        Ok(rules.get(rule_id).map(|r| r.description.clone()))
    }

    pub fn contains(&self, rule_id: &str) -> Result<bool, RuleError> {
        let rules = self.rules.read().map_err(|_| RuleError::LockError)?;
        Ok(rules.contains_key(rule_id))
    }

    pub fn len(&self) -> Result<usize, RuleError> {
        let rules = self.rules.read().map_err(|_| RuleError::LockError)?;
        Ok(rules.len())
    }

    pub fn is_empty(&self) -> Result<bool, RuleError> {
        Ok(self.len()? == 0)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Rule-related errors.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule registration requires a non-empty id")]
    MissingId,

    #[error("duplicate rule: {0}")]
    DuplicateRule(String),

    #[error("unknown rule: {0}")]
    UnknownRule(String),

    #[error("lock error")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_evaluate_allow() {
        let engine = RuleEngine::new();
        engine
            .register(RuleDefinition::new("always-allow", "always allows", |_| {
                RuleVerdict::Allow
            }))
            .unwrap();

        let decision = engine
            .evaluate("always-allow", &RuleContext::new())
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.rule_id, "always-allow");
    }

    #[test]
    fn plain_boolean_verdicts_are_normalized() {
        let engine = RuleEngine::new();
        engine
            .register(RuleDefinition::new("coin", "boolean rule", |ctx| {
                RuleVerdict::Plain(ctx.get_bool("heads").unwrap_or(false))
            }))
            .unwrap();

        let allowed = engine
            .evaluate("coin", &RuleContext::new().with("heads", true))
            .unwrap();
        assert!(allowed.allowed);

        let denied = engine.evaluate("coin", &RuleContext::new()).unwrap();
        assert!(!denied.allowed);
        assert!(denied.reason.contains("coin"));
    }

    #[test]
    fn structured_denial_keeps_its_reason() {
        let engine = RuleEngine::new();
        engine
            .register(RuleDefinition::new("budget", "budget check", |_| {
                RuleVerdict::Deny("budget exhausted".to_string())
            }))
            .unwrap();

        let decision = engine.evaluate("budget", &RuleContext::new()).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "budget exhausted");
    }

    #[test]
    fn empty_id_is_rejected() {
        let engine = RuleEngine::new();
        let err = engine
            .register(RuleDefinition::new("  ", "blank", |_| RuleVerdict::Allow))
            .unwrap_err();
        assert!(matches!(err, RuleError::MissingId));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let engine = RuleEngine::new();
        engine
            .register(RuleDefinition::new("r1", "first", |_| RuleVerdict::Allow))
            .unwrap();
        let err = engine
            .register(RuleDefinition::new("r1", "second", |_| RuleVerdict::Allow))
            .unwrap_err();
        assert!(matches!(err, RuleError::DuplicateRule(_)));
        // The original logic is untouched.
        assert_eq!(
            engine.get_description("r1").unwrap().as_deref(),
            Some("first")
        );
    }

    #[test]
    fn unknown_rule_fails_fast() {
        let engine = RuleEngine::new();
        let err = engine.evaluate("ghost", &RuleContext::new()).unwrap_err();
        assert!(matches!(err, RuleError::UnknownRule(_)));
    }

    #[test]
    fn panicking_logic_becomes_a_denial() {
        let engine = RuleEngine::new();
        engine
            .register(RuleDefinition::new("explode", "always panics", |_| {
                panic!("boom")
            }))
            .unwrap();

        let decision = engine.evaluate("explode", &RuleContext::new()).unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("boom"));
    }

    #[test]
    fn context_typed_accessors() {
        let ctx = RuleContext::new()
            .with("name", "iron")
            .with("entropy", 42.5)
            .with("violated", false);
        assert_eq!(ctx.get_str("name"), Some("iron"));
        assert_eq!(ctx.get_f64("entropy"), Some(42.5));
        assert_eq!(ctx.get_bool("violated"), Some(false));
        assert!(ctx.get("missing").is_none());
    }
}
