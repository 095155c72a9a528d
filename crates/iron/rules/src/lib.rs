//! IRON Rules - Rule registry and compliance gate
//!
//! Rules are named predicates over an arbitrary context. The engine
//! normalizes their heterogeneous verdicts into a single decision shape,
//! and the gate runs a set of rules conjunctively before any state
//! mutation is permitted.

#![deny(unsafe_code)]

pub mod engine;
pub mod gate;

pub use engine::{
    RuleContext, RuleDecision, RuleDefinition, RuleEngine, RuleError, RuleVerdict,
};
pub use gate::{ComplianceGate, GateOutcome};
