//! Kernel and contract error types.

use iron_ledger::LedgerError;
use iron_rules::RuleError;
use thiserror::Error;

use crate::contracts::ContractStatus;

/// Errors from the cycle controller.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// The compliance gate blocked the action. Every rejection reason is
    /// carried so the caller can render a complete explanation.
    #[error("action '{action}' blocked: {}", reasons.join("; "))]
    Blocked {
        action: String,
        reasons: Vec<String>,
    },
}

/// Errors from the contract registry.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("contract not found: {0}")]
    NotFound(String),

    #[error("duplicate contract: {0}")]
    DuplicateContract(String),

    /// A lifecycle jump to a non-adjacent state is a hard precondition
    /// violation, named by its from/to pair.
    #[error("illegal contract transition for '{contract_id}': {from:?} -> {to:?}")]
    IllegalTransition {
        contract_id: String,
        from: ContractStatus,
        to: ContractStatus,
    },
}
