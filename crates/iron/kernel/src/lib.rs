//! IRON Kernel - The evaluation cycle controller
//!
//! The kernel owns the ledger, the rule engine, the contract registry, and
//! the invariant engine, and orchestrates one evaluation pass per ingested
//! event in strict order:
//!
//! 1. resolve the cycle phase
//! 2. evaluate contract activations and retirements
//! 3. recompute standing from the full ledger
//! 4. resolve authority from post-recompute standing and contracts
//! 5. generate mandates
//! 6. sweep invariants over the sealed snapshot
//!
//! The order is load-bearing: authority resolution must see post-recompute
//! standing, and mandate generation must see post-resolution authority.
//! Mutations are staged and committed atomically at the end of the cycle;
//! a failed cycle leaves the previously sealed state intact.

#![deny(unsafe_code)]

pub mod authority;
pub mod contracts;
pub mod cycle;
pub mod error;
pub mod mandates;

pub use authority::{resolve_authority, AuthorityGrant};
pub use contracts::{
    ActivationCondition, Contract, ContractRegistry, ContractStatus, ObligationTemplate,
    RetirementCondition,
};
pub use cycle::{CycleId, CycleResult, Kernel};
pub use error::{ContractError, KernelError};
pub use mandates::generate_mandates;
