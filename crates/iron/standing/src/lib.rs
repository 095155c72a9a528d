//! IRON Standing - The standing state machine and evaluation core
//!
//! This crate is the heart of the kernel: a pure, deterministic replay of
//! the behavioral ledger into current institutional state.
//!
//! ## Core Components
//!
//! - **transition** — the pure standing transition function, one event at
//!   a time
//! - **obligations** — the per-state obligation lookup
//! - **history** — era and scar tracking across transitions
//! - **evaluator** — the full-ledger fold producing an
//!   [`EvaluationSnapshot`], including required-surface selection
//!
//! Nothing here performs I/O; identical inputs always yield structurally
//! identical outputs. All state is derivable exclusively from ledger
//! history.

#![deny(unsafe_code)]

pub mod evaluator;
pub mod history;
pub mod obligations;
pub mod transition;

pub use evaluator::{evaluate, evaluate_with_contracts, EvaluationSnapshot};
pub use history::HistoryTracker;
pub use obligations::obligations_for;
pub use transition::{transition, StandingDelta};
