//! IRON Types - Shared domain types for the accountability kernel
//!
//! Every other IRON crate builds on these types. The domain recasts
//! personal accountability in institutional terms: a subject holds a
//! Standing governed by a state machine, is bound by Contracts that
//! impose Obligations, and all history lives in an append-only Ledger
//! from which all state is derived.

#![deny(unsafe_code)]

pub mod event;
pub mod history;
pub mod mandate;
pub mod obligation;
pub mod standing;

pub use event::{Event, EventClass};
pub use history::{Era, EraId, EraStatus, Scar, ScarId, ScarKind};
pub use mandate::{Mandate, MandateId, Surface};
pub use obligation::{Obligation, ObligationCycle, ObligationKind, ObligationStatus};
pub use standing::{Standing, StandingState};
