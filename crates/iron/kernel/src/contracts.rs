//! Contracts: rule bundles that activate on conditions and, while active,
//! impose obligations.
//!
//! Lifecycle is strictly Dormant -> Active -> Retired; any other jump is
//! an illegal transition. Retiring a contract voids the obligations it
//! imposed.

use chrono::{DateTime, Utc};
use iron_types::{Obligation, ObligationCycle, ObligationKind, StandingState};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ContractError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Dormant,
    Active,
    Retired,
}

/// When a dormant contract activates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActivationCondition {
    /// Activates as soon as the ledger holds any event.
    OnFirstEvent,
    /// Activates when the subject reaches the given standing.
    OnStanding(StandingState),
    /// Only activated explicitly by a collaborator.
    Manual,
}

/// When an active contract retires on its own. Evaluated each cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RetirementCondition {
    /// Never retires automatically; only by explicit call.
    Never,
    /// Retires when the subject reaches the given standing.
    OnStanding(StandingState),
    /// Retires once the cycle clock passes the given instant.
    After(DateTime<Utc>),
}

/// An obligation the contract imposes while active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObligationTemplate {
    pub kind: ObligationKind,
    pub cycle: ObligationCycle,
}

/// A contract: activation condition plus the obligations it imposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub title: String,
    pub activation: ActivationCondition,
    pub retirement: RetirementCondition,
    pub obligations: Vec<ObligationTemplate>,
    pub status: ContractStatus,
}

impl Contract {
    pub fn dormant(
        id: impl Into<String>,
        title: impl Into<String>,
        activation: ActivationCondition,
        obligations: Vec<ObligationTemplate>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            activation,
            retirement: RetirementCondition::Never,
            obligations,
            status: ContractStatus::Dormant,
        }
    }

    pub fn with_retirement(mut self, retirement: RetirementCondition) -> Self {
        self.retirement = retirement;
        self
    }

    /// The genesis accord implicit in every subject's induction: active
    /// from the first ledger event, imposes daily practice.
    pub fn genesis_accord() -> Self {
        Self::dormant(
            "genesis-accord",
            "Genesis Accord",
            ActivationCondition::OnFirstEvent,
            vec![ObligationTemplate {
                kind: ObligationKind::DailyPractice,
                cycle: ObligationCycle::Daily,
            }],
        )
    }
}

/// Registry of contracts with lifecycle enforcement.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    contracts: Vec<Contract>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_genesis() -> Self {
        let mut registry = Self::new();
        // Registering a fresh contract cannot collide.
        registry
            .register(Contract::genesis_accord())
            .unwrap_or_else(|_| unreachable!("empty registry cannot hold a duplicate"));
        registry
    }

    pub fn register(&mut self, contract: Contract) -> Result<(), ContractError> {
        if self.contracts.iter().any(|c| c.id == contract.id) {
            return Err(ContractError::DuplicateContract(contract.id));
        }
        self.contracts.push(contract);
        Ok(())
    }

    /// Activate every dormant contract whose condition now holds.
    /// Returns the ids of newly activated contracts.
    pub fn activate_pending(
        &mut self,
        ledger_length: usize,
        standing: StandingState,
    ) -> Vec<String> {
        let mut activated = Vec::new();
        for contract in &mut self.contracts {
            if contract.status != ContractStatus::Dormant {
                continue;
            }
            let triggered = match &contract.activation {
                ActivationCondition::OnFirstEvent => ledger_length > 0,
                ActivationCondition::OnStanding(state) => standing == *state,
                ActivationCondition::Manual => false,
            };
            if triggered {
                contract.status = ContractStatus::Active;
                info!(contract = %contract.id, "Contract activated");
                activated.push(contract.id.clone());
            }
        }
        activated
    }

    /// Retire every active contract whose retirement condition now holds.
    /// Returns the ids of newly retired contracts.
    pub fn retire_expired(&mut self, now: DateTime<Utc>, standing: StandingState) -> Vec<String> {
        let mut retired = Vec::new();
        for contract in &mut self.contracts {
            if contract.status != ContractStatus::Active {
                continue;
            }
            let triggered = match &contract.retirement {
                RetirementCondition::Never => false,
                RetirementCondition::OnStanding(state) => standing == *state,
                RetirementCondition::After(instant) => now >= *instant,
            };
            if triggered {
                contract.status = ContractStatus::Retired;
                info!(contract = %contract.id, "Contract retired");
                retired.push(contract.id.clone());
            }
        }
        retired
    }

    /// Move one contract through its lifecycle. Only Dormant -> Active and
    /// Active -> Retired are legal.
    pub fn set_status(&mut self, id: &str, to: ContractStatus) -> Result<(), ContractError> {
        let contract = self
            .contracts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ContractError::NotFound(id.to_string()))?;

        let legal = matches!(
            (contract.status, to),
            (ContractStatus::Dormant, ContractStatus::Active)
                | (ContractStatus::Active, ContractStatus::Retired)
        );
        if !legal {
            return Err(ContractError::IllegalTransition {
                contract_id: contract.id.clone(),
                from: contract.status,
                to,
            });
        }
        info!(contract = %contract.id, from = ?contract.status, ?to, "Contract transition");
        contract.status = to;
        Ok(())
    }

    pub fn retire(&mut self, id: &str) -> Result<(), ContractError> {
        self.set_status(id, ContractStatus::Retired)
    }

    pub fn get(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &Contract> {
        self.contracts
            .iter()
            .filter(|c| c.status == ContractStatus::Active)
    }

    /// Pending obligations imposed by the currently active contracts.
    /// Retired contracts impose nothing — their obligations are void.
    pub fn active_obligations(&self) -> Vec<Obligation> {
        self.active()
            .flat_map(|contract| {
                contract
                    .obligations
                    .iter()
                    .map(|t| Obligation::pending(t.kind, t.cycle, &contract.id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_accord_activates_on_first_event() {
        let mut registry = ContractRegistry::with_genesis();
        assert!(registry.activate_pending(0, StandingState::PreInduction).is_empty());

        let activated = registry.activate_pending(1, StandingState::PreInduction);
        assert_eq!(activated, vec!["genesis-accord".to_string()]);
        assert_eq!(
            registry.get("genesis-accord").unwrap().status,
            ContractStatus::Active
        );
    }

    #[test]
    fn standing_conditioned_contract_waits_for_standing() {
        let mut registry = ContractRegistry::new();
        registry
            .register(Contract::dormant(
                "recovery-compact",
                "Recovery Compact",
                ActivationCondition::OnStanding(StandingState::Recovery),
                vec![ObligationTemplate {
                    kind: ObligationKind::ReducedPractice,
                    cycle: ObligationCycle::Daily,
                }],
            ))
            .unwrap();

        assert!(registry.activate_pending(5, StandingState::Compliant).is_empty());
        let activated = registry.activate_pending(6, StandingState::Recovery);
        assert_eq!(activated.len(), 1);
    }

    fn at(day: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn time_based_retirement_triggers_once_the_instant_passes() {
        let mut registry = ContractRegistry::new();
        registry
            .register(
                Contract::dormant(
                    "sprint-pact",
                    "Sprint Pact",
                    ActivationCondition::OnFirstEvent,
                    vec![],
                )
                .with_retirement(RetirementCondition::After(at(5))),
            )
            .unwrap();
        registry.activate_pending(1, StandingState::Inducted);

        assert!(registry.retire_expired(at(4), StandingState::Compliant).is_empty());
        let retired = registry.retire_expired(at(5), StandingState::Compliant);
        assert_eq!(retired, vec!["sprint-pact".to_string()]);
        assert_eq!(
            registry.get("sprint-pact").unwrap().status,
            ContractStatus::Retired
        );
    }

    #[test]
    fn standing_based_retirement_waits_for_the_standing() {
        let mut registry = ContractRegistry::new();
        registry
            .register(
                Contract::dormant(
                    "recovery-compact",
                    "Recovery Compact",
                    ActivationCondition::OnFirstEvent,
                    vec![],
                )
                .with_retirement(RetirementCondition::OnStanding(StandingState::Reconstituted)),
            )
            .unwrap();
        registry.activate_pending(1, StandingState::Recovery);

        assert!(registry.retire_expired(at(2), StandingState::Recovery).is_empty());
        let retired = registry.retire_expired(at(3), StandingState::Reconstituted);
        assert_eq!(retired.len(), 1);
    }

    #[test]
    fn genesis_accord_never_retires_on_its_own() {
        let mut registry = ContractRegistry::with_genesis();
        registry.activate_pending(1, StandingState::Inducted);
        assert!(registry.retire_expired(at(30), StandingState::Institutional).is_empty());
        assert_eq!(
            registry.get("genesis-accord").unwrap().status,
            ContractStatus::Active
        );
    }

    #[test]
    fn retirement_voids_obligations() {
        let mut registry = ContractRegistry::with_genesis();
        registry.activate_pending(1, StandingState::Inducted);
        assert_eq!(registry.active_obligations().len(), 1);

        registry.retire("genesis-accord").unwrap();
        assert!(registry.active_obligations().is_empty());
    }

    #[test]
    fn dormant_to_retired_is_illegal() {
        let mut registry = ContractRegistry::with_genesis();
        let err = registry.retire("genesis-accord").unwrap_err();
        assert!(matches!(err, ContractError::IllegalTransition { .. }));
    }

    #[test]
    fn retired_contract_cannot_reactivate() {
        let mut registry = ContractRegistry::with_genesis();
        registry.activate_pending(1, StandingState::Inducted);
        registry.retire("genesis-accord").unwrap();

        let err = registry
            .set_status("genesis-accord", ContractStatus::Active)
            .unwrap_err();
        assert!(matches!(err, ContractError::IllegalTransition { .. }));
    }

    #[test]
    fn duplicate_contract_is_rejected() {
        let mut registry = ContractRegistry::with_genesis();
        let err = registry.register(Contract::genesis_accord()).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateContract(_)));
    }
}
