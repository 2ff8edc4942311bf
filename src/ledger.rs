use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::error::InvariantViolation;
use crate::resource::{ResourceKind, ResourceMap};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("insufficient {kind}: need {needed:.2}, have {available:.2}")]
    Insufficient {
        kind: ResourceKind,
        needed: f64,
        available: f64,
    },
}

/// Settlement accounts: everything ever mined, what is left to spend, and
/// the pollution the mining caused.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ledger {
    mined: ResourceMap<f64>,
    available: ResourceMap<f64>,
    pollution: f64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mined(&self, kind: ResourceKind) -> f64 {
        self.mined[kind]
    }

    pub fn available(&self, kind: ResourceKind) -> f64 {
        self.available[kind]
    }

    pub fn mined_totals(&self) -> &ResourceMap<f64> {
        &self.mined
    }

    pub fn available_totals(&self) -> &ResourceMap<f64> {
        &self.available
    }

    pub fn pollution(&self) -> f64 {
        self.pollution
    }

    /// Books freshly extracted resources into both the mined total and the
    /// spendable amount.
    pub fn record_extraction(&mut self, kind: ResourceKind, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.mined[kind] += amount;
        self.available[kind] += amount;
        self.pollution += amount * kind.pollution_coefficient();
    }

    pub fn can_afford(&self, costs: &BTreeMap<ResourceKind, f64>) -> bool {
        covers(&self.available, costs)
    }

    /// Debits every cost entry, or nothing at all when any entry is short.
    pub fn spend(&mut self, costs: &BTreeMap<ResourceKind, f64>) -> Result<(), LedgerError> {
        for (&kind, &needed) in costs {
            if self.available[kind] < needed {
                return Err(LedgerError::Insufficient {
                    kind,
                    needed,
                    available: self.available[kind],
                });
            }
        }
        for (&kind, &needed) in costs {
            self.available[kind] = (self.available[kind] - needed).max(0.0);
        }
        Ok(())
    }

    pub fn verify(&self) -> Result<(), InvariantViolation> {
        for (kind, &amount) in self.available.iter().chain(self.mined.iter()) {
            if amount < 0.0 {
                return Err(InvariantViolation::NegativeLedger { kind, amount });
            }
        }
        Ok(())
    }
}

/// True when `totals` holds at least the listed amount of every kind.
pub fn covers(totals: &ResourceMap<f64>, costs: &BTreeMap<ResourceKind, f64>) -> bool {
    costs.iter().all(|(&kind, &needed)| totals[kind] >= needed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(entries: &[(ResourceKind, f64)]) -> BTreeMap<ResourceKind, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn extraction_feeds_both_totals_and_pollution() {
        let mut ledger = Ledger::new();
        ledger.record_extraction(ResourceKind::Oil, 4.0);
        ledger.record_extraction(ResourceKind::Wood, 10.0);
        assert_eq!(ledger.mined(ResourceKind::Oil), 4.0);
        assert_eq!(ledger.available(ResourceKind::Oil), 4.0);
        assert!((ledger.pollution() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn spend_debits_only_when_everything_is_covered() {
        let mut ledger = Ledger::new();
        ledger.record_extraction(ResourceKind::Wood, 10.0);
        ledger.record_extraction(ResourceKind::Ore, 1.0);

        let err = ledger
            .spend(&costs(&[(ResourceKind::Wood, 5.0), (ResourceKind::Ore, 2.0)]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Insufficient { kind: ResourceKind::Ore, .. }));
        assert_eq!(ledger.available(ResourceKind::Wood), 10.0);

        ledger.spend(&costs(&[(ResourceKind::Wood, 5.0)])).unwrap();
        assert_eq!(ledger.available(ResourceKind::Wood), 5.0);
        assert_eq!(ledger.mined(ResourceKind::Wood), 10.0);
        ledger.verify().unwrap();
    }

    #[test]
    fn empty_cost_is_always_affordable() {
        let ledger = Ledger::new();
        assert!(ledger.can_afford(&BTreeMap::new()));
    }
}
