//! Ledger writes.

use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::{BrokerTotals, CommissionItem, ImportBatch, PendingItem};

/// Where an import run lands.
///
/// `add_broker_totals` adds to whatever is already stored for the
/// `(fortnight_id, broker_id)` pair. Writing the same batch twice counts it
/// twice.
pub trait LedgerSink {
    fn record_import(&mut self, batch: &ImportBatch) -> Result<(), ReconError>;
    fn insert_items(&mut self, items: &[CommissionItem]) -> Result<(), ReconError>;
    fn insert_pending(&mut self, items: &[PendingItem]) -> Result<(), ReconError>;
    fn add_broker_totals(&mut self, totals: &BrokerTotals) -> Result<(), ReconError>;
    fn broker_totals(&self, fortnight_id: &str, broker_id: &str) -> Result<Option<BrokerTotals>, ReconError>;
    /// All stored totals for a fortnight, ordered by broker id.
    fn fortnight_totals(&self, fortnight_id: &str) -> Result<Vec<BrokerTotals>, ReconError>;
}

/// In-process ledger for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    pub imports: Vec<ImportBatch>,
    pub items: Vec<CommissionItem>,
    pub pending: Vec<PendingItem>,
    pub totals: BTreeMap<(String, String), BrokerTotals>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerSink for MemoryLedger {
    fn record_import(&mut self, batch: &ImportBatch) -> Result<(), ReconError> {
        self.imports.push(batch.clone());
        Ok(())
    }

    fn insert_items(&mut self, items: &[CommissionItem]) -> Result<(), ReconError> {
        self.items.extend_from_slice(items);
        Ok(())
    }

    fn insert_pending(&mut self, items: &[PendingItem]) -> Result<(), ReconError> {
        self.pending.extend_from_slice(items);
        Ok(())
    }

    fn add_broker_totals(&mut self, totals: &BrokerTotals) -> Result<(), ReconError> {
        self.totals
            .entry((totals.fortnight_id.clone(), totals.broker_id.clone()))
            .or_insert_with(|| BrokerTotals::empty(&totals.fortnight_id, &totals.broker_id))
            .add(totals);
        Ok(())
    }

    fn broker_totals(&self, fortnight_id: &str, broker_id: &str) -> Result<Option<BrokerTotals>, ReconError> {
        Ok(self
            .totals
            .get(&(fortnight_id.to_string(), broker_id.to_string()))
            .cloned())
    }

    fn fortnight_totals(&self, fortnight_id: &str) -> Result<Vec<BrokerTotals>, ReconError> {
        Ok(self
            .totals
            .values()
            .filter(|t| t.fortnight_id == fortnight_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(broker: &str, gross: i64, net: i64, count: i64) -> BrokerTotals {
        BrokerTotals {
            fortnight_id: "2025-11-A".into(),
            broker_id: broker.into(),
            gross_cents: gross,
            net_cents: net,
            item_count: count,
        }
    }

    #[test]
    fn totals_are_additive() {
        let mut ledger = MemoryLedger::new();
        ledger.add_broker_totals(&totals("b1", 100, 70, 1)).unwrap();
        ledger.add_broker_totals(&totals("b1", 50, 35, 2)).unwrap();
        ledger.add_broker_totals(&totals("b0", 5, 5, 1)).unwrap();

        assert_eq!(ledger.broker_totals("2025-11-A", "b1").unwrap(), Some(totals("b1", 150, 105, 3)));
        assert_eq!(ledger.broker_totals("2025-11-B", "b1").unwrap(), None);
        let all = ledger.fortnight_totals("2025-11-A").unwrap();
        assert_eq!(all.iter().map(|t| t.broker_id.as_str()).collect::<Vec<_>>(), ["b0", "b1"]);
    }
}
