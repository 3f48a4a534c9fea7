//! Reconciliation: resolve parsed rows against the directory, then write.

use std::collections::BTreeMap;

use commrecon_statements::{CommissionRow, ParseOutcome};
use serde::Serialize;
use serde_json::json;

use crate::directory::PolicyDirectory;
use crate::error::ReconError;
use crate::model::{BrokerTotals, CommissionItem, ImportBatch, PendingItem, RunStats};
use crate::sink::LedgerSink;

/// Everything a run will write, computed without touching the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    pub batch: ImportBatch,
    pub items: Vec<CommissionItem>,
    pub pending: Vec<PendingItem>,
    /// Totals for this batch only, keyed by broker id.
    pub totals: BTreeMap<String, BrokerTotals>,
    pub stats: RunStats,
}

impl ImportPlan {
    pub fn new(batch: ImportBatch) -> Self {
        Self {
            batch,
            items: Vec::new(),
            pending: Vec::new(),
            totals: BTreeMap::new(),
            stats: RunStats::default(),
        }
    }

    /// Add one item's gross to its broker, netting at `percent`.
    pub(crate) fn accumulate(&mut self, broker_id: &str, gross_cents: i64, percent: f64) {
        let fortnight_id = &self.batch.fortnight_id;
        let totals = self
            .totals
            .entry(broker_id.to_string())
            .or_insert_with(|| BrokerTotals::empty(fortnight_id, broker_id));
        totals.gross_cents += gross_cents;
        totals.net_cents += net_cents(gross_cents, percent);
        totals.item_count += 1;
    }
}

/// Broker share of a gross amount, rounded half away from zero.
pub fn net_cents(gross_cents: i64, percent: f64) -> i64 {
    (gross_cents as f64 * percent).round() as i64
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Resolve rows by exact policy number. Matches become items for the
/// directory's broker; misses become pending items with no broker.
pub fn plan_import(batch: &ImportBatch, rows: &[CommissionRow], directory: &PolicyDirectory) -> ImportPlan {
    let mut plan = ImportPlan::new(batch.clone());

    for row in rows {
        if row.policy_number.is_empty() || row.gross_cents <= 0 {
            log::warn!(
                "[{}] skipping malformed row: policy {:?}, gross {}",
                batch.carrier,
                row.policy_number,
                row.gross_cents
            );
            plan.stats.errors += 1;
            continue;
        }

        let metadata = json!({
            "carrier": batch.carrier,
            "client_name": row.client_name,
        });

        // An entry with no broker cannot be attributed; it waits for review.
        let entry = directory
            .lookup(&row.policy_number)
            .filter(|e| !e.broker_id.trim().is_empty());
        match entry {
            Some(entry) => {
                let percent = directory.percent_for(&entry.broker_id);
                plan.accumulate(&entry.broker_id, row.gross_cents, percent);
                plan.items.push(CommissionItem {
                    import_id: batch.import_id,
                    broker_id: entry.broker_id.clone(),
                    insurer_id: Some(entry.insurer_id.clone()).filter(|s| !s.is_empty()),
                    policy_number: row.policy_number.clone(),
                    insured_name: row.client_name.clone(),
                    gross_cents: row.gross_cents,
                    raw_metadata: metadata,
                });
            }
            None => {
                log::debug!("[{}] policy {} not in directory", batch.carrier, row.policy_number);
                plan.stats.unassigned += 1;
                plan.pending.push(PendingItem {
                    import_id: batch.import_id,
                    broker_id: None,
                    insurer_id: batch.insurer_id.clone(),
                    policy_number: row.policy_number.clone(),
                    insured_name: row.client_name.clone(),
                    gross_cents: row.gross_cents,
                    raw_metadata: metadata,
                });
            }
        }
    }

    plan.stats.processed = plan.items.len() + plan.pending.len();
    plan
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Write a plan: import record, items, pending items, then additive totals.
///
/// Not idempotent. Callers wanting all-or-nothing wrap this in a transaction.
pub fn commit_plan(plan: &ImportPlan, sink: &mut dyn LedgerSink) -> Result<RunStats, ReconError> {
    sink.record_import(&plan.batch)?;
    sink.insert_items(&plan.items)?;
    sink.insert_pending(&plan.pending)?;
    for totals in plan.totals.values() {
        sink.add_broker_totals(totals)?;
    }

    let s = plan.stats;
    log::info!(
        "import {} ({}): processed={} excluded={} unassigned={} errors={}",
        plan.batch.import_id,
        plan.batch.carrier,
        s.processed,
        s.excluded,
        s.unassigned,
        s.errors
    );
    Ok(s)
}

/// Plan and commit a parsed statement. Parser drops count as excluded.
pub fn run_import(
    batch: &ImportBatch,
    outcome: &ParseOutcome,
    directory: &PolicyDirectory,
    sink: &mut dyn LedgerSink,
) -> Result<RunStats, ReconError> {
    let mut plan = plan_import(batch, &outcome.rows, directory);
    plan.stats.excluded += outcome.stats.total_dropped();
    commit_plan(&plan, sink)
}
