//! Bulk code import: a manifest of `{code, amount}` pairs attributed to
//! brokers through their registered codes.

use commrecon_statements::CodeAmount;
use serde_json::json;

use crate::config::CodeImportConfig;
use crate::directory::PolicyDirectory;
use crate::error::ReconError;
use crate::model::{CommissionItem, ImportBatch, RunStats};
use crate::pipeline::{commit_plan, ImportPlan};
use crate::sink::LedgerSink;

/// Code imports produce the same write set as statement imports; they never
/// leave pending items.
pub type CodeImportPlan = ImportPlan;

/// Attribute every manifest line. Registered codes go to their broker at
/// 100%; unmapped codes go to the fallback broker, flagged as orphans.
pub fn attribute_codes(
    batch: &ImportBatch,
    manifest: &[CodeAmount],
    config: &CodeImportConfig,
    directory: &PolicyDirectory,
) -> CodeImportPlan {
    let mut plan = ImportPlan::new(batch.clone());
    let insurer_id = config.insurer_id.clone().or_else(|| batch.insurer_id.clone());

    for line in manifest {
        let code = line.code.trim().to_uppercase();
        if config.is_excluded(&code) {
            log::info!("code {code}: excluded, {} not attributed", line.amount_cents);
            plan.stats.excluded += 1;
            continue;
        }
        if !config.has_valid_shape(&code) {
            log::warn!("code {code}: does not match the required prefix, skipped");
            plan.stats.excluded += 1;
            continue;
        }

        let (broker_id, is_orphan) = match directory.broker_for_code(&code) {
            Some(broker) => (broker.broker_id.clone(), false),
            None => {
                log::debug!("code {code}: no registered broker, routed to {}", config.fallback_broker_id);
                plan.stats.unassigned += 1;
                (config.fallback_broker_id.clone(), true)
            }
        };

        plan.accumulate(&broker_id, line.amount_cents, 1.0);
        plan.items.push(CommissionItem {
            import_id: batch.import_id,
            broker_id,
            insurer_id: insurer_id.clone(),
            policy_number: code.clone(),
            insured_name: format!("Code {code}"),
            gross_cents: line.amount_cents,
            raw_metadata: json!({
                "source": "code_manifest",
                "code": code,
                "is_orphan": is_orphan,
            }),
        });
    }

    plan.stats.processed = plan.items.len();
    plan
}

/// Attribute and commit a code manifest.
pub fn run_code_import(
    batch: &ImportBatch,
    manifest: &[CodeAmount],
    config: &CodeImportConfig,
    directory: &PolicyDirectory,
    sink: &mut dyn LedgerSink,
) -> Result<RunStats, ReconError> {
    let plan = attribute_codes(batch, manifest, config, directory);
    commit_plan(&plan, sink)
}

/// Whether an item was routed to the fallback broker.
pub fn is_orphan(item: &CommissionItem) -> bool {
    item.raw_metadata
        .get("is_orphan")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}
