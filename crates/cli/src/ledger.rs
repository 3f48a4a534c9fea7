//! Ledger access shared by the import commands, and `commrecon totals`.

use std::path::{Path, PathBuf};

use commrecon_recon::{LedgerSink, MemoryLedger, ReconError, RunStats, SqliteLedger};
use commrecon_statements::format_cents;

use crate::CliError;

/// Run `write` against the ledger at `path` inside one transaction, or
/// against a throwaway in-memory ledger when `path` is `None`.
pub fn write_ledger<F>(path: Option<&Path>, write: F) -> Result<RunStats, CliError>
where
    F: FnOnce(&mut dyn LedgerSink) -> Result<RunStats, ReconError>,
{
    let Some(path) = path else {
        return write(&mut MemoryLedger::new()).map_err(CliError::recon);
    };

    let mut ledger = SqliteLedger::open(path).map_err(CliError::recon)?;
    ledger.begin().map_err(CliError::recon)?;
    match write(&mut ledger) {
        Ok(stats) => {
            ledger.commit().map_err(CliError::recon)?;
            Ok(stats)
        }
        Err(e) => {
            if let Err(rb) = ledger.rollback() {
                log::error!("rollback failed: {rb}");
            }
            Err(CliError::recon(e).with_hint("nothing was written; the import was rolled back"))
        }
    }
}

pub fn cmd_totals(ledger_path: PathBuf, fortnight: String, json: bool) -> Result<(), CliError> {
    if !ledger_path.is_file() {
        return Err(CliError::io(format!("ledger not found: {}", ledger_path.display())));
    }
    let ledger = SqliteLedger::open(&ledger_path).map_err(CliError::recon)?;
    let totals = ledger.fortnight_totals(&fortnight).map_err(CliError::recon)?;

    if json {
        let json_str = serde_json::to_string_pretty(&totals)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    if totals.is_empty() {
        eprintln!("no totals for fortnight {fortnight}");
        return Ok(());
    }

    println!("{:<20} {:>14} {:>14} {:>7}", "broker_id", "gross", "net", "items");
    for t in &totals {
        println!(
            "{:<20} {:>14} {:>14} {:>7}",
            t.broker_id,
            format_cents(t.gross_cents),
            format_cents(t.net_cents),
            t.item_count
        );
    }
    let gross: i64 = totals.iter().map(|t| t.gross_cents).sum();
    let net: i64 = totals.iter().map(|t| t.net_cents).sum();
    eprintln!(
        "fortnight {fortnight}: {} broker(s), gross {}, net {}",
        totals.len(),
        format_cents(gross),
        format_cents(net)
    );
    Ok(())
}
