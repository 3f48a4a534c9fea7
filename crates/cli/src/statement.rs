//! `commrecon parse` and `commrecon import`.

use std::io::Write;
use std::path::{Path, PathBuf};

use commrecon_recon::{run_import, CsvDirectory, DirectorySource, ImportBatch, RunStats};
use commrecon_statements::{format_cents, Carrier, CarrierRegistry, ParseOutcome};
use serde::Serialize;

use crate::config::load_config;
use crate::ledger::write_ledger;
use crate::CliError;

fn read_statement(path: &Path) -> Result<String, CliError> {
    let bytes = std::fs::read(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    // OCR exports are not always clean UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_parse_summary(outcome: &ParseOutcome) {
    let s = &outcome.stats;
    eprintln!(
        "{}: {} lines, {} candidates, {} rows, {} dropped",
        outcome.carrier,
        s.lines,
        s.candidates,
        outcome.rows.len(),
        s.total_dropped()
    );
    for (reason, count) in &s.dropped {
        eprintln!("  dropped {reason}: {count}");
    }
}

/// Non-empty input with no rows is a review case, not a success.
fn ensure_rows(outcome: &ParseOutcome) -> Result<(), CliError> {
    if !outcome.needs_review() {
        return Ok(());
    }
    let err = CliError::review(format!("{} statement produced no rows", outcome.carrier));
    if outcome.stats.missing_anchors.is_empty() {
        Err(err.with_hint("every candidate row failed validation; check the drop counts above"))
    } else {
        Err(err.with_hint(format!(
            "header(s) not found: {}; the layout may have changed",
            outcome.stats.missing_anchors.join(", ")
        )))
    }
}

// ============================================================================
// parse
// ============================================================================

pub fn cmd_parse(
    config: Option<PathBuf>,
    carrier: Carrier,
    file: PathBuf,
    json: bool,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    let registry = CarrierRegistry::new(&config.carriers);
    let text = read_statement(&file)?;
    let outcome = registry.parse(carrier, &text);

    let rendered = if json {
        let mut s = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        s.push('\n');
        s.into_bytes()
    } else {
        rows_csv(&outcome)?
    };

    match out {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => std::io::stdout()
            .write_all(&rendered)
            .map_err(|e| CliError::io(format!("cannot write stdout: {e}")))?,
    }

    print_parse_summary(&outcome);
    ensure_rows(&outcome)
}

fn rows_csv(outcome: &ParseOutcome) -> Result<Vec<u8>, CliError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let io_err = |e: csv::Error| CliError::io(format!("CSV write error: {e}"));
    wtr.write_record(["policy_number", "client_name", "gross_amount"]).map_err(io_err)?;
    for row in &outcome.rows {
        wtr.write_record([
            row.policy_number.as_str(),
            row.client_name.as_str(),
            format_cents(row.gross_cents).as_str(),
        ])
        .map_err(io_err)?;
    }
    wtr.into_inner().map_err(|e| CliError::io(format!("CSV write error: {e}")))
}

// ============================================================================
// import
// ============================================================================

pub struct ImportArgs {
    pub config: Option<PathBuf>,
    pub carrier: Carrier,
    pub file: PathBuf,
    pub fortnight: String,
    pub policies: PathBuf,
    pub brokers: PathBuf,
    pub ledger: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct ImportReport<'a> {
    import_id: String,
    carrier: Carrier,
    fortnight_id: &'a str,
    insurer_id: Option<&'a str>,
    dry_run: bool,
    rows: usize,
    stats: RunStats,
}

pub fn cmd_import(args: ImportArgs) -> Result<(), CliError> {
    let config = load_config(args.config)?;
    let registry = CarrierRegistry::new(&config.carriers);
    let text = read_statement(&args.file)?;
    let outcome = registry.parse(args.carrier, &text);
    print_parse_summary(&outcome);
    ensure_rows(&outcome)?;

    let directory = CsvDirectory::new(&args.policies, &args.brokers)
        .load()
        .map_err(CliError::recon)?;

    let batch = ImportBatch::new(args.carrier.as_str(), config.insurer_for(args.carrier), args.fortnight.as_str());
    let ledger = if args.dry_run { None } else { args.ledger.as_deref() };
    let stats = write_ledger(ledger, |sink| run_import(&batch, &outcome, &directory, sink))?;

    if args.json {
        let report = ImportReport {
            import_id: batch.import_id.to_string(),
            carrier: args.carrier,
            fortnight_id: &batch.fortnight_id,
            insurer_id: batch.insurer_id.as_deref(),
            dry_run: args.dry_run,
            rows: outcome.rows.len(),
            stats,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "{}import {}: processed {}, pending {}, excluded {}, errors {}",
        if args.dry_run { "dry-run " } else { "" },
        batch.import_id,
        stats.processed,
        stats.unassigned,
        stats.excluded,
        stats.errors
    );
    Ok(())
}
