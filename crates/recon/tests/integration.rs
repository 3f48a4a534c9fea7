use std::path::PathBuf;

use commrecon_recon::{
    attribute_codes, is_orphan, plan_import, run_code_import, run_import, CsvDirectory, DirectorySource,
    ImportBatch, ImportConfig, LedgerSink, MemoryLedger, PolicyDirectory, ReconError, RunStats, SqliteLedger,
};
use commrecon_statements::{read_manifest_csv, Carrier, CommissionRow, ParseOutcome};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_directory() -> PolicyDirectory {
    let dir = fixtures_dir();
    CsvDirectory::new(dir.join("policies.csv"), dir.join("brokers.csv"))
        .load()
        .unwrap()
}

fn load_config() -> ImportConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("import.toml")).unwrap();
    ImportConfig::from_toml(&toml).unwrap()
}

fn row(policy: &str, name: &str, cents: i64) -> CommissionRow {
    CommissionRow {
        policy_number: policy.into(),
        client_name: name.into(),
        gross_cents: cents,
    }
}

fn outcome(rows: Vec<CommissionRow>) -> ParseOutcome {
    let mut out = ParseOutcome::new(Carrier::Regional, rows.len() * 4);
    for r in rows {
        out.push(r);
    }
    out
}

// -------------------------------------------------------------------------
// Statement imports
// -------------------------------------------------------------------------

#[test]
fn matched_row_becomes_item_and_miss_becomes_pending() {
    let config = load_config();
    let directory = load_directory();
    let batch = ImportBatch::new("regional", config.insurer_for(Carrier::Regional), "2025-11-A");
    let rows = [row("08-123-456", "ANA GOMEZ", 10000), row("99-999-999", "LUIS ROJAS", 2500)];

    let plan = plan_import(&batch, &rows, &directory);

    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].policy_number, "08-123-456");
    assert_eq!(plan.items[0].broker_id, "brk-ana");
    assert_eq!(plan.items[0].insurer_id.as_deref(), Some("ins-regional"));

    assert_eq!(plan.pending.len(), 1);
    assert_eq!(plan.pending[0].policy_number, "99-999-999");
    assert_eq!(plan.pending[0].broker_id, None);
    let json = serde_json::to_value(&plan.pending[0]).unwrap();
    assert!(json["broker_id"].is_null());

    let ana = &plan.totals["brk-ana"];
    assert_eq!((ana.gross_cents, ana.net_cents, ana.item_count), (10000, 7000, 1));
    assert_eq!(plan.totals.len(), 1);
}

#[test]
fn parser_drops_count_as_excluded() {
    let directory = load_directory();
    let batch = ImportBatch::new("regional", None, "2025-11-A");
    let mut parsed = outcome(vec![row("08-123-456", "ANA GOMEZ", 100)]);
    parsed.stats.drop_many(commrecon_statements::DropReason::InvalidName, 2);

    let mut ledger = MemoryLedger::new();
    let stats = run_import(&batch, &parsed, &directory, &mut ledger).unwrap();
    assert_eq!(
        stats,
        RunStats {
            processed: 1,
            excluded: 2,
            unassigned: 0,
            errors: 0
        }
    );
}

#[test]
fn two_batches_sum_into_totals() {
    let directory = load_directory();
    let mut ledger = MemoryLedger::new();

    let first = ImportBatch::new("regional", None, "2025-11-A");
    run_import(&first, &outcome(vec![row("08-123-456", "ANA GOMEZ", 1000)]), &directory, &mut ledger).unwrap();
    let second = ImportBatch::new("regional", None, "2025-11-A");
    run_import(&second, &outcome(vec![row("08-123-456", "ANA GOMEZ", 500)]), &directory, &mut ledger).unwrap();

    let totals = ledger.broker_totals("2025-11-A", "brk-ana").unwrap().unwrap();
    assert_eq!(totals.gross_cents, 1500);
    assert_eq!(totals.net_cents, 1050);
    assert_eq!(totals.item_count, 2);
    assert_ne!(first.import_id, second.import_id);
}

// -------------------------------------------------------------------------
// Code imports
// -------------------------------------------------------------------------

#[test]
fn excluded_and_unmapped_codes() {
    let config = load_config();
    let codes = config.codes.as_ref().unwrap();
    let directory = load_directory();
    let file = std::fs::File::open(fixtures_dir().join("codes_manifest.csv")).unwrap();
    let manifest = read_manifest_csv(file).unwrap();
    assert_eq!(manifest.len(), 2);

    let batch = ImportBatch::new("codes", None, "2025-11-A");
    let plan = attribute_codes(&batch, &manifest, codes, &directory);

    assert_eq!(plan.items.iter().filter(|i| !is_orphan(i)).count(), 0);
    let fallback: Vec<_> = plan.items.iter().filter(|i| is_orphan(i)).collect();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].broker_id, "brk-house");
    assert_eq!(fallback[0].policy_number, "X1");
    assert_eq!(fallback[0].gross_cents, 5000);
    assert_eq!(fallback[0].insurer_id.as_deref(), Some("ins-assa"));
    assert_eq!(
        plan.stats,
        RunStats {
            processed: 1,
            excluded: 1,
            unassigned: 1,
            errors: 0
        }
    );
    assert_eq!(plan.totals["brk-house"].gross_cents, 5000);
}

// -------------------------------------------------------------------------
// SQLite
// -------------------------------------------------------------------------

#[test]
fn sqlite_ledger_accumulates_across_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("ledger.sqlite");
    let directory = load_directory();
    let config = load_config();

    {
        let mut ledger = SqliteLedger::open(&path).unwrap();
        ledger.begin().unwrap();
        let batch = ImportBatch::new("regional", None, "2025-11-A");
        let rows = outcome(vec![row("08-123-456", "ANA GOMEZ", 2000), row("77-1", "NADIE", 300)]);
        run_import(&batch, &rows, &directory, &mut ledger).unwrap();
        ledger.commit().unwrap();
    }
    {
        let mut ledger = SqliteLedger::open(&path).unwrap();
        let manifest = [commrecon_statements::CodeAmount {
            code: "PJ750-54".into(),
            amount_cents: 4000,
        }];
        let batch = ImportBatch::new("codes", None, "2025-11-A");
        let stats = run_code_import(&batch, &manifest, config.codes.as_ref().unwrap(), &directory, &mut ledger)
            .unwrap();
        assert_eq!(stats.unassigned, 0);
    }

    let ledger = SqliteLedger::open(&path).unwrap();
    assert_eq!(ledger.counts().unwrap(), (2, 2, 1));
    let all = ledger.fortnight_totals("2025-11-A").unwrap();
    let ids: Vec<_> = all.iter().map(|t| t.broker_id.as_str()).collect();
    assert_eq!(ids, ["brk-ana", "brk-luis"]);
    assert_eq!(all[0].net_cents, 1400);
    assert_eq!(all[1].net_cents, 4000);
}

#[test]
fn missing_directory_file_aborts() {
    let dir = fixtures_dir();
    let source = CsvDirectory::new(dir.join("nope.csv"), dir.join("brokers.csv"));
    match source.load() {
        Err(ReconError::DirectoryUnavailable(msg)) => assert!(msg.contains("nope.csv")),
        other => panic!("expected DirectoryUnavailable, got {other:?}"),
    }
}
