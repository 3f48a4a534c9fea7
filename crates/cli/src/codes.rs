//! `commrecon codes`: bulk code manifest import.

use std::path::PathBuf;

use commrecon_recon::{run_code_import, CodeImportConfig, CsvDirectory, DirectorySource, ImportBatch};
use commrecon_statements::{read_manifest_csv, ManifestError};

use crate::config::load_config;
use crate::ledger::write_ledger;
use crate::CliError;

/// Batch label for code imports.
const CODES_LABEL: &str = "codes";

pub struct CodesArgs {
    pub config: Option<PathBuf>,
    pub manifest: PathBuf,
    pub fortnight: String,
    pub policies: PathBuf,
    pub brokers: PathBuf,
    pub ledger: Option<PathBuf>,
    pub fallback_broker: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

pub fn cmd_codes(args: CodesArgs) -> Result<(), CliError> {
    let config = load_config(args.config)?;
    let codes = match (config.codes, args.fallback_broker) {
        (Some(mut codes), Some(fallback)) => {
            codes.fallback_broker_id = fallback;
            codes
        }
        (Some(codes), None) => codes,
        (None, Some(fallback)) => CodeImportConfig::new(fallback),
        (None, None) => {
            return Err(CliError::args("no fallback broker for unmapped codes")
                .with_hint("pass --fallback-broker or add a [codes] section to the config"))
        }
    };
    if codes.fallback_broker_id.trim().is_empty() {
        return Err(CliError::args("--fallback-broker must not be empty"));
    }

    let file = std::fs::File::open(&args.manifest)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", args.manifest.display())))?;
    let manifest = read_manifest_csv(file).map_err(|e| match e {
        ManifestError::Csv(_) => CliError::io(e.to_string()),
        ManifestError::MissingColumns { .. } => CliError::parse(e.to_string())
            .with_hint("the manifest needs a code column (LICENCIA/CODIGO) and a commission column"),
    })?;

    let directory = CsvDirectory::new(&args.policies, &args.brokers)
        .load()
        .map_err(CliError::recon)?;

    let batch = ImportBatch::new(CODES_LABEL, codes.insurer_id.clone(), args.fortnight.as_str());
    let ledger = if args.dry_run { None } else { args.ledger.as_deref() };
    let stats = write_ledger(ledger, |sink| run_code_import(&batch, &manifest, &codes, &directory, sink))?;

    if args.json {
        let report = serde_json::json!({
            "import_id": batch.import_id.to_string(),
            "fortnight_id": batch.fortnight_id,
            "dry_run": args.dry_run,
            "manifest_lines": manifest.len(),
            "stats": stats,
        });
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "{}codes {}: {} line(s), processed {}, excluded {}, unassigned {} (to {})",
        if args.dry_run { "dry-run " } else { "" },
        batch.import_id,
        manifest.len(),
        stats.processed,
        stats.excluded,
        stats.unassigned,
        codes.fallback_broker_id
    );
    Ok(())
}
