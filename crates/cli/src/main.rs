// commrecon CLI - commission statement parsing and ledger import

mod codes;
mod config;
mod exit_codes;
mod ledger;
mod statement;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commrecon_recon::ReconError;
use commrecon_statements::Carrier;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_PARSE, EXIT_PARSE_EMPTY, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "commrecon")]
#[command(about = "Parse insurance commission statements and reconcile them into the broker ledger")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Import config (TOML). Defaults to <config dir>/commrecon/config.toml when present
    #[arg(long, global = true, env = "COMMRECON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement's extracted text into commission rows
    #[command(after_help = "\
Examples:
  commrecon parse --carrier mb --file mb-2025-11.txt
  commrecon parse --carrier optima --file optima.txt --json
  commrecon parse --carrier regional --file regional.txt --out rows.csv")]
    Parse {
        /// Carrier format: optima, mb, aliado, regional, banesco, mercantil, ifs, vumi, palig, assistcard
        #[arg(long)]
        carrier: Carrier,

        /// Extracted statement text
        #[arg(long)]
        file: PathBuf,

        /// Print rows and stats as JSON instead of CSV
        #[arg(long)]
        json: bool,

        /// Write output to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Parse a statement, reconcile it against the directory and write the ledger
    #[command(after_help = "\
Examples:
  commrecon import --carrier mb --file mb.txt --fortnight 2025-11-A \\
      --policies policies.csv --brokers brokers.csv --ledger ledger.sqlite
  commrecon import --carrier regional --file regional.txt --fortnight 2025-11-B \\
      --policies policies.csv --brokers brokers.csv --dry-run --json")]
    Import {
        #[arg(long)]
        carrier: Carrier,

        #[arg(long)]
        file: PathBuf,

        /// Fortnight the commissions are booked to
        #[arg(long)]
        fortnight: String,

        /// Directory export: policy_number,broker_id,insurer_id
        #[arg(long)]
        policies: PathBuf,

        /// Directory export: broker_id,name,percent_default[,code]
        #[arg(long)]
        brokers: PathBuf,

        /// SQLite ledger file (created if missing)
        #[arg(long, required_unless_present = "dry_run")]
        ledger: Option<PathBuf>,

        /// Reconcile without writing the ledger
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },

    /// Import a bulk code manifest (code, amount) into the ledger
    #[command(after_help = "\
Examples:
  commrecon codes --manifest honorarios.csv --fortnight 2025-11-A \\
      --policies policies.csv --brokers brokers.csv --ledger ledger.sqlite
  commrecon codes --manifest honorarios.csv --fortnight 2025-11-A \\
      --policies policies.csv --brokers brokers.csv --fallback-broker brk-house --dry-run")]
    Codes {
        /// Manifest CSV with a code column and a commission column
        #[arg(long)]
        manifest: PathBuf,

        #[arg(long)]
        fortnight: String,

        #[arg(long)]
        policies: PathBuf,

        #[arg(long)]
        brokers: PathBuf,

        #[arg(long, required_unless_present = "dry_run")]
        ledger: Option<PathBuf>,

        /// Broker receiving unmapped codes (overrides [codes].fallback_broker_id)
        #[arg(long)]
        fallback_broker: Option<String>,

        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show stored broker totals for a fortnight
    #[command(after_help = "\
Examples:
  commrecon totals --ledger ledger.sqlite --fortnight 2025-11-A
  commrecon totals --ledger ledger.sqlite --fortnight 2025-11-A --json")]
    Totals {
        #[arg(long)]
        ledger: PathBuf,

        #[arg(long)]
        fortnight: String,

        #[arg(long)]
        json: bool,
    },

    /// Config file utilities
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("COMMRECON_REVISION"), ")",
        "\ntarget:  ", env!("COMMRECON_BUILD_TARGET"),
    )
}

/// Log records from the libraries go to stderr; `RUST_LOG` sets the level.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Parse { carrier, file, json, out } => {
            statement::cmd_parse(cli.config, carrier, file, json, out)
        }
        Commands::Import {
            carrier,
            file,
            fortnight,
            policies,
            brokers,
            ledger,
            dry_run,
            json,
        } => statement::cmd_import(statement::ImportArgs {
            config: cli.config,
            carrier,
            file,
            fortnight,
            policies,
            brokers,
            ledger,
            dry_run,
            json,
        }),
        Commands::Codes {
            manifest,
            fortnight,
            policies,
            brokers,
            ledger,
            fallback_broker,
            dry_run,
            json,
        } => codes::cmd_codes(codes::CodesArgs {
            config: cli.config,
            manifest,
            fortnight,
            policies,
            brokers,
            ledger,
            fallback_broker,
            dry_run,
            json,
        }),
        Commands::Totals { ledger, fortnight, json } => ledger::cmd_totals(ledger, fortnight, json),
        Commands::Config { command } => config::cmd_config(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Statement produced no rows and should be reviewed by hand.
    pub fn review(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE_EMPTY, message: msg.into(), hint: None }
    }

    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("directory CSVs need a header row with the listed column names".to_string())
            }
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("check the file with: commrecon config validate <file>".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
