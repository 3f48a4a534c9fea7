//! Commission reconciliation.
//!
//! Parsed statement rows are resolved against a policy/broker directory and
//! written to a ledger: matched rows as commission items, unmatched rows as
//! pending items, and per-broker fortnight totals that accumulate across
//! imports. Bulk code manifests follow the same path through
//! [`codes::attribute_codes`].

pub mod codes;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod sink;
pub mod sqlite;

pub use codes::{attribute_codes, is_orphan, run_code_import, CodeImportPlan};
pub use config::{CodeImportConfig, ImportConfig};
pub use directory::{load_directory_csv, CsvDirectory, DirectorySource, PolicyDirectory};
pub use error::ReconError;
pub use model::{Broker, BrokerTotals, CommissionItem, ImportBatch, PendingItem, PolicyDirectoryEntry, RunStats};
pub use pipeline::{commit_plan, net_cents, plan_import, run_import, ImportPlan};
pub use sink::{LedgerSink, MemoryLedger};
pub use sqlite::SqliteLedger;
