//! SQLite ledger.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ReconError;
use crate::model::{BrokerTotals, CommissionItem, ImportBatch, PendingItem};
use crate::sink::LedgerSink;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS comm_imports (
    import_id TEXT PRIMARY KEY,
    carrier TEXT NOT NULL,
    insurer_id TEXT,
    fortnight_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comm_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    import_id TEXT NOT NULL REFERENCES comm_imports(import_id),
    broker_id TEXT NOT NULL,
    insurer_id TEXT,
    policy_number TEXT NOT NULL,
    insured_name TEXT NOT NULL,
    gross_cents INTEGER NOT NULL,
    raw_metadata TEXT NOT NULL     -- JSON
);

CREATE TABLE IF NOT EXISTS pending_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    import_id TEXT NOT NULL REFERENCES comm_imports(import_id),
    broker_id TEXT,                -- NULL until assigned
    insurer_id TEXT,
    policy_number TEXT NOT NULL,
    insured_name TEXT NOT NULL,
    gross_cents INTEGER NOT NULL,
    raw_metadata TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fortnight_broker_totals (
    fortnight_id TEXT NOT NULL,
    broker_id TEXT NOT NULL,
    gross_cents INTEGER NOT NULL DEFAULT 0,
    net_cents INTEGER NOT NULL DEFAULT 0,
    item_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (fortnight_id, broker_id)
);

CREATE INDEX IF NOT EXISTS idx_comm_items_import ON comm_items(import_id);
CREATE INDEX IF NOT EXISTS idx_pending_items_import ON pending_items(import_id);
"#;

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (or create) a ledger file and apply the schema.
    pub fn open(path: &Path) -> Result<Self, ReconError> {
        let conn = Connection::open(path)
            .map_err(|e| ReconError::Ledger(format!("{}: {e}", path.display())))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, ReconError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ReconError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn begin(&self) -> Result<(), ReconError> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    pub fn commit(&self) -> Result<(), ReconError> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<(), ReconError> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    fn count(&self, table: &str) -> Result<usize, ReconError> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Row counts of `(comm_imports, comm_items, pending_items)`.
    pub fn counts(&self) -> Result<(usize, usize, usize), ReconError> {
        Ok((
            self.count("comm_imports")?,
            self.count("comm_items")?,
            self.count("pending_items")?,
        ))
    }
}

fn totals_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BrokerTotals> {
    Ok(BrokerTotals {
        fortnight_id: row.get(0)?,
        broker_id: row.get(1)?,
        gross_cents: row.get(2)?,
        net_cents: row.get(3)?,
        item_count: row.get(4)?,
    })
}

impl LedgerSink for SqliteLedger {
    fn record_import(&mut self, batch: &ImportBatch) -> Result<(), ReconError> {
        self.conn.execute(
            "INSERT INTO comm_imports (import_id, carrier, insurer_id, fortnight_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                batch.import_id.to_string(),
                batch.carrier,
                batch.insurer_id,
                batch.fortnight_id,
                batch.created_at,
            ],
        )?;
        Ok(())
    }

    fn insert_items(&mut self, items: &[CommissionItem]) -> Result<(), ReconError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO comm_items
             (import_id, broker_id, insurer_id, policy_number, insured_name, gross_cents, raw_metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for item in items {
            stmt.execute(params![
                item.import_id.to_string(),
                item.broker_id,
                item.insurer_id,
                item.policy_number,
                item.insured_name,
                item.gross_cents,
                item.raw_metadata.to_string(),
            ])?;
        }
        Ok(())
    }

    fn insert_pending(&mut self, items: &[PendingItem]) -> Result<(), ReconError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO pending_items
             (import_id, broker_id, insurer_id, policy_number, insured_name, gross_cents, raw_metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for item in items {
            stmt.execute(params![
                item.import_id.to_string(),
                item.broker_id,
                item.insurer_id,
                item.policy_number,
                item.insured_name,
                item.gross_cents,
                item.raw_metadata.to_string(),
            ])?;
        }
        Ok(())
    }

    fn add_broker_totals(&mut self, totals: &BrokerTotals) -> Result<(), ReconError> {
        self.conn.execute(
            "INSERT INTO fortnight_broker_totals
             (fortnight_id, broker_id, gross_cents, net_cents, item_count)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (fortnight_id, broker_id) DO UPDATE SET
                 gross_cents = gross_cents + excluded.gross_cents,
                 net_cents = net_cents + excluded.net_cents,
                 item_count = item_count + excluded.item_count",
            params![
                totals.fortnight_id,
                totals.broker_id,
                totals.gross_cents,
                totals.net_cents,
                totals.item_count,
            ],
        )?;
        Ok(())
    }

    fn broker_totals(&self, fortnight_id: &str, broker_id: &str) -> Result<Option<BrokerTotals>, ReconError> {
        Ok(self
            .conn
            .query_row(
                "SELECT fortnight_id, broker_id, gross_cents, net_cents, item_count
                 FROM fortnight_broker_totals WHERE fortnight_id = ?1 AND broker_id = ?2",
                params![fortnight_id, broker_id],
                totals_from_row,
            )
            .optional()?)
    }

    fn fortnight_totals(&self, fortnight_id: &str) -> Result<Vec<BrokerTotals>, ReconError> {
        let mut stmt = self.conn.prepare(
            "SELECT fortnight_id, broker_id, gross_cents, net_cents, item_count
             FROM fortnight_broker_totals WHERE fortnight_id = ?1 ORDER BY broker_id",
        )?;
        let rows = stmt.query_map(params![fortnight_id], totals_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
