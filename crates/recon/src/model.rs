use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Authoritative owner of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDirectoryEntry {
    pub policy_number: String,
    pub broker_id: String,
    pub insurer_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Broker {
    pub broker_id: String,
    pub name: String,
    /// Share of gross paid to the broker (1.0 = 100%).
    pub percent_default: f64,
    /// Registered bulk-manifest code.
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBatch {
    pub import_id: Uuid,
    pub carrier: String,
    pub insurer_id: Option<String>,
    pub fortnight_id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl ImportBatch {
    pub fn new(carrier: impl Into<String>, insurer_id: Option<String>, fortnight_id: impl Into<String>) -> Self {
        Self {
            import_id: Uuid::new_v4(),
            carrier: carrier.into(),
            insurer_id,
            fortnight_id: fortnight_id.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// A row attributed to a broker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommissionItem {
    pub import_id: Uuid,
    pub broker_id: String,
    pub insurer_id: Option<String>,
    pub policy_number: String,
    pub insured_name: String,
    pub gross_cents: i64,
    pub raw_metadata: serde_json::Value,
}

/// A row whose policy is not in the directory. `broker_id` is always `None`
/// until someone assigns it downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingItem {
    pub import_id: Uuid,
    pub broker_id: Option<String>,
    pub insurer_id: Option<String>,
    pub policy_number: String,
    pub insured_name: String,
    pub gross_cents: i64,
    pub raw_metadata: serde_json::Value,
}

/// Per-fortnight, per-broker running totals. Writes add to what is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerTotals {
    pub fortnight_id: String,
    pub broker_id: String,
    pub gross_cents: i64,
    pub net_cents: i64,
    pub item_count: i64,
}

impl BrokerTotals {
    pub fn empty(fortnight_id: &str, broker_id: &str) -> Self {
        Self {
            fortnight_id: fortnight_id.to_string(),
            broker_id: broker_id.to_string(),
            gross_cents: 0,
            net_cents: 0,
            item_count: 0,
        }
    }

    pub fn add(&mut self, other: &BrokerTotals) {
        self.gross_cents += other.gross_cents;
        self.net_cents += other.net_cents;
        self.item_count += other.item_count;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Items written to the ledger, pending and fallback included.
    pub processed: usize,
    /// Rows kept out of the ledger by policy.
    pub excluded: usize,
    /// Written items without a registered broker.
    pub unassigned: usize,
    /// Row-level failures found while reconciling.
    pub errors: usize,
}
