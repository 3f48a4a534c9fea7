use std::collections::BTreeMap;

use serde::Serialize;

use crate::carrier::Carrier;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One canonical commission row recovered from a statement.
///
/// Parsers only emit rows that passed validation: a non-empty policy number in
/// the carrier's canonical shape, a client name of at least three characters
/// that is not a report annotation, and a positive amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionRow {
    pub policy_number: String,
    pub client_name: String,
    pub gross_cents: i64,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Why a candidate row was not emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    EmptyPolicy,
    ShortPolicy,
    InvalidName,
    NonPositiveAmount,
    ExcludedKind,
    Unreconstructable,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPolicy => write!(f, "empty_policy"),
            Self::ShortPolicy => write!(f, "short_policy"),
            Self::InvalidName => write!(f, "invalid_name"),
            Self::NonPositiveAmount => write!(f, "non_positive_amount"),
            Self::ExcludedKind => write!(f, "excluded_kind"),
            Self::Unreconstructable => write!(f, "unreconstructable"),
        }
    }
}

/// Counters describing one parse. Column counts are kept so drift between
/// parallel runs is visible to operators.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub candidates: usize,
    pub emitted: usize,
    pub dropped: BTreeMap<DropReason, usize>,
    pub missing_anchors: Vec<String>,
    pub column_counts: BTreeMap<String, usize>,
}

impl ParseStats {
    pub fn drop_row(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn drop_many(&mut self, reason: DropReason, count: usize) {
        if count > 0 {
            *self.dropped.entry(reason).or_insert(0) += count;
        }
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn column(&mut self, name: &str, count: usize) {
        self.column_counts.insert(name.to_string(), count);
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub carrier: Carrier,
    pub rows: Vec<CommissionRow>,
    pub stats: ParseStats,
}

impl ParseOutcome {
    pub fn new(carrier: Carrier, lines: usize) -> Self {
        Self {
            carrier,
            rows: Vec::new(),
            stats: ParseStats {
                lines,
                ..ParseStats::default()
            },
        }
    }

    /// Outcome for a statement missing a required anchor: no rows, never an error.
    pub fn missing_anchors(carrier: Carrier, lines: usize, labels: Vec<String>) -> Self {
        log::warn!(
            "[{carrier}] missing anchor(s): {}; returning no rows",
            labels.join(", ")
        );
        let mut outcome = Self::new(carrier, lines);
        outcome.stats.missing_anchors = labels;
        outcome
    }

    pub fn push(&mut self, row: CommissionRow) {
        self.stats.emitted += 1;
        self.rows.push(row);
    }

    /// Non-empty input that produced no rows should go to manual review.
    pub fn needs_review(&self) -> bool {
        self.stats.lines > 0 && self.rows.is_empty()
    }
}
