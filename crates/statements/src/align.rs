//! Row alignment and filtering.
//!
//! Parallel column runs are aligned purely by position. A type column can mark
//! rows as non-commission postings; those positions are removed from every
//! other column through the same index list so the runs stay in lockstep.
//! Names are cleaned, then every column is truncated to the shortest one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::lines::normalize_header;
use crate::model::{CommissionRow, DropReason, ParseOutcome};

static DATE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\s+AL\s+\d{2}\s+DE").expect("date range regex"));
static NUMERIC_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d+[\d.,]*%?$").expect("numeric shape regex"));

const MONTHS: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

// ---------------------------------------------------------------------------
// Positional projection
// ---------------------------------------------------------------------------

/// Positions whose kind is non-empty and not excluded.
///
/// `None` when the kind column is empty: there is nothing to project by and
/// the other columns are used as-is.
pub fn keep_indices(kinds: &[String], excluded: &[String]) -> Option<Vec<usize>> {
    if kinds.is_empty() {
        return None;
    }
    let excluded: Vec<String> = excluded.iter().map(|k| normalize_header(k)).collect();
    let keep = kinds
        .iter()
        .enumerate()
        .filter(|(_, k)| {
            let k = normalize_header(k);
            !k.is_empty() && !excluded.contains(&k)
        })
        .map(|(i, _)| i)
        .collect();
    Some(keep)
}

/// Select `values` through `keep`. A position past the end of `values` yields
/// `T::default()` so the projected column keeps the kind column's length.
pub fn project<T: Clone + Default>(values: &[T], keep: Option<&[usize]>) -> Vec<T> {
    match keep {
        Some(keep) => keep
            .iter()
            .map(|&i| values.get(i).cloned().unwrap_or_default())
            .collect(),
        None => values.to_vec(),
    }
}

/// Final row count for parallel columns. Never pads.
pub fn truncate_len(lens: &[usize]) -> usize {
    lens.iter().copied().min().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Name filter
// ---------------------------------------------------------------------------

/// Rejects name candidates that are report annotations rather than insureds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NameFilter {
    /// Substrings that mark a line as an annotation (`PAGO DE`, regulator footers).
    pub deny: Vec<String>,
    /// Labels rejected only on an exact match (column headers leaking into a run).
    pub deny_exact: Vec<String>,
    pub reject_months: bool,
    pub reject_date_ranges: bool,
    pub min_len: usize,
    /// Minimum count of ASCII letters, for layouts where glued digits survive.
    pub min_letters: usize,
}

impl Default for NameFilter {
    fn default() -> Self {
        Self {
            deny: [
                "PAGO DE",
                "HONORARIOS",
                "PROFESIONALES",
                "HON PROF",
                "CORRESP",
                "REGULADO",
                "SUPERVISADO",
                "TOTALES",
                "SALDO",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            deny_exact: ["ASEGURADO", "POLIZA", "GANADOS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reject_months: true,
            reject_date_ranges: true,
            min_len: 3,
            min_letters: 0,
        }
    }
}

impl NameFilter {
    /// Whether `candidate` may be emitted as a client name.
    pub fn accepts(&self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        if trimmed.chars().count() < self.min_len {
            return false;
        }
        if NUMERIC_SHAPE.is_match(trimmed) {
            return false;
        }
        if !trimmed.chars().any(char::is_alphabetic) {
            return false;
        }
        if trimmed.chars().filter(char::is_ascii_alphabetic).count() < self.min_letters {
            return false;
        }

        let upper = normalize_header(trimmed);
        if self.deny.iter().any(|d| upper.contains(&normalize_header(d))) {
            return false;
        }
        if self.deny_exact.iter().any(|d| upper == normalize_header(d)) {
            return false;
        }
        if self.reject_date_ranges && DATE_RANGE.is_match(&upper) {
            return false;
        }
        if self.reject_months && is_month_annotation(&upper) {
            return false;
        }
        true
    }

    /// Blank out rejected candidates in place of removing them, so positions
    /// still line up with the kind column.
    pub fn blank_invalid(&self, candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| {
                if self.accepts(c) {
                    c.trim().to_string()
                } else {
                    String::new()
                }
            })
            .collect()
    }

    /// Keep accepted names only, compacted in order.
    pub fn clean_names(&self, candidates: &[String]) -> Vec<String> {
        compact(self.blank_invalid(candidates))
    }
}

/// Drop blank entries.
pub fn compact(names: Vec<String>) -> Vec<String> {
    names.into_iter().filter(|n| !n.is_empty()).collect()
}

/// A month name on its own, or a month word next to a digit or `DE`
/// (`NOVIEMBRE 2025`, `PAGO DE NOVIEMBRE`). Surnames such as `MAYORGA` or
/// given names such as `ABRIL GONZALEZ` are not annotations.
fn is_month_annotation(upper: &str) -> bool {
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if !words.iter().any(|w| MONTHS.contains(w)) {
        return false;
    }
    words.len() == 1 || upper.chars().any(|c| c.is_ascii_digit()) || words.contains(&"DE")
}

// ---------------------------------------------------------------------------
// Row validation
// ---------------------------------------------------------------------------

/// Final per-row gate before a [`CommissionRow`] is emitted.
#[derive(Debug, Clone)]
pub struct RowValidator {
    pub min_policy_len: usize,
    pub names: NameFilter,
}

impl RowValidator {
    pub fn new(min_policy_len: usize, names: NameFilter) -> Self {
        Self { min_policy_len, names }
    }

    pub fn check(&self, policy: &str, name: &str, gross_cents: i64) -> Result<(), DropReason> {
        let policy = policy.trim();
        if policy.is_empty() {
            return Err(DropReason::EmptyPolicy);
        }
        if policy.chars().count() < self.min_policy_len {
            return Err(DropReason::ShortPolicy);
        }
        if !self.names.accepts(name) {
            return Err(DropReason::InvalidName);
        }
        if gross_cents <= 0 {
            return Err(DropReason::NonPositiveAmount);
        }
        Ok(())
    }

    /// Validate one candidate row and push it onto `outcome`, or count the drop.
    pub fn emit(&self, outcome: &mut ParseOutcome, policy: &str, name: &str, gross_cents: i64) {
        outcome.stats.candidates += 1;
        match self.check(policy, name, gross_cents) {
            Ok(()) => outcome.push(CommissionRow {
                policy_number: policy.trim().to_string(),
                client_name: collapse_spaces(name),
                gross_cents,
            }),
            Err(reason) => {
                log::debug!(
                    "[{}] dropping row {} ({reason}): policy={policy:?} name={name:?} cents={gross_cents}",
                    outcome.carrier,
                    outcome.stats.candidates,
                );
                outcome.stats.drop_row(reason);
            }
        }
    }
}

pub(crate) fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
