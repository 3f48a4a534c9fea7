//! PALIG statements: one table per line of business, each opened by a
//! `PÓLIZA / CERT` header and closed by its `TOTAL` line.
//!
//! Each data line reads premium, percentage, debits, credits, then the insured
//! name with the commission and policy glued after it:
//! `167.76 15.00 0.00 25.16BAYARDO A. HERRERA 25.166000130`.
//! The commission always has two decimals; what follows is the policy, up to
//! an optional `/ certificate`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::align::{NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::strings;
use crate::lines::{normalize, normalize_header};
use crate::model::ParseOutcome;

static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-ZÑÁÉÍÓÚÜ][A-ZÑÁÉÍÓÚÜ\s,.]*?)\s*(\()?(\d+\.\d{2})\)?\s*(.*)$").expect("palig row regex")
});
static ALPHA_POLICY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)[A-Z]\d+").expect("palig alpha policy regex"));
static NUMERIC_POLICY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+-?\d*").expect("palig numeric policy regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaligConfig {
    /// Every marker must appear on the line that opens a table.
    pub header_markers: Vec<String>,
    /// Lines starting with one of these close the table.
    pub total_prefixes: Vec<String>,
    /// Lines containing one of these close the table.
    pub section_breaks: Vec<String>,
    pub min_policy_len: usize,
    pub names: NameFilter,
}

impl Default for PaligConfig {
    fn default() -> Self {
        Self {
            header_markers: strings(&["PÓLIZA", "CERT"]),
            total_prefixes: strings(&["TOTAL"]),
            section_breaks: strings(&["LINEA DE NEGOCIO", "CODIGO DE AGENTE", "REGULADO Y SUPERVISADO"]),
            min_policy_len: 4,
            names: NameFilter {
                deny: strings(&["REFERENCIA", "PRIMA", "DÉBITOS", "TOTAL"]),
                deny_exact: Vec::new(),
                ..NameFilter::default()
            },
        }
    }
}

/// Policy number at the start of `rest`, certificate suffix dropped.
///
/// Alphanumeric policies (`C8000`) are kept verbatim; numeric ones lose their
/// leading zeros.
fn policy_from(rest: &str) -> String {
    let head = rest.split('/').next().unwrap_or("").trim();
    if let Some(m) = ALPHA_POLICY.find(head) {
        return m.as_str().to_string();
    }
    NUMERIC_POLICY
        .find(head)
        .map(|m| m.as_str().trim_start_matches('0').to_string())
        .unwrap_or_default()
}

pub struct PaligParser {
    config: PaligConfig,
    validator: RowValidator,
}

impl PaligParser {
    pub fn new(config: PaligConfig) -> Self {
        let validator = RowValidator::new(config.min_policy_len, config.names.clone());
        Self { config, validator }
    }

    fn opens_table(&self, upper: &str) -> bool {
        self.config.header_markers.iter().all(|m| upper.contains(&normalize_header(m)))
    }

    fn closes_table(&self, upper: &str) -> bool {
        self.config.total_prefixes.iter().any(|p| upper.starts_with(&normalize_header(p)))
            || self.config.section_breaks.iter().any(|m| upper.contains(&normalize_header(m)))
    }
}

impl StatementParser for PaligParser {
    fn carrier(&self) -> Carrier {
        Carrier::Palig
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let headers: Vec<String> = lines.iter().map(|l| normalize_header(l)).collect();
        if !lines.is_empty() && !headers.iter().any(|h| self.opens_table(h)) {
            let label = self.config.header_markers.join(" / ");
            return ParseOutcome::missing_anchors(Carrier::Palig, lines.len(), vec![label]);
        }
        let mut out = ParseOutcome::new(Carrier::Palig, lines.len());

        let mut in_table = false;
        for (line, upper) in lines.iter().zip(&headers) {
            if self.opens_table(upper) {
                in_table = true;
                continue;
            }
            if self.closes_table(upper) {
                in_table = false;
                continue;
            }
            if !in_table {
                continue;
            }
            let Some(caps) = ROW.captures(line) else {
                log::debug!("[palig] no name/commission run in {line:?}");
                continue;
            };
            let mut gross = parse_amount(&caps[3]);
            // Parenthesized commissions are reversals.
            if caps.get(2).is_some() {
                gross = -gross.abs();
            }
            let policy = policy_from(&caps[4]);
            self.validator.emit(&mut out, &policy, caps[1].trim(), gross);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DropReason;

    const STATEMENT: &str = "\
PAN AMERICAN LIFE
LINEA DE NEGOCIO: SALUD
PRIMA % DÉBITOS CRÉDITOS NOMBRE COMISIÓN PÓLIZA / CERT
167.76 15.00 0.00 25.16BAYARDO A. HERRERA 25.166000130
195.30 10.00 0.00 19.53JAMES THOMPSON 19.5366636 / 0000000976
35.17 3.00 0.00 1.06RODRIGUEZ 1.064239-384
50.00 3.00 0.00 1.50JUAN PEREZ 1.50C8000 / C150000972
TOTAL 47.25
CODIGO DE AGENTE 1234
10.00 1.00 0.00 1.00FUERA DE TABLA 1.0012345
";

    #[test]
    fn commission_and_policy_split_after_name() {
        let out = PaligParser::new(PaligConfig::default()).parse(STATEMENT);
        assert_eq!(out.rows.len(), 4);
        assert_eq!(out.rows[0].client_name, "BAYARDO A. HERRERA");
        assert_eq!(out.rows[0].gross_cents, 2516);
        assert_eq!(out.rows[0].policy_number, "6000130");
        assert_eq!(out.rows[1].policy_number, "66636");
        assert_eq!(out.rows[1].gross_cents, 1953);
        assert_eq!(out.rows[2].client_name, "RODRIGUEZ");
        assert_eq!(out.rows[2].policy_number, "4239-384");
        assert_eq!(out.rows[3].policy_number, "C8000");
        assert_eq!(out.rows[3].gross_cents, 150);
    }

    #[test]
    fn leading_zeros_are_stripped() {
        assert_eq!(policy_from("0000123456 / 1"), "123456");
        assert_eq!(policy_from("c8000"), "c8000");
        assert_eq!(policy_from(""), "");
    }

    #[test]
    fn parenthesized_commission_is_a_reversal() {
        let text = "PÓLIZA / CERT\n10.00 5.00 0.00 (0.50)ANA RUIZ (0.50)123456\n";
        let out = PaligParser::new(PaligConfig::default()).parse(text);
        assert!(out.rows.is_empty());
        assert_eq!(out.stats.dropped[&DropReason::NonPositiveAmount], 1);
    }

    #[test]
    fn short_policy_is_dropped() {
        let text = "PÓLIZA CERT\n1.00 1.00 0.00 1.00ANA RUIZ 1.00007\n";
        let out = PaligParser::new(PaligConfig::default()).parse(text);
        assert!(out.rows.is_empty());
        assert_eq!(out.stats.dropped[&DropReason::ShortPolicy], 1);
    }

    #[test]
    fn missing_table_header_is_reported() {
        let out = PaligParser::new(PaligConfig::default()).parse("1.00 1.00 0.00 1.00ANA RUIZ 1.001234");
        assert_eq!(out.stats.missing_anchors, vec!["PÓLIZA / CERT"]);
        assert!(out.needs_review());
    }
}
