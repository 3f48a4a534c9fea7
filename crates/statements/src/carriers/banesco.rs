//! Banesco statements: one logical row per printed line.
//!
//! The percentage column is glued to the insured name and the commission is
//! glued to an unrelated voucher number, e.g.
//! `1-1-35339-0 45.00JOSE LUIS FERNANDEZ 41.87224862`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::align::{NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::{contains_any, strings};
use crate::lines::normalize;
use crate::model::ParseOutcome;

static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,4}-\d{1,5}-\d{1,8}(?:-\d{1,2})?)\s+(\d+\.\d{2})\s*([A-Z][A-Z\s]{8,}?)\s+(\d+\.\d{2})")
        .expect("banesco row regex")
});

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BanescoConfig {
    /// Header and total lines, matched case-sensitively.
    pub skip_markers: Vec<String>,
    pub names: NameFilter,
}

impl Default for BanescoConfig {
    fn default() -> Self {
        Self {
            skip_markers: strings(&[
                "Póliza",
                "RESUMEN",
                "BALANCE",
                "Total por Ramo",
                "DESCUENTOS",
                "Monto a pagar",
                "Nombre Asegurado",
                "Prima Cobrada",
            ]),
            names: NameFilter {
                deny: strings(&["TOTAL", "RESUMEN"]),
                deny_exact: Vec::new(),
                min_len: 5,
                ..NameFilter::default()
            },
        }
    }
}

pub struct BanescoParser {
    config: BanescoConfig,
    validator: RowValidator,
}

impl BanescoParser {
    pub fn new(config: BanescoConfig) -> Self {
        let validator = RowValidator::new(1, config.names.clone());
        Self { config, validator }
    }
}

impl StatementParser for BanescoParser {
    fn carrier(&self) -> Carrier {
        Carrier::Banesco
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let mut out = ParseOutcome::new(Carrier::Banesco, lines.len());

        for line in &lines {
            if contains_any(line, &self.config.skip_markers) {
                continue;
            }
            let Some(caps) = ROW.captures(line) else {
                continue;
            };
            let policy = &caps[1];
            let name = caps[3].trim();
            // Only the two decimals are read; the voucher digits glued after are ignored.
            let gross = parse_amount(&caps[4]);
            self.validator.emit(&mut out, policy, name, gross);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glued_percentage_and_voucher() {
        let text = "\
No. Póliza  %  Nombre Asegurado  Comisión
Factura 2695 1131/01/2025 1-1-35339-0 45.00JOSE LUIS FERNANDEZ 41.87224862
Factura 2696 1131/01/2025 12-3-998877 10.00 MARIA DEL CARMEN ROJAS 7.50 1201
Total por Ramo 1-1 49.37
";
        let out = BanescoParser::new(BanescoConfig::default()).parse(text);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].policy_number, "1-1-35339-0");
        assert_eq!(out.rows[0].client_name, "JOSE LUIS FERNANDEZ");
        assert_eq!(out.rows[0].gross_cents, 4187);
        assert_eq!(out.rows[1].policy_number, "12-3-998877");
        assert_eq!(out.rows[1].client_name, "MARIA DEL CARMEN ROJAS");
        assert_eq!(out.rows[1].gross_cents, 750);
    }

    #[test]
    fn total_names_are_dropped() {
        let text = "1-1-1 1.00 TOTAL GENERAL RAMO 5.00";
        let out = BanescoParser::new(BanescoConfig::default()).parse(text);
        assert!(out.rows.is_empty());
        assert_eq!(out.stats.candidates, 1);
    }
}
