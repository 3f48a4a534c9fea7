//! Mercantil statements: one row per `Factura` line, with up to three money
//! tokens glued together ahead of the insured name. The first is the
//! commission.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::align::{NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::{contains_any, strings};
use crate::lines::normalize;
use crate::model::ParseOutcome;

static POLICY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2,6})\s+Factura").expect("mercantil policy regex"));
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Factura\s+\d+.*?(\d+\.\d{2})\s*(\d+\.\d{2})?\s*(\d+\.\d{2})?\s*([A-ZÑÁÉÍÓÚÜ][A-ZÑÁÉÍÓÚÜ\s]{4,}?)(?:Recibos|USD|Bs)",
    )
    .expect("mercantil row regex")
});

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MercantilConfig {
    pub row_marker: String,
    pub skip_markers: Vec<String>,
    pub names: NameFilter,
}

impl Default for MercantilConfig {
    fn default() -> Self {
        Self {
            row_marker: "Factura".to_string(),
            skip_markers: strings(&[
                "No. de Póliza",
                "RESUMEN",
                "COMISIONES POR RAMO",
                "CONSOLIDADO",
                "Total de comisiones",
                "DESCUENTOS",
                "Total por Ramo",
                "Monto a pagar",
                "Comisión a liquidar",
            ]),
            names: NameFilter {
                deny: strings(&["TOTAL", "DESCUENTO"]),
                deny_exact: Vec::new(),
                min_len: 4,
                ..NameFilter::default()
            },
        }
    }
}

pub struct MercantilParser {
    config: MercantilConfig,
    validator: RowValidator,
}

impl MercantilParser {
    pub fn new(config: MercantilConfig) -> Self {
        let validator = RowValidator::new(1, config.names.clone());
        Self { config, validator }
    }
}

impl StatementParser for MercantilParser {
    fn carrier(&self) -> Carrier {
        Carrier::Mercantil
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let mut out = ParseOutcome::new(Carrier::Mercantil, lines.len());

        for line in &lines {
            if contains_any(line, &self.config.skip_markers) || !line.contains(&self.config.row_marker) {
                continue;
            }
            let Some(policy) = POLICY.captures(line) else {
                continue;
            };
            let Some(row) = ROW.captures(line) else {
                log::debug!("[mercantil] no amount/name run in {line:?}");
                continue;
            };
            self.validator
                .emit(&mut out, &policy[1], row[4].trim(), parse_amount(&row[1]));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_glued_amount_is_commission() {
        let text = "\
No. de Póliza Factura Comisión
2032 Factura 178120 26.9820.00134.90ERIC ABDEL CHICHACORecibos Cobrados
4410 Factura 178121 5.00 12.00 60.00 ANA SOFÍA NÚÑEZ USD
Total de comisiones 31.98
";
        let out = MercantilParser::new(MercantilConfig::default()).parse(text);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].policy_number, "2032");
        assert_eq!(out.rows[0].client_name, "ERIC ABDEL CHICHACO");
        assert_eq!(out.rows[0].gross_cents, 2698);
        assert_eq!(out.rows[1].policy_number, "4410");
        assert_eq!(out.rows[1].client_name, "ANA SOFÍA NÚÑEZ");
        assert_eq!(out.rows[1].gross_cents, 500);
    }

    #[test]
    fn lines_without_leading_policy_are_ignored() {
        let out = MercantilParser::new(MercantilConfig::default()).parse("Factura 1 2.00 JUAN PEREZ USD");
        assert!(out.rows.is_empty());
        assert_eq!(out.stats.candidates, 0);
    }
}
