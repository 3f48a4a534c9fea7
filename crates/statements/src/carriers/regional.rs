//! Regional statements.
//!
//! Each column of the printed table lands as its own run next to a marker
//! line. The full policy number is assembled from four runs:
//! `branch-line-policy-cert`.

use serde::Deserialize;

use crate::align::{truncate_len, NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::lines::{is_digits, locate, normalize, normalize_header, Anchor};
use crate::model::ParseOutcome;
use crate::segment::{digit_run_after, digit_run_before, is_money_line, money_run_from};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionalAnchors {
    /// Policy ids follow this marker.
    pub policy: Anchor,
    /// Branch codes precede this marker.
    pub branch: Anchor,
    /// Line-of-business codes follow this marker, after one label line.
    pub line: Anchor,
    pub amount: Anchor,
    pub paid: Anchor,
    pub cert: Anchor,
    pub names: Anchor,
    pub names_stop: Anchor,
}

impl Default for RegionalAnchors {
    fn default() -> Self {
        Self {
            policy: Anchor::exact("RAMO"),
            branch: Anchor::exact("SUC."),
            line: Anchor::exact("NRO."),
            amount: Anchor::starts_with("MONTO C."),
            paid: Anchor::exact("PAGADO"),
            cert: Anchor::exact("CERT"),
            names: Anchor::exact("OPERACIÓN"),
            names_stop: Anchor::starts_with("NOMBRE ASEGURADO"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionalConfig {
    pub anchors: RegionalAnchors,
    /// Inclusive digit-length range for policy ids.
    pub policy_len: (usize, usize),
    /// Lines in the name run that are skipped when they contain one of these.
    pub skip_names: Vec<String>,
    /// A short all-caps line is a continuation of the previous name.
    pub join_max_words: usize,
    pub join_max_chars: usize,
    pub names: NameFilter,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            anchors: RegionalAnchors::default(),
            policy_len: (6, 10),
            skip_names: vec!["PAGO DE".to_string()],
            join_max_words: 2,
            join_max_chars: 12,
            names: NameFilter::default(),
        }
    }
}

pub struct RegionalParser {
    config: RegionalConfig,
    validator: RowValidator,
}

impl RegionalParser {
    pub fn new(config: RegionalConfig) -> Self {
        let validator = RowValidator::new(1, config.names.clone());
        Self { config, validator }
    }

    fn names_after(&self, lines: &[String], start: usize) -> Vec<String> {
        let anchors = &self.config.anchors;
        let mut raw = Vec::new();
        for line in &lines[start + 1..] {
            if anchors.names_stop.matches(line) || anchors.cert.matches(line) {
                break;
            }
            let upper = normalize_header(line);
            if self.config.skip_names.iter().any(|s| upper.contains(&normalize_header(s))) {
                continue;
            }
            if upper.starts_with("TOTAL ") || is_money_line(line) || is_digits(line) {
                continue;
            }
            raw.push(line.clone());
        }

        let mut names: Vec<String> = Vec::new();
        for line in raw {
            match names.last_mut() {
                Some(prev) if self.is_continuation(&line) => {
                    prev.push(' ');
                    prev.push_str(&line);
                }
                _ => names.push(line),
            }
        }
        names
    }

    fn is_continuation(&self, line: &str) -> bool {
        let short = line.split_whitespace().count() <= self.config.join_max_words
            || line.chars().count() <= self.config.join_max_chars;
        let letters = line
            .to_uppercase()
            .chars()
            .all(|c| c.is_whitespace() || c == ',' || c == '.' || c.is_alphabetic());
        short && letters
    }
}

impl StatementParser for RegionalParser {
    fn carrier(&self) -> Carrier {
        Carrier::Regional
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let anchors = &self.config.anchors;

        let policy_idx = locate(&lines, &anchors.policy);
        let amount_idx = locate(&lines, &anchors.amount);
        let names_idx = locate(&lines, &anchors.names);

        let (policy_idx, amount_idx, names_idx) = match (policy_idx, amount_idx, names_idx) {
            (Some(p), Some(a), Some(n)) => (p, a, n),
            _ => {
                let missing = [
                    (&anchors.policy, policy_idx),
                    (&anchors.amount, amount_idx),
                    (&anchors.names, names_idx),
                ]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(a, _)| a.label().to_string())
                .collect();
                return ParseOutcome::missing_anchors(Carrier::Regional, lines.len(), missing);
            }
        };

        let (lo, hi) = self.config.policy_len;
        let policies: Vec<String> = digit_run_after(&lines, policy_idx, lines.len())
            .into_iter()
            .filter(|p| (lo..=hi).contains(&p.len()))
            .collect();

        let branches: Vec<String> = locate(&lines, &anchors.branch)
            .map(|idx| digit_run_before(&lines, idx))
            .unwrap_or_default()
            .into_iter()
            .filter(|b| (1..=2).contains(&b.len()))
            .collect();

        let line_codes: Vec<String> = locate(&lines, &anchors.line)
            .map(|idx| digit_run_after(&lines, idx + 1, lines.len()))
            .unwrap_or_default()
            .into_iter()
            .filter(|r| (1..=3).contains(&r.len()))
            .collect();

        // "MONTO C." is usually followed by a separate "PAGADO" label line.
        let mut start = amount_idx + 1;
        if lines.get(start).is_some_and(|l| anchors.paid.matches(l)) {
            start += 1;
        }
        let (amount_run, amount_end) = money_run_from(&lines, start);
        let amounts: Vec<i64> = amount_run.iter().map(|a| parse_amount(a)).collect();

        let certs: Vec<String> = amount_end
            .map(|end| digit_run_after(&lines, end, lines.len()))
            .unwrap_or_default()
            .into_iter()
            .filter(|c| (1..=4).contains(&c.len()))
            .collect();

        let names = self.names_after(&lines, names_idx);

        let mut out = ParseOutcome::new(Carrier::Regional, lines.len());
        out.stats.column("branches", branches.len());
        out.stats.column("line_codes", line_codes.len());
        out.stats.column("policies", policies.len());
        out.stats.column("names", names.len());
        out.stats.column("amounts", amounts.len());
        out.stats.column("certs", certs.len());

        // Leading totals sometimes precede the per-row amounts; keep the tail.
        let expected = policies.len().min(names.len());
        let amounts = if expected > 0 && amounts.len() > expected {
            &amounts[amounts.len() - expected..]
        } else {
            &amounts[..]
        };

        let n = truncate_len(&[policies.len(), names.len(), amounts.len()]);
        for i in 0..n {
            let branch = branches.get(i).or(branches.first());
            let line_code = line_codes.get(i).or(line_codes.first());
            let cert = certs.get(i).or(certs.first()).map_or("0", String::as_str);
            let policy = match (branch, line_code) {
                (Some(b), Some(l)) => format!("{b}-{l}-{}-{cert}", policies[i]),
                _ => policies[i].clone(),
            };
            self.validator.emit(&mut out, &policy, &names[i], amounts[i]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
10
Suc.
Ramo
1234567
7654321
Nro.
Recibo
29
Monto C.
Pagado
99.00
15.50
22.00
0
0
Cert
Operación
ANA MARIA RUIZ SOTO
PAGO DE COMISIONES
PEDRO JOSE GOMEZ
DIAZ
Nombre Asegurado %Imp.
";

    #[test]
    fn assembles_four_part_policy_numbers() {
        let out = RegionalParser::new(RegionalConfig::default()).parse(STATEMENT);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].policy_number, "10-29-1234567-0");
        assert_eq!(out.rows[0].client_name, "ANA MARIA RUIZ SOTO");
        assert_eq!(out.rows[0].gross_cents, 1550);
        assert_eq!(out.rows[1].policy_number, "10-29-7654321-0");
        assert_eq!(out.rows[1].client_name, "PEDRO JOSE GOMEZ DIAZ");
        assert_eq!(out.rows[1].gross_cents, 2200);
    }

    #[test]
    fn bare_policy_without_branch_marker() {
        let text = STATEMENT.replace("Suc.", "Sucursal");
        let out = RegionalParser::new(RegionalConfig::default()).parse(&text);
        assert_eq!(out.rows[0].policy_number, "1234567");
    }

    #[test]
    fn missing_amount_marker() {
        let text = STATEMENT.replace("Monto C.", "Importe");
        let out = RegionalParser::new(RegionalConfig::default()).parse(&text);
        assert!(out.rows.is_empty());
        assert_eq!(out.stats.missing_anchors, vec!["MONTO C."]);
    }

    #[test]
    fn continuation_rule() {
        let p = RegionalParser::new(RegionalConfig::default());
        assert!(p.is_continuation("DIAZ"));
        assert!(p.is_continuation("DE LA CRUZ"));
        assert!(!p.is_continuation("PEDRO JOSE GOMEZ"));
        assert!(p.is_continuation("Diaz"));
        assert!(p.is_continuation("de la Peña"));
        assert!(!p.is_continuation("B/. 12"));
    }

    #[test]
    fn mixed_case_surname_joins_previous_name() {
        let text = STATEMENT.replace("DIAZ", "Diaz");
        let out = RegionalParser::new(RegionalConfig::default()).parse(&text);
        assert!(out.rows.iter().any(|r| r.client_name.ends_with(" Diaz")));
    }
}
