//! Assist Card agency reports, OCR'd from screenshots.
//!
//! Two shapes show up. In the block shape each voucher line (`1234567890
//! PEREZ, JUAN`) is followed by header cells and then the amounts one per
//! line: net sales, then commission. In the inline shape a whole row sits on
//! one line and the last decimal token is the commission. Block rows win when
//! any are found.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::align::{NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::strings;
use crate::lines::{normalize, normalize_header};
use crate::model::ParseOutcome;

static MONEY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").expect("assistcard money regex"));
static VOUCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6,}$").expect("assistcard voucher regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistcardConfig {
    /// Column header cells; lines containing one are never data.
    pub header_words: Vec<String>,
    /// Header cells that announce the amount lines of the current block.
    pub commission_headers: Vec<String>,
    /// Preferred voucher length when a line carries several digit tokens.
    pub voucher_len: usize,
    pub names: NameFilter,
}

impl Default for AssistcardConfig {
    fn default() -> Self {
        Self {
            header_words: strings(&["AGENCY", "DOC", "VOUCHER", "NOMBRE", "PAX", "NET", "SALES"]),
            commission_headers: strings(&["COMISSION", "COMMISSION"]),
            voucher_len: 10,
            names: NameFilter::default(),
        }
    }
}

struct Candidate {
    voucher: String,
    name: String,
    gross_cents: i64,
}

pub struct AssistcardParser {
    config: AssistcardConfig,
    validator: RowValidator,
}

impl AssistcardParser {
    pub fn new(config: AssistcardConfig) -> Self {
        let validator = RowValidator::new(1, config.names.clone());
        Self { config, validator }
    }

    fn is_commission_header(&self, upper: &str) -> bool {
        self.config.commission_headers.iter().any(|h| upper.contains(&normalize_header(h)))
    }

    fn is_header(&self, upper: &str) -> bool {
        self.is_commission_header(upper)
            || self.config.header_words.iter().any(|h| upper.contains(&normalize_header(h)))
    }

    fn pick_voucher<'a>(&self, digits: &[&'a str]) -> Option<&'a str> {
        digits
            .iter()
            .find(|t| t.len() == self.config.voucher_len)
            .or_else(|| digits.first())
            .copied()
    }

    /// Voucher line followed by a commission header and one or two amounts.
    fn block_rows(&self, lines: &[String]) -> Vec<Candidate> {
        let mut rows = Vec::new();
        let mut pending: Option<(String, String)> = None;
        let mut seen_header = false;
        let mut amounts: Vec<i64> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let upper = normalize_header(line);
            if self.is_header(&upper) {
                if self.is_commission_header(&upper) {
                    seen_header = true;
                    amounts.clear();
                }
                continue;
            }

            if pending.is_some() && seen_header && MONEY_LINE.is_match(line) {
                let cents = parse_amount(line);
                if cents != 0 {
                    amounts.push(cents);
                }
                // Net sales then commission; a lone amount is the commission.
                let gross = match amounts.as_slice() {
                    [_, commission, ..] => Some(*commission),
                    [only] if !lines.get(i + 1).is_some_and(|next| MONEY_LINE.is_match(next)) => Some(*only),
                    _ => None,
                };
                if let Some(gross_cents) = gross {
                    if let Some((voucher, name)) = pending.take() {
                        rows.push(Candidate { voucher, name, gross_cents });
                    }
                    seen_header = false;
                    amounts.clear();
                }
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let digits: Vec<&str> = tokens.iter().copied().filter(|t| VOUCHER.is_match(t)).collect();
            if digits.is_empty() || !line.contains(',') {
                continue;
            }
            let Some(voucher) = self.pick_voucher(&digits) else {
                continue;
            };
            let name_start = tokens.iter().rposition(|t| VOUCHER.is_match(t)).map_or(0, |idx| idx + 1);
            let name = tokens[name_start..].join(" ");
            if !name.is_empty() {
                pending = Some((voucher.to_string(), name));
                seen_header = false;
            }
        }
        rows
    }

    /// One row per line: vouchers, name, then amounts with the commission last.
    /// The name stops at the first amount.
    fn inline_rows(&self, lines: &[String]) -> Vec<Candidate> {
        let mut rows = Vec::new();
        for line in lines {
            if self.is_header(&normalize_header(line)) {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 4 {
                continue;
            }
            let Some(first_digit) = tokens.iter().position(|t| VOUCHER.is_match(t)) else {
                continue;
            };
            let Some(commission_idx) = tokens.iter().rposition(|t| MONEY_LINE.is_match(t)) else {
                continue;
            };
            let gross_cents = parse_amount(tokens[commission_idx]);
            if gross_cents == 0 {
                continue;
            }

            let digits: Vec<&str> = tokens[first_digit..]
                .iter()
                .copied()
                .take_while(|t| VOUCHER.is_match(t))
                .take(3)
                .collect();
            let Some(voucher) = self.pick_voucher(&digits) else {
                continue;
            };
            let name_start = first_digit + digits.len();
            let Some(name_tokens) = tokens.get(name_start..commission_idx) else {
                continue;
            };
            let name = name_tokens
                .iter()
                .copied()
                .take_while(|t| !MONEY_LINE.is_match(t))
                .collect::<Vec<_>>()
                .join(" ");
            if name.is_empty() {
                continue;
            }
            rows.push(Candidate { voucher: voucher.to_string(), name, gross_cents });
        }
        rows
    }
}

impl StatementParser for AssistcardParser {
    fn carrier(&self) -> Carrier {
        Carrier::Assistcard
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let mut out = ParseOutcome::new(Carrier::Assistcard, lines.len());

        let mut rows = self.block_rows(&lines);
        if rows.is_empty() {
            log::debug!("[assistcard] no block rows, trying one row per line");
            rows = self.inline_rows(&lines);
        }
        for row in rows {
            self.validator.emit(&mut out, &row.voucher, &row.name, row.gross_cents);
        }
        out
    }
}
