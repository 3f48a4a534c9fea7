//! VUMI statements: several tables in one report (new business, renewals,
//! other adjustments), each with its own header zone.
//!
//! A row starts at a line carrying a 10-digit policy number. The holder's
//! name and the `$` amounts are spread over the lines that follow, up to the
//! next policy line or a section terminator. The last `$` amount is the
//! commission.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::align::{NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::strings;
use crate::lines::{normalize, normalize_header};
use crate::model::ParseOutcome;

static POLICY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{10})\b").expect("vumi policy regex"));
static DATA_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}|^\d{10}").expect("vumi data start regex"));
static DOLLAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\d+\.?\d*)").expect("vumi dollar regex"));
static NAME_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-ZÑÁÉÍÓÚÜ]+$").expect("vumi name word regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VumiConfig {
    /// Section headings, matched as whole lines.
    pub sections: Vec<String>,
    /// Words that keep the parser inside a section's header zone.
    pub header_words: Vec<String>,
    /// Lines that close the current section once data rows started.
    pub section_end: Vec<String>,
    /// Lines that close a row's block early.
    pub block_stop: Vec<String>,
    /// Upper bound on the lines scanned for one row.
    pub block_lines: usize,
    /// Uppercase words never taken as part of a holder name.
    pub name_stopwords: Vec<String>,
    pub min_name_words: usize,
    pub names: NameFilter,
}

impl Default for VumiConfig {
    fn default() -> Self {
        Self {
            sections: strings(&["NUEVOS NEGOCIOS", "RENOVACIONES", "OTROS AJUSTES"]),
            header_words: strings(&["NÚMERO", "PÓLIZA", "TITULAR", "MONTO"]),
            section_end: strings(&["NO GENERÓ COMISIONES", "TOTAL"]),
            block_stop: strings(&["TOTAL", "NO GENERÓ", "CICLO DE"]),
            block_lines: 10,
            name_stopwords: strings(&["COMMISSION", "LIDERES", "LISSA", "SEGUROS", "AGENTE", "GRUPO"]),
            min_name_words: 2,
            names: NameFilter {
                deny: strings(&["TOTAL"]),
                deny_exact: Vec::new(),
                min_len: 5,
                ..NameFilter::default()
            },
        }
    }
}

fn contains_header(upper: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| upper.contains(&normalize_header(m)))
}

pub struct VumiParser {
    config: VumiConfig,
    validator: RowValidator,
}

impl VumiParser {
    pub fn new(config: VumiConfig) -> Self {
        let validator = RowValidator::new(1, config.names.clone());
        Self { config, validator }
    }

    fn section_at(&self, upper: &str) -> Option<&str> {
        self.config
            .sections
            .iter()
            .find(|s| normalize_header(s) == upper)
            .map(String::as_str)
    }

    /// Index one past the last line of the row starting at `start`.
    fn block_end(&self, lines: &[String], start: usize) -> usize {
        let limit = (start + self.config.block_lines.max(1)).min(lines.len());
        (start + 1..limit)
            .find(|&j| {
                POLICY.is_match(&lines[j]) || contains_header(&normalize_header(&lines[j]), &self.config.block_stop)
            })
            .unwrap_or(limit)
    }

    fn name_words<'a>(&self, block: &'a [String]) -> Vec<&'a str> {
        let mut words = Vec::new();
        for line in block {
            for word in line.split_whitespace() {
                let upper = word.to_uppercase();
                if word.chars().count() <= 2 || !NAME_WORD.is_match(&upper) {
                    continue;
                }
                let folded = normalize_header(word);
                if self.config.name_stopwords.iter().any(|s| folded.contains(&normalize_header(s))) {
                    continue;
                }
                words.push(word);
            }
        }
        words
    }
}

impl StatementParser for VumiParser {
    fn carrier(&self) -> Carrier {
        Carrier::Vumi
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let headers: Vec<String> = lines.iter().map(|l| normalize_header(l)).collect();
        if !lines.is_empty() && !headers.iter().any(|h| self.section_at(h).is_some()) {
            return ParseOutcome::missing_anchors(Carrier::Vumi, lines.len(), self.config.sections.clone());
        }
        let mut out = ParseOutcome::new(Carrier::Vumi, lines.len());

        let mut section: Option<&str> = None;
        let mut in_rows = false;
        let mut i = 0;
        while i < lines.len() {
            let line = &lines[i];
            let upper = &headers[i];

            if !in_rows {
                if let Some(found) = self.section_at(upper) {
                    log::debug!("[vumi] section {found} at line {i}");
                    section = Some(found);
                    i += 1;
                    continue;
                }
                if section.is_none() || contains_header(upper, &self.config.header_words) {
                    i += 1;
                    continue;
                }
                if !DATA_START.is_match(line) {
                    i += 1;
                    continue;
                }
                in_rows = true;
            }

            if contains_header(upper, &self.config.section_end) {
                in_rows = false;
                section = None;
                i += 1;
                continue;
            }

            let Some(policy) = POLICY.captures(line) else {
                i += 1;
                continue;
            };
            let end = self.block_end(&lines, i);
            let block = &lines[i..end];

            let gross = block
                .iter()
                .filter_map(|l| DOLLAR.captures_iter(l).last())
                .last()
                .map(|c| parse_amount(&c[1]))
                .unwrap_or(0);
            let words = self.name_words(block);
            let name = if words.len() >= self.config.min_name_words { words.join(" ") } else { String::new() };

            self.validator.emit(&mut out, &policy[1], &name, gross);
            i = end;
        }
        out
    }
}
