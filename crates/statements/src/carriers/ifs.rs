//! IFS statements.
//!
//! The source PDFs embed a font without a Unicode map, so text extraction
//! returns private-use glyphs at a fixed offset from ASCII. Once decoded, each
//! row is one line: policy, insured name, percentage, commission.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::align::{NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::strings;
use crate::lines::normalize;
use crate::model::ParseOutcome;

static POLICY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2,10}-\d{2,6}(?:-[A-Z]-\d{1,3})?").expect("ifs policy regex"));
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,3}(?:\.\d+)?%").expect("ifs percent regex"));
static MONEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})*\.\d{2}|\d+\.\d{2}").expect("ifs money regex"));
static DIGIT_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9])([A-Z])").expect("digit-letter regex"));
static LETTER_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])([0-9])").expect("letter-digit regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("spaces regex"));

const GLYPH_BASE: u32 = 0xF000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IfsConfig {
    /// Map U+F020..U+F07E back to ASCII before parsing.
    pub decode_glyphs: bool,
    pub names: NameFilter,
}

impl Default for IfsConfig {
    fn default() -> Self {
        Self {
            decode_glyphs: true,
            names: NameFilter {
                deny: strings(&["DETALLE", "COMISION", "RESUMEN", "LIDERES EN SEGUROS"]),
                deny_exact: Vec::new(),
                min_letters: 6,
                ..NameFilter::default()
            },
        }
    }
}

/// Replace private-use glyphs with the ASCII character at the same offset.
pub fn decode_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (GLYPH_BASE + 0x20..=GLYPH_BASE + 0x7E).contains(&code) {
                char::from_u32(code - GLYPH_BASE).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Printable ASCII only, digit/letter boundaries split, runs of blanks collapsed.
fn clean_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' || (' '..='~').contains(&c) { c } else { ' ' })
        .collect();
    let split = DIGIT_LETTER.replace_all(&printable, "$1 $2");
    let split = LETTER_DIGIT.replace_all(&split, "$1 $2");
    SPACES.replace_all(&split, " ").into_owned()
}

pub struct IfsParser {
    config: IfsConfig,
    validator: RowValidator,
}

impl IfsParser {
    pub fn new(config: IfsConfig) -> Self {
        let validator = RowValidator::new(1, config.names.clone());
        Self { config, validator }
    }
}

impl StatementParser for IfsParser {
    fn carrier(&self) -> Carrier {
        Carrier::Ifs
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let decoded = if self.config.decode_glyphs {
            decode_glyphs(text)
        } else {
            text.to_string()
        };
        let lines = normalize(&clean_text(&decoded));
        let mut out = ParseOutcome::new(Carrier::Ifs, lines.len());

        for line in &lines {
            let upper = line.to_uppercase();
            let Some(policy) = POLICY.find(&upper) else {
                continue;
            };
            let Some(percent) = PERCENT.find_at(&upper, policy.end()) else {
                continue;
            };

            let name = upper[policy.end()..percent.start()].trim();
            let gross = MONEY
                .find(&upper[percent.end()..])
                .map_or(0, |m| parse_amount(m.as_str()));
            self.validator.emit(&mut out, policy.as_str(), name, gross);
        }
        out
    }
}
