//! Line stream normalization and anchor search.

use serde::Deserialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Split extracted text into trimmed, non-empty lines. Order is preserved.
pub fn normalize(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|l| l.split('\r'))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Uppercase, strip diacritics, trim. "Póliza" and "POLIZA" normalize equal.
pub fn normalize_header(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
        .trim()
        .to_string()
}

/// A header label used as a positional landmark in the line stream.
///
/// Labels are compared after [`normalize_header`] on both sides, so config
/// values may be written with or without accents. In TOML a bare string is an
/// exact match; `{ contains = "..." }` and `{ starts_with = "..." }` select the
/// other modes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "AnchorRepr")]
pub enum Anchor {
    Exact(String),
    Contains(String),
    StartsWith(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnchorRepr {
    Label(String),
    Tagged(TaggedAnchor),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedAnchor {
    Exact(String),
    Contains(String),
    StartsWith(String),
}

impl From<AnchorRepr> for Anchor {
    fn from(repr: AnchorRepr) -> Self {
        match repr {
            AnchorRepr::Label(l) | AnchorRepr::Tagged(TaggedAnchor::Exact(l)) => Self::Exact(l),
            AnchorRepr::Tagged(TaggedAnchor::Contains(l)) => Self::Contains(l),
            AnchorRepr::Tagged(TaggedAnchor::StartsWith(l)) => Self::StartsWith(l),
        }
    }
}

impl Anchor {
    pub fn exact(label: &str) -> Self {
        Self::Exact(label.to_string())
    }

    pub fn contains(label: &str) -> Self {
        Self::Contains(label.to_string())
    }

    pub fn starts_with(label: &str) -> Self {
        Self::StartsWith(label.to_string())
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Exact(l) | Self::Contains(l) | Self::StartsWith(l) => l,
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        let line = normalize_header(line);
        match self {
            Self::Exact(l) => line == normalize_header(l),
            Self::Contains(l) => line.contains(&normalize_header(l)),
            Self::StartsWith(l) => line.starts_with(&normalize_header(l)),
        }
    }
}

/// First index whose line satisfies `pred`.
pub fn find_anchor<F>(lines: &[String], pred: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    find_anchor_from(lines, 0, pred)
}

/// First index at or after `from` whose line satisfies `pred`.
pub fn find_anchor_from<F>(lines: &[String], from: usize, pred: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, l)| pred(l))
        .map(|(i, _)| i)
}

/// Locate an [`Anchor`] in the line stream.
pub fn locate(lines: &[String], anchor: &Anchor) -> Option<usize> {
    find_anchor(lines, |l| anchor.matches(l))
}

/// True when the line is made of ASCII digits only.
pub fn is_digits(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_drops_blank_lines() {
        let lines = normalize("  REF \n\n 1001\r\n\t\nFECHA  ");
        assert_eq!(lines, vec!["REF", "1001", "FECHA"]);
    }

    #[test]
    fn normalize_splits_bare_carriage_returns() {
        assert_eq!(normalize("A\rB"), vec!["A", "B"]);
    }

    #[test]
    fn header_strips_diacritics_and_case() {
        assert_eq!(normalize_header("Póliza"), "POLIZA");
        assert_eq!(normalize_header(" %Comisión "), "%COMISION");
        assert_eq!(normalize_header("Operación"), "OPERACION");
    }

    #[test]
    fn anchor_variants() {
        assert!(Anchor::exact("POLIZA").matches("Póliza"));
        assert!(!Anchor::exact("POLIZA").matches("Póliza No."));
        assert!(Anchor::contains("%COMISION").matches("% de %Comisión"));
        assert!(Anchor::starts_with("PAGADO").matches("Pagado/Descontado"));
    }

    #[test]
    fn find_anchor_returns_first_match_or_none() {
        let lines = normalize("A\nB\nA");
        assert_eq!(find_anchor(&lines, |l| l == "A"), Some(0));
        assert_eq!(find_anchor_from(&lines, 1, |l| l == "A"), Some(2));
        assert_eq!(find_anchor(&lines, |l| l == "Z"), None);
    }

    #[test]
    fn digits_only() {
        assert!(is_digits("0042"));
        assert!(!is_digits("42a"));
        assert!(!is_digits(""));
        assert!(!is_digits("4.2"));
    }
}
