//! Column segmentation: recover one column's value run from between anchors.
//!
//! Flattened reports print each column header once, followed by that column's
//! values for every row. The run between two consecutive header anchors is
//! therefore one column.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lines::is_digits;

static MONEY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d{2}$").expect("money line regex"));

/// Strict sub-sequence `lines[start+1..end]`.
///
/// Empty when either anchor is missing or `end <= start`.
pub fn slice_between(lines: &[String], start: Option<usize>, end: Option<usize>) -> &[String] {
    match (start, end) {
        (Some(s), Some(e)) if e > s && s < lines.len() => &lines[s + 1..e.min(lines.len())],
        _ => &[],
    }
}

/// Contiguous pure-digit lines immediately before `idx`, in stream order.
pub fn digit_run_before(lines: &[String], idx: usize) -> Vec<String> {
    let end = idx.min(lines.len());
    let start = lines[..end]
        .iter()
        .rposition(|l| !is_digits(l))
        .map_or(0, |p| p + 1);
    lines[start..end].to_vec()
}

/// Contiguous pure-digit lines immediately after `idx`, never reaching `stop`.
pub fn digit_run_after(lines: &[String], idx: usize, stop: usize) -> Vec<String> {
    lines
        .iter()
        .take(stop.min(lines.len()))
        .skip(idx + 1)
        .take_while(|l| is_digits(l))
        .cloned()
        .collect()
}

/// True for a plain two-decimal money token such as `134.90`.
pub fn is_money_line(line: &str) -> bool {
    MONEY_LINE.is_match(line)
}

/// Contiguous money lines starting at `from`. Returns the values and the index
/// of the last line consumed, if any.
pub fn money_run_from(lines: &[String], from: usize) -> (Vec<String>, Option<usize>) {
    let run: Vec<String> = lines
        .iter()
        .skip(from)
        .take_while(|l| is_money_line(l))
        .cloned()
        .collect();
    let last = if run.is_empty() { None } else { Some(from + run.len() - 1) };
    (run, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::normalize;

    #[test]
    fn slice_between_valid_anchors() {
        let lines = normalize("A\n1\n2\nB");
        assert_eq!(slice_between(&lines, Some(0), Some(3)), &lines[1..3]);
    }

    #[test]
    fn slice_between_missing_or_inverted() {
        let lines = normalize("A\n1\nB");
        assert!(slice_between(&lines, None, Some(2)).is_empty());
        assert!(slice_between(&lines, Some(0), None).is_empty());
        assert!(slice_between(&lines, Some(2), Some(0)).is_empty());
        assert!(slice_between(&lines, Some(1), Some(1)).is_empty());
    }

    #[test]
    fn adjacent_anchors_give_empty_slice() {
        let lines = normalize("A\nB");
        assert!(slice_between(&lines, Some(0), Some(1)).is_empty());
    }

    #[test]
    fn digit_run_before_stops_at_text() {
        let lines = normalize("TIPO\n02\n14\nPOLIZA");
        assert_eq!(digit_run_before(&lines, 3), vec!["02", "14"]);
        assert!(digit_run_before(&lines, 0).is_empty());
    }

    #[test]
    fn digit_run_before_at_stream_start() {
        let lines = normalize("01\n02\nPOLIZA");
        assert_eq!(digit_run_before(&lines, 2), vec!["01", "02"]);
    }

    #[test]
    fn digit_run_after_respects_stop_and_text() {
        let lines = normalize("POLIZA\n14\n123\nJUAN\n5\nASEGURADO");
        assert_eq!(digit_run_after(&lines, 0, 5), vec!["14", "123"]);
        assert_eq!(digit_run_after(&lines, 0, 2), vec!["14"]);
    }

    #[test]
    fn money_run() {
        let lines = normalize("MONTO C.\n10.00\n5.50\n0\nCERT");
        let (run, last) = money_run_from(&lines, 1);
        assert_eq!(run, vec!["10.00", "5.50"]);
        assert_eq!(last, Some(2));
        let (empty, none) = money_run_from(&lines, 3);
        assert!(empty.is_empty());
        assert_eq!(none, None);
    }
}
