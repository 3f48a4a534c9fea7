//! Locale-aware amount parsing into minor units (cents).

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(\d+\.?\d*|\.\d+)").expect("numeric prefix regex"));

/// Parse a statement amount into cents.
///
/// Thousands separators and a leading `$` are stripped, and a value starting
/// with `.` is read as `0.` (OCR regularly drops the leading zero). Only the
/// leading numeric part is used, so trailing glued text is ignored.
/// Anything unparsable is `0`. Extra fraction digits round half away from zero.
pub fn parse_amount(raw: &str) -> i64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',' && *c != '$').collect();
    let Some(m) = NUMERIC_PREFIX.find(&cleaned) else {
        return 0;
    };
    decimal_to_cents(m.as_str()).unwrap_or(0)
}

/// Exact conversion of a plain decimal string (`-12.345`) to rounded cents.
fn decimal_to_cents(s: &str) -> Option<i64> {
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let mut digits = frac.bytes().map(|b| i64::from(b - b'0'));
    let tenths = digits.next().unwrap_or(0);
    let hundredths = digits.next().unwrap_or(0);
    let round_up = digits.next().is_some_and(|d| d >= 5);

    let cents = whole
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;
    Some(if negative { -cents } else { cents })
}

/// Render cents as a plain two-decimal string (`1234.50`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_dot_recovers_zero() {
        assert_eq!(parse_amount(".5"), 50);
        assert_eq!(parse_amount(".05"), 5);
        assert_eq!(parse_amount("-.25"), -25);
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(parse_amount("1,234.56"), 123456);
        assert_eq!(parse_amount("$12,000"), 1200000);
    }

    #[test]
    fn empty_and_garbage_are_zero() {
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("   "), 0);
        assert_eq!(parse_amount("abc"), 0);
        assert_eq!(parse_amount("."), 0);
        assert_eq!(parse_amount("-"), 0);
    }

    #[test]
    fn trailing_text_is_ignored() {
        assert_eq!(parse_amount("41.87224862"), 4187);
        assert_eq!(parse_amount("12.5USD"), 1250);
        assert_eq!(parse_amount("7."), 700);
    }

    #[test]
    fn extra_decimals_round_half_up() {
        assert_eq!(parse_amount("0.125"), 13);
        assert_eq!(parse_amount("0.124"), 12);
        assert_eq!(parse_amount("-0.125"), -13);
    }

    #[test]
    fn format_round_trips_sign_and_padding() {
        assert_eq!(format_cents(123456), "1234.56");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-250), "-2.50");
    }
}
