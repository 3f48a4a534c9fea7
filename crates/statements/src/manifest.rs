//! Bulk code manifests: a flat `{code, amount}` sheet exported as CSV.

use std::fmt;
use std::io::Read;

use serde::Serialize;

use crate::amount::parse_amount;
use crate::lines::normalize_header;

/// Header rows are searched for within this many leading records.
const HEADER_SCAN_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeAmount {
    pub code: String,
    pub amount_cents: i64,
}

#[derive(Debug)]
pub enum ManifestError {
    Csv(String),
    /// No header row names both a code column and an amount column.
    MissingColumns { code: bool, amount: bool },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Csv(msg) => write!(f, "manifest read error: {msg}"),
            ManifestError::MissingColumns { code, amount } => {
                let mut missing = Vec::new();
                if !code {
                    missing.push("code (LICENCIA/CODIGO)");
                }
                if !amount {
                    missing.push("amount (COMISION PAGADA)");
                }
                write!(
                    f,
                    "manifest header not found in the first {HEADER_SCAN_ROWS} rows; missing column(s): {}",
                    missing.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ManifestError {}

#[derive(Default)]
struct Header {
    row: Option<usize>,
    code: Option<usize>,
    amount: Option<usize>,
}

fn is_code_header(cell: &str) -> bool {
    ["LICENCIA", "CODIGO", "LIC", "COD"].iter().any(|k| cell.contains(k))
}

fn is_paid_commission_header(cell: &str) -> bool {
    cell.contains("COMISION") && ["PAGADA", "PAGAR", "TOTAL"].iter().any(|k| cell.contains(k))
}

fn is_amount_header(cell: &str) -> bool {
    ["COMISION", "HONORARIO", "MONTO"].iter().any(|k| cell.contains(k))
}

fn find_header(records: &[csv::StringRecord]) -> Header {
    let mut header = Header::default();
    for (i, record) in records.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let mut code = None;
        let mut paid = None;
        let mut fallback = None;
        for (col, cell) in record.iter().enumerate() {
            let cell = normalize_header(cell);
            if is_code_header(&cell) && !is_amount_header(&cell) && code.is_none() {
                code = Some(col);
            }
            if is_paid_commission_header(&cell) && paid.is_none() {
                paid = Some(col);
            } else if is_amount_header(&cell) && fallback.is_none() {
                fallback = Some(col);
            }
        }
        let amount = paid.or(fallback);
        if code.is_some() && amount.is_some() {
            return Header {
                row: Some(i),
                code,
                amount,
            };
        }
        header.code = header.code.or(code);
        header.amount = header.amount.or(amount);
    }
    header
}

/// Read a code manifest.
///
/// Rows with neither code nor amount are skipped. Amounts are taken as
/// absolute values; zero amounts are skipped. Codes are uppercased. No code is
/// filtered here: exclusion is the importer's decision.
pub fn read_manifest_csv<R: Read>(reader: R) -> Result<Vec<CodeAmount>, ManifestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ManifestError::Csv(e.to_string()))?;

    let header = find_header(&records);
    let (Some(row), Some(code_col), Some(amount_col)) = (header.row, header.code, header.amount) else {
        return Err(ManifestError::MissingColumns {
            code: header.code.is_some(),
            amount: header.amount.is_some(),
        });
    };

    let mut out = Vec::new();
    for (i, record) in records.iter().enumerate().skip(row + 1) {
        let code = record.get(code_col).unwrap_or("").trim();
        let raw_amount = record.get(amount_col).unwrap_or("").trim();
        if code.is_empty() && raw_amount.is_empty() {
            continue;
        }
        let amount_cents = parse_amount(raw_amount).abs();
        if amount_cents == 0 {
            log::debug!("manifest row {}: code {code:?} has zero amount, skipped", i + 1);
            continue;
        }
        if code.is_empty() {
            log::warn!("manifest row {}: amount {raw_amount} without a code, skipped", i + 1);
            continue;
        }
        out.push(CodeAmount {
            code: code.to_uppercase(),
            amount_cents,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_header_below_title_rows() {
        let csv = "\
ESTADO DE CUENTA,,
Periodo 1-15,,
Licencia,Nombre,Comisión Pagada
pj750-54,JUAN,\"1,250.00\"
PJ750-9,OFICINA,-300.10
,,
PJ750-3,ANA,0.00
";
        let rows = read_manifest_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                CodeAmount {
                    code: "PJ750-54".into(),
                    amount_cents: 125000
                },
                CodeAmount {
                    code: "PJ750-9".into(),
                    amount_cents: 30010
                },
            ]
        );
    }

    #[test]
    fn fallback_amount_column() {
        let csv = "Codigo,Monto\nX1,50\n";
        let rows = read_manifest_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].code, "X1");
        assert_eq!(rows[0].amount_cents, 5000);
    }

    #[test]
    fn paid_commission_beats_generic_amount() {
        let csv = "COD,MONTO BRUTO,COMISION TOTAL\nA1,10.00,2.50\n";
        let rows = read_manifest_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].amount_cents, 250);
    }

    #[test]
    fn missing_header_is_an_error() {
        let err = read_manifest_csv("a,b\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingColumns {
                code: false,
                amount: false
            }
        ));
        assert!(err.to_string().contains("missing column(s)"));
    }
}
