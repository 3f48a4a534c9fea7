//! Policy/broker directory snapshot, loaded once per run.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ReconError;
use crate::model::{Broker, PolicyDirectoryEntry};

#[derive(Debug, Clone, Default)]
pub struct PolicyDirectory {
    policies: HashMap<String, PolicyDirectoryEntry>,
    brokers: HashMap<String, Broker>,
    codes: HashMap<String, String>,
}

impl PolicyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same policy number replace earlier ones.
    pub fn insert_policy(&mut self, entry: PolicyDirectoryEntry) {
        if let Some(prev) = self.policies.insert(entry.policy_number.clone(), entry) {
            log::warn!("directory: duplicate policy {}, keeping the last entry", prev.policy_number);
        }
    }

    pub fn insert_broker(&mut self, broker: Broker) {
        if let Some(code) = &broker.code {
            let code = code.trim().to_uppercase();
            if !code.is_empty() {
                self.codes.insert(code, broker.broker_id.clone());
            }
        }
        self.brokers.insert(broker.broker_id.clone(), broker);
    }

    /// Exact string match on the policy number.
    pub fn lookup(&self, policy_number: &str) -> Option<&PolicyDirectoryEntry> {
        self.policies.get(policy_number)
    }

    pub fn broker(&self, broker_id: &str) -> Option<&Broker> {
        self.brokers.get(broker_id)
    }

    /// Broker registered under a bulk-manifest code (case-insensitive).
    pub fn broker_for_code(&self, code: &str) -> Option<&Broker> {
        self.codes
            .get(&code.trim().to_uppercase())
            .and_then(|id| self.brokers.get(id))
    }

    /// Broker share of gross, 100% when the broker is unknown.
    pub fn percent_for(&self, broker_id: &str) -> f64 {
        self.broker(broker_id).map_or(1.0, |b| b.percent_default)
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    pub fn broker_count(&self) -> usize {
        self.brokers.len()
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

pub trait DirectorySource {
    fn load(&self) -> Result<PolicyDirectory, ReconError>;
}

/// Two CSV exports: `policy_number,broker_id,insurer_id` and
/// `broker_id,name,percent_default[,code]`.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    pub policies_path: PathBuf,
    pub brokers_path: PathBuf,
}

impl CsvDirectory {
    pub fn new(policies_path: impl Into<PathBuf>, brokers_path: impl Into<PathBuf>) -> Self {
        Self {
            policies_path: policies_path.into(),
            brokers_path: brokers_path.into(),
        }
    }
}

impl DirectorySource for CsvDirectory {
    fn load(&self) -> Result<PolicyDirectory, ReconError> {
        let read = |path: &PathBuf| {
            std::fs::read_to_string(path)
                .map_err(|e| ReconError::DirectoryUnavailable(format!("{}: {e}", path.display())))
        };
        let policies = read(&self.policies_path)?;
        let brokers = read(&self.brokers_path)?;
        let directory = load_directory_csv(&policies, &brokers)?;
        log::info!(
            "directory loaded: {} policies, {} brokers",
            directory.policy_count(),
            directory.broker_count()
        );
        Ok(directory)
    }
}

/// Build a directory from the two CSV bodies.
pub fn load_directory_csv(policies_csv: &str, brokers_csv: &str) -> Result<PolicyDirectory, ReconError> {
    let mut directory = PolicyDirectory::new();

    for broker in load_brokers(brokers_csv)? {
        directory.insert_broker(broker);
    }
    for entry in load_policies(policies_csv)? {
        directory.insert_policy(entry);
    }
    Ok(directory)
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes())
}

fn headers(file: &str, reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>, ReconError> {
    Ok(reader
        .headers()
        .map_err(|e| ReconError::DirectoryUnavailable(format!("{file}: {e}")))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect())
}

fn load_policies(csv_data: &str) -> Result<Vec<PolicyDirectoryEntry>, ReconError> {
    const FILE: &str = "policies";
    let mut reader = reader(csv_data);
    let headers = headers(FILE, &mut reader)?;

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            file: FILE.into(),
            column: name.into(),
        })
    };
    let policy_idx = idx("policy_number")?;
    let broker_idx = idx("broker_id")?;
    let insurer_idx = idx("insurer_id")?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::DirectoryUnavailable(format!("{FILE}: {e}")))?;
        let policy_number = record.get(policy_idx).unwrap_or("").to_string();
        if policy_number.is_empty() {
            continue;
        }
        let broker_id = record.get(broker_idx).unwrap_or("").to_string();
        if broker_id.is_empty() {
            log::warn!("{FILE}: policy {policy_number} has no broker_id, left out of the directory");
            continue;
        }
        out.push(PolicyDirectoryEntry {
            policy_number,
            broker_id,
            insurer_id: record.get(insurer_idx).unwrap_or("").to_string(),
        });
    }
    Ok(out)
}

fn load_brokers(csv_data: &str) -> Result<Vec<Broker>, ReconError> {
    const FILE: &str = "brokers";
    let mut reader = reader(csv_data);
    let headers = headers(FILE, &mut reader)?;

    let idx = |name: &str| -> Result<usize, ReconError> {
        headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            file: FILE.into(),
            column: name.into(),
        })
    };
    let id_idx = idx("broker_id")?;
    let name_idx = idx("name")?;
    let percent_idx = idx("percent_default")?;
    // Optional: only brokers that take part in bulk code imports have one.
    let code_idx = headers.iter().position(|h| h == "code");

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::DirectoryUnavailable(format!("{FILE}: {e}")))?;
        let broker_id = record.get(id_idx).unwrap_or("").to_string();
        if broker_id.is_empty() {
            continue;
        }
        let raw_percent = record.get(percent_idx).unwrap_or("");
        let percent_default = parse_percent(raw_percent).ok_or_else(|| {
            ReconError::DirectoryUnavailable(format!(
                "{FILE} row {}: invalid percent_default '{raw_percent}' for broker {broker_id}",
                i + 2
            ))
        })?;
        let code = code_idx
            .and_then(|ci| record.get(ci))
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        out.push(Broker {
            broker_id,
            name: record.get(name_idx).unwrap_or("").to_string(),
            percent_default,
            code,
        });
    }
    Ok(out)
}

/// `0.7`, `70` and `70%` all read as 0.70. Blank means 100%.
fn parse_percent(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(1.0);
    }
    let (digits, explicit) = match raw.strip_suffix('%') {
        Some(d) => (d.trim(), true),
        None => (raw, false),
    };
    let value: f64 = digits.parse().ok()?;
    let fraction = if explicit || value > 1.0 { value / 100.0 } else { value };
    (0.0..=1.0).contains(&fraction).then_some(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICIES: &str = "policy_number,broker_id,insurer_id\n08-123-456,brk-1,ins-1\n,brk-2,ins-1\n";
    const BROKERS: &str = "broker_id,name,percent_default,code\nbrk-1,ANA,0.70,\nbrk-house,HOUSE,1,PJ750-54\n";

    #[test]
    fn loads_policies_and_brokers() {
        let dir = load_directory_csv(POLICIES, BROKERS).unwrap();
        assert_eq!(dir.policy_count(), 1);
        assert_eq!(dir.lookup("08-123-456").unwrap().broker_id, "brk-1");
        assert!(dir.lookup("08-123-45").is_none());
        assert_eq!(dir.percent_for("brk-1"), 0.70);
        assert_eq!(dir.percent_for("nobody"), 1.0);
        assert_eq!(dir.broker_for_code("pj750-54").unwrap().broker_id, "brk-house");
        assert!(dir.broker("brk-1").unwrap().code.is_none());
    }

    #[test]
    fn policies_without_broker_are_left_out() {
        let dir = load_directory_csv("policy_number,broker_id,insurer_id\nP1,,ins-1\nP2,b1,ins-1\n", BROKERS).unwrap();
        assert!(dir.lookup("P1").is_none());
        assert_eq!(dir.policy_count(), 1);
    }

    #[test]
    fn code_column_is_optional() {
        let dir = load_directory_csv(POLICIES, "broker_id,name,percent_default\nbrk-1,ANA,\n").unwrap();
        assert_eq!(dir.percent_for("brk-1"), 1.0);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = load_directory_csv("policy_number,broker_id\nA,B\n", BROKERS).unwrap_err();
        match err {
            ReconError::MissingColumn { file, column } => {
                assert_eq!(file, "policies");
                assert_eq!(column, "insurer_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_percent_aborts_the_load() {
        let err = load_directory_csv(POLICIES, "broker_id,name,percent_default\nbrk-1,ANA,abc\n").unwrap_err();
        assert!(matches!(err, ReconError::DirectoryUnavailable(_)));
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn percent_forms() {
        assert_eq!(parse_percent("0.5"), Some(0.5));
        assert_eq!(parse_percent("50"), Some(0.5));
        assert_eq!(parse_percent("50%"), Some(0.5));
        assert_eq!(parse_percent("1"), Some(1.0));
        assert_eq!(parse_percent("150"), None);
        assert_eq!(parse_percent("-0.2"), None);
    }

    #[test]
    fn unreadable_file_is_unavailable() {
        let source = CsvDirectory::new("/nonexistent/policies.csv", "/nonexistent/brokers.csv");
        assert!(matches!(source.load(), Err(ReconError::DirectoryUnavailable(_))));
    }
}
