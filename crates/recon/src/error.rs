use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (unknown carrier key, empty fallback broker, etc.).
    ConfigValidation(String),
    /// The policy/broker directory could not be loaded. Fatal for the run.
    DirectoryUnavailable(String),
    /// Missing required column in a directory CSV.
    MissingColumn { file: String, column: String },
    /// Ledger write or read failure.
    Ledger(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::DirectoryUnavailable(msg) => write!(f, "policy directory unavailable: {msg}"),
            Self::MissingColumn { file, column } => {
                write!(f, "{file}: missing column '{column}'")
            }
            Self::Ledger(msg) => write!(f, "ledger error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<rusqlite::Error> for ReconError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Ledger(e.to_string())
    }
}
