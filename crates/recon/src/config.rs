use std::collections::BTreeMap;

use commrecon_statements::{Carrier, CarrierSettings};
use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Import configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Per-carrier parser overrides, keyed by carrier name.
    pub carriers: CarrierSettings,
    /// Carrier name -> insurer id stamped on the import batch.
    pub insurers: BTreeMap<String, String>,
    pub codes: Option<CodeImportConfig>,
}

// ---------------------------------------------------------------------------
// Bulk code import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CodeImportConfig {
    #[serde(default)]
    pub insurer_id: Option<String>,
    /// Receives every code with no registered broker.
    pub fallback_broker_id: String,
    /// Codes attributed to nobody, compared case-insensitively.
    #[serde(default)]
    pub excluded_codes: Vec<String>,
    /// When set, codes must carry this prefix followed by a number with no
    /// leading zero.
    #[serde(default)]
    pub required_prefix: Option<String>,
}

impl CodeImportConfig {
    pub fn new(fallback_broker_id: impl Into<String>) -> Self {
        Self {
            insurer_id: None,
            fallback_broker_id: fallback_broker_id.into(),
            excluded_codes: Vec::new(),
            required_prefix: None,
        }
    }

    pub fn is_excluded(&self, code: &str) -> bool {
        self.excluded_codes
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(code.trim()))
    }

    /// `required_prefix` check. Always passes when no prefix is configured.
    pub fn has_valid_shape(&self, code: &str) -> bool {
        let Some(prefix) = self.required_prefix.as_deref() else {
            return true;
        };
        let upper = code.to_uppercase();
        let Some(suffix) = upper.strip_prefix(&prefix.to_uppercase()) else {
            return false;
        };
        !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) && !suffix.starts_with('0')
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ImportConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let mut problems = self.carriers.validate();

        for key in self.insurers.keys() {
            if let Err(e) = key.parse::<Carrier>() {
                problems.push(format!("insurers: {e}"));
            }
        }

        if let Some(codes) = &self.codes {
            if codes.fallback_broker_id.trim().is_empty() {
                problems.push("codes.fallback_broker_id must not be empty".into());
            }
            if codes.required_prefix.as_deref().is_some_and(|p| p.trim().is_empty()) {
                problems.push("codes.required_prefix must not be empty when set".into());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ReconError::ConfigValidation(problems.join("; ")))
        }
    }

    /// Insurer id configured for a carrier, if any.
    pub fn insurer_for(&self, carrier: Carrier) -> Option<String> {
        self.insurers.get(carrier.as_str()).cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
