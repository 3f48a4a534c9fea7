//! Per-carrier parser configuration.
//!
//! Every field has a default that reproduces the built-in layout, so a TOML
//! file only needs the values it wants to change.

use serde::Deserialize;

use crate::carriers::{
    AssistcardConfig, BanescoConfig, ColumnarConfig, IfsConfig, MercantilConfig, PaligConfig, RegionalConfig,
    VumiConfig,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CarrierSettings {
    pub optima: ColumnarConfig,
    pub mb: ColumnarConfig,
    pub aliado: ColumnarConfig,
    pub regional: RegionalConfig,
    pub banesco: BanescoConfig,
    pub mercantil: MercantilConfig,
    pub ifs: IfsConfig,
    pub vumi: VumiConfig,
    pub palig: PaligConfig,
    pub assistcard: AssistcardConfig,
}

impl CarrierSettings {
    /// Check structural constraints. Returns one message per problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, cfg) in [("optima", &self.optima), ("mb", &self.mb), ("aliado", &self.aliado)] {
            if cfg.key.widths.is_empty() {
                problems.push(format!("carriers.{name}.segment_widths must not be empty"));
            }
            if cfg.min_policy_len == Some(0) {
                problems.push(format!("carriers.{name}.min_policy_len must be at least 1"));
            }
        }
        if self.regional.policy_len.0 == 0 || self.regional.policy_len.0 > self.regional.policy_len.1 {
            problems.push("carriers.regional.policy_len must be a non-empty range starting at 1 or more".into());
        }
        if self.vumi.sections.is_empty() {
            problems.push("carriers.vumi.sections must not be empty".into());
        }
        if self.palig.header_markers.is_empty() {
            problems.push("carriers.palig.header_markers must not be empty".into());
        }
        if self.assistcard.commission_headers.is_empty() {
            problems.push("carriers.assistcard.commission_headers must not be empty".into());
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CarrierSettings::default().validate().is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings: CarrierSettings = toml::from_str(
            r#"
            [mb]
            excluded_kinds = ["CH", "NC"]

            [mb.names]
            deny = ["PAGO DE"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.mb.excluded_kinds, vec!["CH", "NC"]);
        assert_eq!(settings.mb.names.deny, vec!["PAGO DE"]);
        assert_eq!(settings.mb.key.widths, vec![2, 2, 6, 0]);
        assert_eq!(settings.mb.min_policy_len, None);
        assert!(settings.mb.names.reject_months);
    }

    #[test]
    fn bad_widths_and_min_len_are_reported() {
        let settings: CarrierSettings = toml::from_str(
            r#"
            [optima]
            segment_widths = []
            min_policy_len = 0
            "#,
        )
        .unwrap();
        let problems = settings.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("segment_widths"));
    }

    #[test]
    fn empty_section_lists_are_reported() {
        let settings: CarrierSettings = toml::from_str(
            r#"
            [vumi]
            sections = []

            [palig]
            header_markers = []
            min_policy_len = 6
            "#,
        )
        .unwrap();
        assert_eq!(settings.palig.min_policy_len, 6);
        assert_eq!(settings.vumi.block_lines, 10);
        let problems = settings.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("vumi.sections"));
        assert!(problems[1].contains("palig.header_markers"));
    }

    #[test]
    fn anchor_override_accepts_plain_and_tagged_forms() {
        let settings: CarrierSettings = toml::from_str(
            r#"
            [aliado.anchors]
            policy = "NO. POLIZA"
            percent = { starts_with = "%COM" }
            "#,
        )
        .unwrap();
        assert!(settings.aliado.anchors.policy.matches("No. Póliza"));
        assert!(settings.aliado.anchors.percent.matches("%Comisión"));
    }
}
