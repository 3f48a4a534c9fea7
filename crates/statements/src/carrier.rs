//! Carrier identity and parser dispatch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::carriers::{
    AssistcardParser, BanescoParser, ColumnarParser, IfsParser, MercantilParser, PaligParser, RegionalParser,
    VumiParser,
};
use crate::config::CarrierSettings;
use crate::model::ParseOutcome;

/// Every statement format the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Carrier {
    Optima,
    Mb,
    Aliado,
    Regional,
    Banesco,
    Mercantil,
    Ifs,
    Vumi,
    Palig,
    Assistcard,
}

impl Carrier {
    pub const ALL: [Carrier; 10] = [
        Carrier::Optima,
        Carrier::Mb,
        Carrier::Aliado,
        Carrier::Regional,
        Carrier::Banesco,
        Carrier::Mercantil,
        Carrier::Ifs,
        Carrier::Vumi,
        Carrier::Palig,
        Carrier::Assistcard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Carrier::Optima => "optima",
            Carrier::Mb => "mb",
            Carrier::Aliado => "aliado",
            Carrier::Regional => "regional",
            Carrier::Banesco => "banesco",
            Carrier::Mercantil => "mercantil",
            Carrier::Ifs => "ifs",
            Carrier::Vumi => "vumi",
            Carrier::Palig => "palig",
            Carrier::Assistcard => "assistcard",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Carrier::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Carrier::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown carrier '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// A statement layout turned into rows.
///
/// Parsing never fails: a statement the parser cannot make sense of yields an
/// outcome with no rows and the reason in its stats.
pub trait StatementParser {
    fn carrier(&self) -> Carrier;
    fn parse(&self, text: &str) -> ParseOutcome;
}

/// One configured parser per carrier.
pub struct CarrierRegistry {
    optima: ColumnarParser,
    mb: ColumnarParser,
    aliado: ColumnarParser,
    regional: RegionalParser,
    banesco: BanescoParser,
    mercantil: MercantilParser,
    ifs: IfsParser,
    vumi: VumiParser,
    palig: PaligParser,
    assistcard: AssistcardParser,
}

impl CarrierRegistry {
    pub fn new(settings: &CarrierSettings) -> Self {
        Self {
            optima: ColumnarParser::new(Carrier::Optima, settings.optima.clone()),
            mb: ColumnarParser::new(Carrier::Mb, settings.mb.clone()),
            aliado: ColumnarParser::new(Carrier::Aliado, settings.aliado.clone()),
            regional: RegionalParser::new(settings.regional.clone()),
            banesco: BanescoParser::new(settings.banesco.clone()),
            mercantil: MercantilParser::new(settings.mercantil.clone()),
            ifs: IfsParser::new(settings.ifs.clone()),
            vumi: VumiParser::new(settings.vumi.clone()),
            palig: PaligParser::new(settings.palig.clone()),
            assistcard: AssistcardParser::new(settings.assistcard.clone()),
        }
    }

    pub fn parser(&self, carrier: Carrier) -> &dyn StatementParser {
        match carrier {
            Carrier::Optima => &self.optima,
            Carrier::Mb => &self.mb,
            Carrier::Aliado => &self.aliado,
            Carrier::Regional => &self.regional,
            Carrier::Banesco => &self.banesco,
            Carrier::Mercantil => &self.mercantil,
            Carrier::Ifs => &self.ifs,
            Carrier::Vumi => &self.vumi,
            Carrier::Palig => &self.palig,
            Carrier::Assistcard => &self.assistcard,
        }
    }

    pub fn parse(&self, carrier: Carrier, text: &str) -> ParseOutcome {
        let outcome = self.parser(carrier).parse(text);
        log::info!(
            "[{carrier}] {} line(s), {} candidate(s), {} row(s) emitted, {} dropped",
            outcome.stats.lines,
            outcome.stats.candidates,
            outcome.stats.emitted,
            outcome.stats.total_dropped(),
        );
        outcome
    }
}

impl Default for CarrierRegistry {
    fn default() -> Self {
        Self::new(&CarrierSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_names_round_trip() {
        for c in Carrier::ALL {
            assert_eq!(c.to_string().parse::<Carrier>().unwrap(), c);
        }
        assert_eq!("  MB ".parse::<Carrier>().unwrap(), Carrier::Mb);
    }

    #[test]
    fn unknown_carrier_lists_known_names() {
        let err = "assa".parse::<Carrier>().unwrap_err();
        assert!(err.contains("unknown carrier 'assa'"));
        assert!(err.contains("regional"));
    }

    #[test]
    fn registry_dispatches_to_matching_parser() {
        let registry = CarrierRegistry::default();
        for c in Carrier::ALL {
            assert_eq!(registry.parser(c).carrier(), c);
        }
    }

    #[test]
    fn empty_input_is_not_flagged_for_review() {
        let registry = CarrierRegistry::default();
        let out = registry.parse(Carrier::Mb, "");
        assert!(out.rows.is_empty());
        assert!(!out.needs_review());
    }
}
